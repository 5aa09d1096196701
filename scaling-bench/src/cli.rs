use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use scaling_sweep::{DEFAULT_ITERATIONS, DEFAULT_SEED};

/// Probe loop count used on the host backend unless overridden; the device
/// default would take hours on a CPU.
pub const HOST_DEFAULT_ITERATIONS: u32 = 1_000;

/// Sweep work-group size and problem size, timing one kernel dispatch per pair
#[derive(Parser, Debug)]
#[command(name = "scaling-bench", version, about)]
pub struct ScalingArgs {
    /// Work-group sizes to test, in test order (e.g., 1,2,4,8,16,32,64)
    #[arg(long, value_delimiter = ',')]
    pub local_sizes: Option<Vec<String>>,

    /// Global-size samples per local size
    #[arg(long)]
    pub samples: Option<usize>,

    /// Global size grows by STEP * local_size per sample
    #[arg(long)]
    pub step: Option<usize>,

    /// Probe kernel loop count per work item
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Sweep profile: quick, standard (7 local sizes x 200 samples), thorough
    #[arg(long)]
    pub profile: Option<String>,

    /// Load a sweep profile from a JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Compute backend to drive
    #[arg(long, value_enum, default_value_t = BackendKind::Host)]
    pub backend: BackendKind,

    /// Require global sizes to be a multiple of the local size
    #[arg(long)]
    pub exact_tiling: bool,

    /// Largest work-group size the host backend accepts
    #[arg(long)]
    pub max_local_size: Option<usize>,

    /// Fail a trial whose completion takes longer than this (host backend)
    #[arg(long, value_name = "MS")]
    pub wait_timeout_ms: Option<u64>,

    /// Host backend worker threads (0 = one per logical core)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Seed for the random kernel input
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Write JSON results to file
    #[arg(long)]
    pub json_file: Option<String>,

    /// Write CSV results to file
    #[arg(long)]
    pub csv_file: Option<String>,

    /// Skip the ASCII scaling chart
    #[arg(long)]
    pub no_chart: bool,

    /// Print the first N values of the final trial's output buffer
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub show_output: usize,

    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// CPU emulation on a rayon thread pool
    Host,
    /// Apple GPU via Metal (macOS only)
    Metal,
}

impl BackendKind {
    pub fn default_iterations(self) -> u32 {
        match self {
            BackendKind::Host => HOST_DEFAULT_ITERATIONS,
            BackendKind::Metal => DEFAULT_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ScalingArgs::parse_from(["scaling-bench"]);
        assert_eq!(args.backend, BackendKind::Host);
        assert_eq!(args.seed, DEFAULT_SEED);
        assert!(args.local_sizes.is_none());
        assert!(!args.exact_tiling);
        assert!(args.wait_timeout_ms.is_none());
        assert_eq!(args.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_comma_separated_local_sizes() {
        let args = ScalingArgs::parse_from(["scaling-bench", "--local-sizes", "1,2,4"]);
        assert_eq!(
            args.local_sizes,
            Some(vec!["1".to_string(), "2".to_string(), "4".to_string()])
        );
    }

    #[test]
    fn test_backend_and_flags() {
        let args = ScalingArgs::parse_from([
            "scaling-bench",
            "--backend",
            "metal",
            "--exact-tiling",
            "--log-format",
            "json",
            "--show-output",
            "8",
            "--wait-timeout-ms",
            "250",
        ]);
        assert_eq!(args.backend, BackendKind::Metal);
        assert!(args.exact_tiling);
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.show_output, 8);
        assert_eq!(args.wait_timeout_ms, Some(250));
    }

    #[test]
    fn test_backend_default_iterations() {
        assert_eq!(BackendKind::Metal.default_iterations(), DEFAULT_ITERATIONS);
        assert!(BackendKind::Host.default_iterations() < DEFAULT_ITERATIONS);
    }
}
