use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::ScalingArgs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },
    #[error("unknown profile '{0}'. Valid: quick, standard, thorough")]
    UnknownProfile(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A named sweep preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepProfile {
    pub name: String,
    pub local_sizes: Vec<usize>,
    pub samples_per_local_size: usize,
    pub step_multiplier: usize,
    /// Probe loop count; the backend's default when absent.
    #[serde(default)]
    pub iterations: Option<u32>,
}

/// Returns the "quick" profile: 4 local sizes x 20 samples.
pub fn quick_profile() -> SweepProfile {
    SweepProfile {
        name: "quick".to_string(),
        local_sizes: vec![1, 4, 16, 64],
        samples_per_local_size: 20,
        step_multiplier: 2,
        iterations: None,
    }
}

/// Returns the "standard" profile: local sizes 1..=64 (powers of two) x 200 samples, step 2.
pub fn standard_profile() -> SweepProfile {
    SweepProfile {
        name: "standard".to_string(),
        local_sizes: vec![1, 2, 4, 8, 16, 32, 64],
        samples_per_local_size: 200,
        step_multiplier: 2,
        iterations: None,
    }
}

/// Returns the "thorough" profile: local sizes 1..=256 (powers of two) x 400 samples, step 2.
pub fn thorough_profile() -> SweepProfile {
    SweepProfile {
        name: "thorough".to_string(),
        local_sizes: vec![1, 2, 4, 8, 16, 32, 64, 128, 256],
        samples_per_local_size: 400,
        step_multiplier: 2,
        iterations: None,
    }
}

/// Lookup a profile by name.
pub fn get_profile(name: &str) -> Option<SweepProfile> {
    match name {
        "quick" => Some(quick_profile()),
        "standard" => Some(standard_profile()),
        "thorough" => Some(thorough_profile()),
        _ => None,
    }
}

/// Read a JSON-serialized [`SweepProfile`].
pub fn load_profile(path: &Path) -> Result<SweepProfile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the effective profile.
///
/// Explicit CLI values override `--config`, which overrides `--profile`;
/// with neither, the standard profile applies.
pub fn resolve(args: &ScalingArgs) -> Result<SweepProfile, ConfigError> {
    let mut profile = if let Some(ref path) = args.config {
        load_profile(path)?
    } else if let Some(ref name) = args.profile {
        get_profile(name).ok_or_else(|| ConfigError::UnknownProfile(name.clone()))?
    } else {
        standard_profile()
    };

    if let Some(ref raw) = args.local_sizes {
        profile.local_sizes = parse_sizes(raw)?;
    }
    if let Some(samples) = args.samples {
        profile.samples_per_local_size = samples;
    }
    if let Some(step) = args.step {
        profile.step_multiplier = step;
    }
    if let Some(iterations) = args.iterations {
        profile.iterations = Some(iterations);
    }
    Ok(profile)
}

/// Parse a human-readable size string to a usize.
///
/// Supports:
/// - "64" or "1_024" -> raw numbers
/// - "2K" or "2k" -> 2_000
/// - "1M" or "1m" -> 1_000_000
/// - "0.5K" -> 500
pub fn parse_size(s: &str) -> Result<usize, ConfigError> {
    let s = s.trim();
    let invalid = |reason: String| ConfigError::InvalidSize {
        input: s.to_string(),
        reason,
    };

    let scaled = |prefix: &str, mult: f64| -> Result<usize, ConfigError> {
        let num: f64 = prefix
            .replace('_', "")
            .parse()
            .map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
        if !num.is_finite() || num < 0.0 {
            return Err(invalid("must be a non-negative number".into()));
        }
        Ok((num * mult) as usize)
    };

    if let Some(prefix) = s.strip_suffix('M').or_else(|| s.strip_suffix('m')) {
        return scaled(prefix, 1_000_000.0);
    }
    if let Some(prefix) = s.strip_suffix('K').or_else(|| s.strip_suffix('k')) {
        return scaled(prefix, 1_000.0);
    }

    s.replace('_', "")
        .parse::<usize>()
        .map_err(|e| invalid(e.to_string()))
}

/// Parse a list of size strings.
pub fn parse_sizes(raw: &[String]) -> Result<Vec<usize>, ConfigError> {
    raw.iter().map(|s| parse_size(s)).collect()
}
