mod cli;
mod config;
mod logging;
mod output;

use std::time::Duration;

use clap::Parser;
use cli::{BackendKind, ScalingArgs};
use config::SweepProfile;
use output::json::FailureSummary;
use output::progress::SweepProgress;
use scaling_sweep::{ComputeBackend, HostBackend, ProbeKernel, SweepEngine, SweepSchedule};
use tracing::info;

fn main() {
    let args = ScalingArgs::parse();
    logging::init_logging(&args.log_level, args.log_format);

    let profile = match config::resolve(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let schedule = match SweepSchedule::new(
        profile.local_sizes.clone(),
        profile.samples_per_local_size,
        profile.step_multiplier,
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match args.backend {
        BackendKind::Host => match HostBackend::with_threads(args.threads) {
            Ok(backend) => {
                let mut backend = backend.exact_tiling(args.exact_tiling);
                if let Some(max) = args.max_local_size {
                    backend = backend.max_local_size(max);
                }
                if let Some(ms) = args.wait_timeout_ms {
                    backend = backend.wait_timeout(Duration::from_millis(ms));
                }
                run_sweep(&mut backend, &args, &profile, &schedule)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        BackendKind::Metal => run_metal(&args, &profile, &schedule),
    };
    std::process::exit(code);
}

#[cfg(target_os = "macos")]
fn run_metal(args: &ScalingArgs, profile: &SweepProfile, schedule: &SweepSchedule) -> i32 {
    if args.max_local_size.is_some() {
        tracing::warn!("--max-local-size is ignored by the metal backend; the pipeline limit applies");
    }
    if args.wait_timeout_ms.is_some() {
        tracing::warn!("--wait-timeout-ms is ignored by the metal backend");
    }
    match scaling_sweep::MetalBackend::new() {
        Ok(backend) => {
            let mut backend = backend.exact_tiling(args.exact_tiling);
            run_sweep(&mut backend, args, profile, schedule)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn run_metal(_args: &ScalingArgs, _profile: &SweepProfile, _schedule: &SweepSchedule) -> i32 {
    eprintln!("Error: the metal backend is only available on macOS");
    1
}

/// Run the sweep, render results, and write files. Returns the exit code.
fn run_sweep<B: ComputeBackend>(
    backend: &mut B,
    args: &ScalingArgs,
    profile: &SweepProfile,
    schedule: &SweepSchedule,
) -> i32 {
    let device = backend.device_info();
    let kernel = ProbeKernel::new(
        profile
            .iterations
            .unwrap_or_else(|| args.backend.default_iterations()),
    );

    println!("scaling-bench: work-group scaling sweep");
    println!("  Device: {} ({})", device.device_name, device.backend);
    println!("  Profile: {}", profile.name);
    println!("  Local sizes: {:?}", schedule.local_sizes());
    println!(
        "  Samples: {}, Step: {}, Base global size: {}",
        schedule.samples_per_local_size(),
        schedule.step_multiplier(),
        schedule.base_global_size()
    );
    println!("  Kernel: {} x {} iterations", kernel.entry_point, kernel.iterations);
    if let Some(ref path) = args.json_file {
        println!("  JSON output: {}", path);
    }
    if let Some(ref path) = args.csv_file {
        println!("  CSV output: {}", path);
    }
    println!();

    let progress = SweepProgress::new(schedule.len());
    let cb = progress.callback();
    let outcome = SweepEngine::with_seed(backend, kernel.clone(), args.seed).run(schedule, Some(&cb));
    progress.finish();

    let (device, matrix, failure, last_output) = match outcome {
        Ok(report) => (report.device, report.matrix, None, report.last_output),
        Err(failure) => {
            eprintln!("Error: {}", failure);
            let summary = FailureSummary::new(&failure, schedule);
            (device, failure.matrix, Some(summary), Vec::new())
        }
    };

    let rows = output::summarize(&matrix);
    output::table::render_table(&format!("{} on {}", kernel.entry_point, device.device_name), &rows);
    if !args.no_chart {
        output::chart::print_chart(&matrix);
    }
    if failure.is_some() {
        println!(
            "  {} of {} trials completed before the sweep halted",
            matrix.populated(),
            schedule.len()
        );
    }

    if args.show_output > 0 && !last_output.is_empty() {
        let n = args.show_output.min(last_output.len());
        println!("\nFinal trial output (first {} of {}):", n, last_output.len());
        println!("{:?}", &last_output[..n]);
    }

    if let Some(ref path) = args.json_file {
        if let Err(e) = output::json::write_json(
            path,
            &device,
            &kernel,
            schedule,
            &matrix,
            failure.as_ref(),
        ) {
            eprintln!("Error writing JSON: {}", e);
        }
    }
    if let Some(ref path) = args.csv_file {
        if let Err(e) = output::csv::write_csv(path, &matrix) {
            eprintln!("Error writing CSV: {}", e);
        }
    }

    match failure {
        Some(_) => 1,
        None => {
            info!(trials = matrix.populated(), "done");
            0
        }
    }
}
