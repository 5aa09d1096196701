//! JSON output for sweep results.
//!
//! Serializes the result matrix with a device header, the schedule that
//! produced it, and the failure (if any). Unset cells are `null`.

use std::fs;
use std::path::Path;

use serde::Serialize;

use scaling_sweep::{DeviceInfo, ProbeKernel, ResultMatrix, SweepFailure, SweepSchedule, TrialCoord};

/// Where and why a sweep halted.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub coord: TrialCoord,
    pub local_size: Option<usize>,
    pub global_size: Option<usize>,
    pub error: String,
}

impl FailureSummary {
    pub fn new(failure: &SweepFailure, schedule: &SweepSchedule) -> Self {
        Self {
            coord: failure.coord,
            local_size: schedule
                .local_sizes()
                .get(failure.coord.local_size_index)
                .copied(),
            global_size: schedule.global_size(failure.coord),
            error: failure.error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    device: &'a DeviceInfo,
    timestamp: String,
    kernel: &'a ProbeKernel,
    schedule: &'a SweepSchedule,
    status: &'static str,
    failure: Option<&'a FailureSummary>,
    matrix: &'a ResultMatrix,
}

/// Write sweep results to a JSON file.
pub fn write_json(
    path: &str,
    device: &DeviceInfo,
    kernel: &ProbeKernel,
    schedule: &SweepSchedule,
    matrix: &ResultMatrix,
    failure: Option<&FailureSummary>,
) -> Result<(), String> {
    let report = JsonReport {
        device,
        timestamp: chrono::Utc::now().to_rfc3339(),
        kernel,
        schedule,
        status: if failure.is_some() { "failed" } else { "complete" },
        failure,
        matrix,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("JSON serialization failed: {}", e))?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
        }
    }

    fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;

    println!("JSON results written to: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support;
    use scaling_sweep::{BackendError, SweepError};

    fn device() -> DeviceInfo {
        DeviceInfo {
            backend: "host".into(),
            device_name: "test cpu".into(),
            max_local_size: Some(1024),
            exact_tiling: false,
        }
    }

    #[test]
    fn test_write_json_failed_sweep() {
        let schedule = SweepSchedule::new(vec![4, 2], 3, 1).unwrap();
        let matrix = test_support::matrix(4);
        let failure = SweepFailure {
            coord: TrialCoord::new(1, 1),
            error: SweepError::Backend(BackendError::Wait("device lost".into())),
            matrix: matrix.clone(),
        };
        let summary = FailureSummary::new(&failure, &schedule);
        assert_eq!(summary.local_size, Some(2));
        assert_eq!(summary.global_size, Some(6));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        let path = path.to_str().unwrap();
        write_json(
            path,
            &device(),
            &ProbeKernel::new(10),
            &schedule,
            &matrix,
            Some(&summary),
        )
        .unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(v["status"], "failed");
        assert_eq!(v["device"]["backend"], "host");
        assert_eq!(v["kernel"]["iterations"], 10);
        assert_eq!(v["failure"]["coord"]["local_size_index"], 1);
        assert_eq!(v["failure"]["coord"]["sample_index"], 1);
        assert!(v["failure"]["error"].as_str().unwrap().contains("device lost"));
        assert_eq!(v["matrix"]["global_sizes"][0][2], 12);
        assert_eq!(v["matrix"]["global_sizes"][1][0], 4);
        assert!(v["matrix"]["global_sizes"][1][1].is_null());
        assert!(v["matrix"]["elapsed_ms"][1][2].is_null());
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn test_write_json_complete_sweep() {
        let schedule = SweepSchedule::new(vec![4, 2], 3, 1).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sweep.json");
        let path = path.to_str().unwrap();
        write_json(
            path,
            &device(),
            &ProbeKernel::new(10),
            &schedule,
            &test_support::matrix(6),
            None,
        )
        .unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(v["status"], "complete");
        assert!(v["failure"].is_null());
        assert_eq!(v["matrix"]["elapsed_ms"][1][2], 6.0);
    }
}
