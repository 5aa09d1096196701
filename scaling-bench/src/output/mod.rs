//! Output modules for rendering sweep results.
//!
//! Supports table (comfy-table), JSON, CSV, ASCII chart, and progress bar output.

pub mod chart;
pub mod csv;
pub mod json;
pub mod progress;
pub mod table;

use scaling_sweep::ResultMatrix;

/// Per-local-size digest of one matrix row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSummary {
    pub local_size: usize,
    /// Populated cells in the row.
    pub samples: usize,
    pub cols: usize,
    pub first_global: Option<usize>,
    pub last_global: Option<usize>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    /// Work items per millisecond at the largest populated global size.
    pub items_per_ms: Option<f64>,
}

impl RowSummary {
    pub fn is_complete(&self) -> bool {
        self.samples == self.cols
    }
}

/// Summarize every row of the matrix, in local-size order.
pub fn summarize(matrix: &ResultMatrix) -> Vec<RowSummary> {
    matrix
        .local_sizes()
        .iter()
        .enumerate()
        .map(|(i, &local_size)| {
            let series = matrix.series(i);
            let times: Vec<f64> = series.iter().map(|&(_, ms)| ms).collect();
            let min_ms = times.iter().copied().reduce(f64::min);
            let max_ms = times.iter().copied().reduce(f64::max);
            let mean_ms = if times.is_empty() {
                None
            } else {
                Some(times.iter().sum::<f64>() / times.len() as f64)
            };
            let last = series.last().copied();
            RowSummary {
                local_size,
                samples: series.len(),
                cols: matrix.cols(),
                first_global: series.first().map(|&(g, _)| g),
                last_global: last.map(|(g, _)| g),
                min_ms,
                max_ms,
                mean_ms,
                items_per_ms: last.and_then(|(g, ms)| (ms > 0.0).then(|| g as f64 / ms)),
            }
        })
        .collect()
}

/// Format a size as a compact string: 1M, 10K, 500.
pub fn format_size(size: usize) -> String {
    if size >= 1_000_000 && size % 1_000_000 == 0 {
        format!("{}M", size / 1_000_000)
    } else if size >= 1_000 && size % 1_000 == 0 {
        format!("{}K", size / 1_000)
    } else {
        format!("{}", size)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use scaling_sweep::{ExecutionResult, ResultMatrix, SweepSchedule};

    /// Matrix for `[4, 2] x 3 samples, step 1`, first `filled` cells populated
    /// with `elapsed = ordinal + 1` ms.
    pub fn matrix(filled: usize) -> ResultMatrix {
        let schedule = SweepSchedule::new(vec![4, 2], 3, 1).unwrap();
        let mut matrix = ResultMatrix::for_schedule(&schedule);
        for trial in schedule.trials().take(filled) {
            matrix
                .record(ExecutionResult {
                    coord: trial.coord,
                    global_size: trial.global_size,
                    elapsed_ms: (trial.ordinal + 1) as f64,
                })
                .unwrap();
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500");
        assert_eq!(format_size(10_000), "10K");
        assert_eq!(format_size(2_000_000), "2M");
        assert_eq!(format_size(1_500), "1500");
    }

    #[test]
    fn test_summarize_complete() {
        let rows = summarize(&test_support::matrix(6));
        assert_eq!(rows.len(), 2);

        // Row 0: local 4, globals 4, 8, 12, elapsed 1, 2, 3.
        assert_eq!(rows[0].local_size, 4);
        assert_eq!(rows[0].first_global, Some(4));
        assert_eq!(rows[0].last_global, Some(12));
        assert_eq!(rows[0].min_ms, Some(1.0));
        assert_eq!(rows[0].max_ms, Some(3.0));
        assert_eq!(rows[0].mean_ms, Some(2.0));
        assert_eq!(rows[0].items_per_ms, Some(4.0));
        assert!(rows[0].is_complete());

        // Row 1: local 2, globals 4, 6, 8, elapsed 4, 5, 6.
        assert_eq!(rows[1].last_global, Some(8));
        assert_eq!(rows[1].mean_ms, Some(5.0));
    }

    #[test]
    fn test_summarize_partial() {
        let rows = summarize(&test_support::matrix(4));
        assert!(rows[0].is_complete());
        assert_eq!(rows[1].samples, 1);
        assert!(!rows[1].is_complete());

        let rows = summarize(&test_support::matrix(3));
        assert_eq!(rows[1].samples, 0);
        assert_eq!(rows[1].mean_ms, None);
        assert_eq!(rows[1].items_per_ms, None);
    }
}
