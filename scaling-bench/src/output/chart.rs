//! ASCII scaling chart: one sparkline per local size, elapsed time against
//! sample index, all rows on a shared scale.
//!
//! ```text
//!   local=   1  |▁▁▂▂▃▃▄▄▅▅▆▆▇▇██| 0.012..4.201 ms
//!   local=  64  |▁▁▁▁▁▁▁▂▂▂▂▂▂▂▂▂| 0.010..0.640 ms
//! ```

use scaling_sweep::ResultMatrix;

const CHART_WIDTH: usize = 48;
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const COLORS: [&str; 6] = [
    "\x1b[36m", // cyan
    "\x1b[32m", // green
    "\x1b[33m", // yellow
    "\x1b[35m", // magenta
    "\x1b[34m", // blue
    "\x1b[31m", // red
];
const RESET: &str = "\x1b[0m";

/// Render `values` as block characters scaled against `ceiling`.
///
/// Longer inputs are bucketed down to `width` columns, keeping each bucket's
/// peak.
pub fn sparkline(values: &[f64], ceiling: f64, width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let buckets = values.len().min(width);
    (0..buckets)
        .map(|b| {
            let start = b * values.len() / buckets;
            let end = ((b + 1) * values.len() / buckets).max(start + 1);
            let peak = values[start..end].iter().copied().fold(0.0f64, f64::max);
            let frac = if ceiling > 0.0 { peak / ceiling } else { 0.0 };
            let level = (frac * (LEVELS.len() - 1) as f64).round() as usize;
            LEVELS[level.min(LEVELS.len() - 1)]
        })
        .collect()
}

/// Print the chart for every row with at least one populated cell.
pub fn print_chart(matrix: &ResultMatrix) {
    let ceiling = matrix
        .elapsed_ms_grid()
        .iter()
        .flatten()
        .flatten()
        .copied()
        .fold(0.0f64, f64::max);
    if ceiling <= 0.0 {
        return;
    }

    println!("\n  SCALING (elapsed ms vs. sample, shared scale, peak {:.3} ms)", ceiling);
    println!("  {}", "-".repeat(CHART_WIDTH + 20));

    for (i, &local) in matrix.local_sizes().iter().enumerate() {
        let times: Vec<f64> = matrix.series(i).into_iter().map(|(_, ms)| ms).collect();
        if times.is_empty() {
            continue;
        }
        let lo = times.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = times.iter().copied().fold(0.0f64, f64::max);
        let color = COLORS[i % COLORS.len()];
        println!(
            "  local={:>4}  |{}{:<width$}{}| {:.3}..{:.3} ms",
            local,
            color,
            sparkline(&times, ceiling, CHART_WIDTH),
            RESET,
            lo,
            hi,
            width = CHART_WIDTH,
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_levels() {
        assert_eq!(sparkline(&[0.0, 0.5, 1.0], 1.0, 10), "▁▅█");
    }

    #[test]
    fn test_sparkline_buckets_keep_peak() {
        let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let line = sparkline(&values, 99.0, 10);
        assert_eq!(line.chars().count(), 10);
        assert_eq!(line.chars().last(), Some('█'));
        let levels: Vec<usize> = line
            .chars()
            .map(|c| LEVELS.iter().position(|&l| l == c).unwrap())
            .collect();
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sparkline_degenerate() {
        assert_eq!(sparkline(&[], 1.0, 10), "");
        assert_eq!(sparkline(&[1.0, 2.0], 0.0, 10), "▁▁");
        assert_eq!(sparkline(&[1.0], 1.0, 0), "");
    }
}
