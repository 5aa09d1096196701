//! Table output using comfy-table.
//!
//! One row per local size:
//! Local | Samples | Global range | Min (ms) | Max (ms) | Mean (ms) | Items/ms | Status

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::{format_size, RowSummary};

fn ms_cell(v: Option<f64>) -> Cell {
    let text = v
        .map(|ms| format!("{:.3}", ms))
        .unwrap_or_else(|| "-".to_string());
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Build the summary table for a set of rows.
pub fn build_table(rows: &[RowSummary]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Local").add_attribute(Attribute::Bold),
            Cell::new("Samples").add_attribute(Attribute::Bold),
            Cell::new("Global range").add_attribute(Attribute::Bold),
            Cell::new("Min (ms)").add_attribute(Attribute::Bold),
            Cell::new("Max (ms)").add_attribute(Attribute::Bold),
            Cell::new("Mean (ms)").add_attribute(Attribute::Bold),
            Cell::new("Items/ms").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for row in rows {
        let range = match (row.first_global, row.last_global) {
            (Some(a), Some(b)) => format!("{}..{}", format_size(a), format_size(b)),
            _ => "-".to_string(),
        };
        let throughput = row
            .items_per_ms
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        let status = if row.is_complete() {
            Cell::new("complete").fg(Color::Green)
        } else if row.samples > 0 {
            Cell::new("partial").fg(Color::Yellow)
        } else {
            Cell::new("not run").fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(row.local_size).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}/{}", row.samples, row.cols)).set_alignment(CellAlignment::Right),
            Cell::new(range).set_alignment(CellAlignment::Right),
            ms_cell(row.min_ms),
            ms_cell(row.max_ms),
            ms_cell(row.mean_ms),
            Cell::new(throughput).set_alignment(CellAlignment::Right),
            status,
        ]);
    }
    table
}

/// Print the summary table under a title line.
pub fn render_table(title: &str, rows: &[RowSummary]) {
    if rows.is_empty() {
        println!("No results to display.");
        return;
    }
    println!("\n=== {} ===", title);
    println!("{}", build_table(rows));
}
