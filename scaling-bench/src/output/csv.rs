//! CSV output for sweep results.
//!
//! Long format, one line per populated cell in raster order:
//! local_size_index,local_size,sample_index,global_size,elapsed_ms

use std::fs;
use std::io::Write;
use std::path::Path;

use scaling_sweep::ResultMatrix;

/// Write the populated cells of `matrix` to a CSV file.
pub fn write_csv(path: &str, matrix: &ResultMatrix) -> Result<(), String> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
        }
    }

    let mut file =
        fs::File::create(path).map_err(|e| format!("Failed to create {}: {}", path, e))?;

    writeln!(
        file,
        "local_size_index,local_size,sample_index,global_size,elapsed_ms"
    )
    .map_err(|e| format!("Write error: {}", e))?;

    let local_sizes = matrix.local_sizes();
    for r in matrix.results() {
        writeln!(
            file,
            "{},{},{},{},{:.6}",
            r.coord.local_size_index,
            local_sizes[r.coord.local_size_index],
            r.coord.sample_index,
            r.global_size,
            r.elapsed_ms,
        )
        .map_err(|e| format!("Write error: {}", e))?;
    }

    println!("CSV results written to: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support;

    #[test]
    fn test_write_csv_partial_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sweep.csv");
        let path = path.to_str().unwrap();

        write_csv(path, &test_support::matrix(4)).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "local_size_index,local_size,sample_index,global_size,elapsed_ms"
        );
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "0,4,0,4,1.000000");
        assert_eq!(lines[3], "0,4,2,12,3.000000");
        assert_eq!(lines[4], "1,2,0,4,4.000000");
    }
}
