//! Premat text files in the FSL `.mat` layout: four rows of four numbers.

use nalgebra::Matrix4;
use std::path::Path;

use crate::error::{GearError, Result};

/// Render a matrix row-major, whitespace separated, one row per line
pub fn format_premat(matrix: &Matrix4<f64>) -> String {
    let mut out = String::new();
    for row in matrix.row_iter() {
        // adding 0.0 turns -0.0 into 0.0
        let fields: Vec<String> = row.iter().map(|v| format!("{:.10}", v + 0.0)).collect();
        out.push_str(&fields.join("  "));
        out.push('\n');
    }
    out
}

pub fn write_premat(path: &Path, matrix: &Matrix4<f64>) -> Result<()> {
    std::fs::write(path, format_premat(matrix)).map_err(|e| {
        GearError::other(format!("cannot write premat {}", path.display())).with_source(e)
    })?;
    tracing::debug!("Wrote premat {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_identity() {
        let text = format_premat(&Matrix4::identity());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "1.0000000000  0.0000000000  0.0000000000  0.0000000000"
        );
        assert_eq!(
            lines[3],
            "0.0000000000  0.0000000000  0.0000000000  1.0000000000"
        );
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_format_is_row_major() {
        let mut m = Matrix4::identity();
        m[(0, 3)] = 1.5;
        m[(2, 3)] = -3.25;
        let text = format_premat(&m);
        let rows: Vec<Vec<f64>> = text
            .lines()
            .map(|l| l.split_whitespace().map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows[0][3], 1.5);
        assert_eq!(rows[2][3], -3.25);
        assert_eq!(rows[3][0], 0.0);
    }

    #[test]
    fn test_negative_zero_prints_as_zero() {
        let mut m = Matrix4::identity();
        m[(1, 0)] = -0.0;
        assert!(!format_premat(&m).contains('-'));
    }

    #[test]
    fn test_write_premat_round_trips_through_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topup-premat-1.mat");
        write_premat(&path, &Matrix4::identity()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format_premat(&Matrix4::identity()));
    }
}
