//! Parsing of TOPUP's `<out>_movpar.txt` side output.
//!
//! One row per input volume, six whitespace-separated numbers per row in
//! `tx ty tz rx ry rz` order.

use std::path::Path;

use super::rigid::MotionParameters;
use crate::error::{ErrorCode, GearError, Result};

/// Parse movpar text; blank lines are skipped.
pub fn parse_movpar(text: &str) -> Result<Vec<MotionParameters>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_row(index + 1, line))
        .collect()
}

fn parse_row(line_number: usize, line: &str) -> Result<MotionParameters> {
    let values = line
        .split_whitespace()
        .map(|field| {
            field.parse::<f64>().map_err(|e| {
                GearError::invalid_parameter(
                    format!("line {}", line_number),
                    format!("'{}' is not a number: {}", field, e),
                )
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let values: [f64; 6] = values.as_slice().try_into().map_err(|_| {
        GearError::invalid_parameter(
            format!("line {}", line_number),
            format!("expected 6 motion parameters, found {}", values.len()),
        )
    })?;

    let params = MotionParameters::from(values);
    params.validate()?;
    Ok(params)
}

/// Read and parse a movpar file
pub fn read_movpar(path: &Path) -> Result<Vec<MotionParameters>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        GearError::pipeline_with_code(
            ErrorCode::PIPELINE_OUTPUT_MISSING,
            format!("cannot read motion parameters {}", path.display()),
        )
        .with_source(e)
    })?;
    parse_movpar(&text)
}

/// Select the row for a 1-based acquisition-parameter index
pub fn select_row(rows: &[MotionParameters], index: usize) -> Result<MotionParameters> {
    index
        .checked_sub(1)
        .and_then(|i| rows.get(i))
        .copied()
        .ok_or_else(|| {
            GearError::invalid_parameter(
                "index",
                format!(
                    "motion parameter row {} requested but {} rows are available",
                    index,
                    rows.len()
                ),
            )
        })
}
