//! Rigid-body transform construction from six motion parameters.
//!
//! The rotation block is `Rx * Ry * Rz` with the sign pattern used by the
//! TOPUP motion-parameter convention:
//!
//! ```text
//! Rx = | 1    0      0    |   Ry = | cy  0  -sy |   Rz = |  cz  sz  0 |
//!      | 0    cx     sx   |        | 0   1   0  |        | -sz  cz  0 |
//!      | 0   -sx     cx   |        | sy  0   cy |        |  0   0   1 |
//! ```
//!
//! The translation is written into the last column. No orthogonalisation is
//! applied; the block is orthonormal because each factor is.

use nalgebra::{Matrix3, Matrix4};

use crate::error::{GearError, Result};

/// Per-volume rigid displacement: translations in image units, rotations in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParameters {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl MotionParameters {
    pub fn new(tx: f64, ty: f64, tz: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self {
            tx,
            ty,
            tz,
            rx,
            ry,
            rz,
        }
    }

    /// Parameters in `(tx, ty, tz, rx, ry, rz)` order
    pub fn as_array(&self) -> [f64; 6] {
        [self.tx, self.ty, self.tz, self.rx, self.ry, self.rz]
    }

    /// Reject NaN and infinite components, naming the first offender
    pub fn validate(&self) -> Result<()> {
        const NAMES: [&str; 6] = ["tx", "ty", "tz", "rx", "ry", "rz"];
        for (name, value) in NAMES.iter().zip(self.as_array()) {
            if !value.is_finite() {
                return Err(GearError::invalid_parameter(
                    *name,
                    format!("motion parameter {} must be finite, got {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

impl From<[f64; 6]> for MotionParameters {
    fn from(p: [f64; 6]) -> Self {
        Self::new(p[0], p[1], p[2], p[3], p[4], p[5])
    }
}

pub fn rotation_x(rx: f64) -> Matrix3<f64> {
    let (s, c) = rx.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, s, //
        0.0, -s, c,
    )
}

pub fn rotation_y(ry: f64) -> Matrix3<f64> {
    let (s, c) = ry.sin_cos();
    Matrix3::new(
        c, 0.0, -s, //
        0.0, 1.0, 0.0, //
        s, 0.0, c,
    )
}

pub fn rotation_z(rz: f64) -> Matrix3<f64> {
    let (s, c) = rz.sin_cos();
    Matrix3::new(
        c, s, 0.0, //
        -s, c, 0.0, //
        0.0, 0.0, 1.0,
    )
}

/// Compose the homogeneous rigid transform `[Rx*Ry*Rz | t; 0 0 0 1]`.
pub fn rigid_transform(params: &MotionParameters) -> Result<Matrix4<f64>> {
    params.validate()?;

    let rotation = rotation_x(params.rx) * rotation_y(params.ry) * rotation_z(params.rz);

    let mut matrix = rotation.to_homogeneous();
    matrix[(0, 3)] = params.tx;
    matrix[(1, 3)] = params.ty;
    matrix[(2, 3)] = params.tz;
    Ok(matrix)
}
