//! NIfTI header inspection.

use nifti::{NiftiObject, ReaderStreamedOptions};
use std::path::Path;

use crate::error::{ErrorCode, GearError, Result};

/// Seam over image inspection so the pipeline can be exercised without real volumes.
pub trait VolumeProbe: Send + Sync {
    /// NIfTI `dim` array: `dim[0]` is the rank, `dim[1..=dim[0]]` the extents
    fn dims(&self, path: &Path) -> Result<[u16; 8]>;

    /// An image is 4D when it has a fourth axis with more than one volume
    fn is_4d(&self, path: &Path) -> Result<bool> {
        Ok(is_4d_dims(&self.dims(path)?))
    }
}

pub fn is_4d_dims(dim: &[u16; 8]) -> bool {
    dim[0] >= 4 && dim[4] > 1
}

/// Reads the header only; voxel data is never loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NiftiProbe;

impl VolumeProbe for NiftiProbe {
    fn dims(&self, path: &Path) -> Result<[u16; 8]> {
        let object = ReaderStreamedOptions::new().read_file(path).map_err(|e| {
            GearError::input(
                ErrorCode::INPUT_UNREADABLE,
                format!("cannot read NIfTI header: {}", e),
                path.display().to_string(),
            )
        })?;
        Ok(object.header().dim)
    }
}
