//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ACQUISITION_PARAMETERS: &str = "0 -1 0 0.0646\n0 1 0 0.0646\n";

/// Write an uncompressed single-file NIfTI-1 image of unsigned bytes.
///
/// `dims` are the extents, e.g. `[4, 4, 2, 3]` for a 4D series.
pub fn write_nifti(path: &Path, dims: &[u16]) -> Result<()> {
    let mut header = vec![0u8; 348];
    let put_i16 = |h: &mut Vec<u8>, at: usize, v: i16| h[at..at + 2].copy_from_slice(&v.to_le_bytes());
    let put_f32 = |h: &mut Vec<u8>, at: usize, v: f32| h[at..at + 4].copy_from_slice(&v.to_le_bytes());

    header[0..4].copy_from_slice(&348i32.to_le_bytes());
    put_i16(&mut header, 40, dims.len() as i16);
    for i in 1..8 {
        let extent = dims.get(i - 1).copied().unwrap_or(1);
        put_i16(&mut header, 40 + 2 * i, extent as i16);
    }
    put_i16(&mut header, 70, 2); // DT_UINT8
    put_i16(&mut header, 72, 8);
    for i in 0..8 {
        put_f32(&mut header, 76 + 4 * i, 1.0);
    }
    put_f32(&mut header, 108, 352.0);
    put_f32(&mut header, 112, 1.0);
    header[344..348].copy_from_slice(b"n+1\0");

    let voxels: usize = dims.iter().map(|&d| d as usize).product();
    let mut bytes = header;
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend(std::iter::repeat(0u8).take(voxels));
    fs::write(path, bytes)?;
    Ok(())
}

/// Builds a gear root: `config.json`, input files and the default topup config
pub struct GearDirBuilder {
    temp_dir: TempDir,
    config: Value,
    inputs: Map<String, Value>,
    default_config: Option<String>,
}

impl GearDirBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            config: json!({}),
            inputs: Map::new(),
            default_config: None,
        })
    }

    pub fn config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Add a NIfTI input with the given extents
    pub fn image(mut self, name: &str, dims: &[u16]) -> Result<Self> {
        let path = self.input_dir(name)?.join(format!("{name}.nii"));
        write_nifti(&path, dims)?;
        self.inputs
            .insert(name.to_string(), json!({"location": {"path": path}}));
        Ok(self)
    }

    pub fn acquisition_parameters(mut self) -> Result<Self> {
        let path = self.input_dir("acquisition_parameters")?.join("acqp.txt");
        fs::write(&path, ACQUISITION_PARAMETERS)?;
        self.inputs.insert(
            "acquisition_parameters".to_string(),
            json!({"location": {"path": path}}),
        );
        Ok(self)
    }

    pub fn default_topup_config(mut self, contents: &str) -> Self {
        self.default_config = Some(contents.to_string());
        self
    }

    fn input_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.temp_dir.path().join("input").join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn build(self) -> Result<TempDir> {
        let root = self.temp_dir.path();
        let config = json!({"config": self.config, "inputs": self.inputs});
        fs::write(root.join("config.json"), serde_json::to_string_pretty(&config)?)?;
        if let Some(contents) = self.default_config {
            fs::write(root.join("b02b0.cnf"), contents)?;
        }
        Ok(self.temp_dir)
    }
}
