//! Construction options for dark/flat views

use crate::error::{DarkFlatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options applied when a view is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// 1-based flat batches to relabel as ignored (embedded labels only)
    pub ignore_flat_batches: Vec<usize>,

    /// Initial dark scale factor
    pub dark_scale: f32,

    /// Initial flat scale factor
    pub flat_scale: f32,

    /// Dataset is a 3D array exposed as 4D; the extra trailing dimension
    /// is dropped from the calibration slice list (external references only)
    pub axis_expansion: bool,
}

impl ViewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flat batches to ignore
    pub fn with_ignore_flat_batches(mut self, batches: impl Into<Vec<usize>>) -> Self {
        self.ignore_flat_batches = batches.into();
        self
    }

    /// Set the initial scale factors
    pub fn with_scales(mut self, dark_scale: f32, flat_scale: f32) -> Self {
        self.dark_scale = dark_scale;
        self.flat_scale = flat_scale;
        self
    }

    /// Enable the 3D to 4D axis expansion
    pub fn with_axis_expansion(mut self, axis_expansion: bool) -> Self {
        self.axis_expansion = axis_expansion;
        self
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| {
            DarkFlatError::Configuration(format!("{}: {}", path.display(), e))
        })
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            ignore_flat_batches: Vec::new(),
            dark_scale: 1.0,
            flat_scale: 1.0,
            axis_expansion: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert!(config.ignore_flat_batches.is_empty());
        assert_eq!(config.dark_scale, 1.0);
        assert_eq!(config.flat_scale, 1.0);
        assert!(!config.axis_expansion);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ViewConfig::from_json(r#"{"ignore_flat_batches": [1, 3], "flat_scale": 0.5}"#).unwrap();
        assert_eq!(config.ignore_flat_batches, vec![1, 3]);
        assert_eq!(config.flat_scale, 0.5);
        assert_eq!(config.dark_scale, 1.0);
        assert!(ViewConfig::from_json("{").is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"axis_expansion": true}}"#).unwrap();
        let config = ViewConfig::from_path(file.path()).unwrap();
        assert_eq!(config, ViewConfig::new().with_axis_expansion(true));

        writeln!(file, "not json").unwrap();
        assert!(matches!(
            ViewConfig::from_path(file.path()),
            Err(DarkFlatError::Configuration(_))
        ));
        assert!(matches!(
            ViewConfig::from_path("/nonexistent/darkflat.json"),
            Err(DarkFlatError::Io(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = ViewConfig::new()
            .with_ignore_flat_batches([2])
            .with_scales(0.5, 2.0);
        assert_eq!(config.ignore_flat_batches, vec![2]);
        assert_eq!(config.dark_scale, 0.5);
        assert_eq!(config.flat_scale, 2.0);
    }
}
