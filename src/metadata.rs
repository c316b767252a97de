//! Metadata store receiving computed calibration summaries

use crate::error::Result;
use chrono::{DateTime, Utc};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value metadata attached to a dataset
///
/// Array entries hold the mean dark and flat frames published by the
/// corrector under the keys `"dark"` and `"flat"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaData {
    /// Array-valued entries
    arrays: HashMap<String, ArrayD<f32>>,

    /// Custom metadata key-value pairs
    custom_metadata: HashMap<String, String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl MetaData {
    /// Create an empty store
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            arrays: HashMap::new(),
            custom_metadata: HashMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Store an array value, replacing any previous one
    pub fn set_meta_data(&mut self, key: impl Into<String>, value: ArrayD<f32>) {
        self.arrays.insert(key.into(), value);
        self.touch();
    }

    /// Get an array value
    pub fn get_meta_data(&self, key: &str) -> Option<&ArrayD<f32>> {
        self.arrays.get(key)
    }

    /// Check if an array value exists
    pub fn contains(&self, key: &str) -> bool {
        self.arrays.contains_key(key)
    }

    /// Add custom metadata
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_metadata.insert(key.into(), value.into());
        self.touch();
    }

    /// Get custom metadata
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.custom_metadata.get(key).map(|s| s.as_str())
    }

    /// Update modification timestamp
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Encode the store with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a store written by [`MetaData::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for MetaData {
    fn default() -> Self {
        Self::new()
    }
}
