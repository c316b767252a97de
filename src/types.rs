//! Core data types for dark/flat handling

use crate::error::{DarkFlatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis label of the projection (rotation angle) dimension
pub const ROTATION_ANGLE: &str = "rotation_angle";

/// Axis label of the horizontal detector dimension
pub const DETECTOR_X: &str = "detector_x";

/// Axis label of the vertical detector dimension
pub const DETECTOR_Y: &str = "detector_y";

/// Role of a single frame along the projection axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FrameLabel {
    /// Projection measurement
    Data = 0,
    /// Flat field (beam, no sample)
    Flat = 1,
    /// Dark field (no beam)
    Dark = 2,
    /// Excluded from every calculation
    Ignore = 3,
}

impl FrameLabel {
    /// Get the label from its raw value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FrameLabel::Data),
            1 => Some(FrameLabel::Flat),
            2 => Some(FrameLabel::Dark),
            3 => Some(FrameLabel::Ignore),
            _ => None,
        }
    }

    /// Parse a raw label as found in acquisition files
    pub fn from_raw(value: i64) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_u8)
            .ok_or(DarkFlatError::InvalidLabel(value))
    }

    /// Raw value of this label
    pub fn to_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for FrameLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameLabel::Data => "data",
            FrameLabel::Flat => "flat",
            FrameLabel::Dark => "dark",
            FrameLabel::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// Kind of calibration reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationKind {
    Dark,
    Flat,
}

impl CalibrationKind {
    /// Frame label marking this kind of calibration frame
    pub fn label(&self) -> FrameLabel {
        match self {
            CalibrationKind::Dark => FrameLabel::Dark,
            CalibrationKind::Flat => FrameLabel::Flat,
        }
    }

    /// Metadata key the mean frame is published under
    pub fn meta_key(&self) -> &'static str {
        match self {
            CalibrationKind::Dark => "dark",
            CalibrationKind::Flat => "flat",
        }
    }
}

impl fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.meta_key())
    }
}

/// Axis descriptor with label, unit, and length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDescriptor {
    /// Number of samples along this axis
    pub num_samples: usize,
    /// Label of the axis (e.g., "rotation_angle", "detector_x")
    pub label: String,
    /// Unit of measurement (e.g., "degrees", "pixel")
    pub unit: String,
}

impl AxisDescriptor {
    /// Create a new axis descriptor
    pub fn new(num_samples: usize, label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            num_samples,
            label: label.into(),
            unit: unit.into(),
        }
    }

    /// Check whether this axis carries the given label
    pub fn is(&self, label: &str) -> bool {
        self.label == label
    }
}
