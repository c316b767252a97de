//! Dataset layout - describes the axes of the physical array

use crate::error::{DarkFlatError, Result};
use crate::types::AxisDescriptor;
use serde::{Deserialize, Serialize};

/// Layout of a dataset - one labelled axis per array dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Axis descriptors for each dimension
    pub axes: Vec<AxisDescriptor>,
}

impl DatasetLayout {
    /// Create a new dataset layout
    pub fn new(axes: Vec<AxisDescriptor>) -> Result<Self> {
        if axes.is_empty() {
            return Err(DarkFlatError::InvalidDimensions(
                "Layout needs at least one axis".to_string(),
            ));
        }

        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|a| a.label == axis.label) {
                return Err(DarkFlatError::InvalidDimensions(format!(
                    "Duplicate axis label: {}",
                    axis.label
                )));
            }
        }

        Ok(Self { axes })
    }

    /// Number of dimensions
    pub fn dimensionality(&self) -> usize {
        self.axes.len()
    }

    /// Get the size in each dimension
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.num_samples).collect()
    }

    /// Get the axis descriptor of a dimension
    pub fn axis(&self, dim: usize) -> Result<&AxisDescriptor> {
        self.axes.get(dim).ok_or(DarkFlatError::InvalidAxis(dim))
    }

    /// Find the dimension carrying an axis label
    pub fn find_axis_label_dimension(&self, label: &str) -> Result<usize> {
        self.axes
            .iter()
            .position(|a| a.is(label))
            .ok_or_else(|| DarkFlatError::AxisNotFound(label.to_string()))
    }

    /// Check whether an array shape matches this layout
    pub fn matches_shape(&self, shape: &[usize]) -> bool {
        shape.len() == self.dimensionality()
            && shape
                .iter()
                .zip(self.axes.iter())
                .all(|(&n, axis)| n == axis.num_samples)
    }

    /// Get a summary string of the layout
    pub fn summary(&self) -> String {
        let axes_str = self
            .axes
            .iter()
            .map(|a| format!("{}={}", a.label, a.num_samples))
            .collect::<Vec<_>>()
            .join(" x ");

        format!("{}D dataset: {}", self.dimensionality(), axes_str)
    }
}
