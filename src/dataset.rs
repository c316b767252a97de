//! Parent dataset - physical array, axis labels, preview and metadata

use crate::error::{DarkFlatError, Result};
use crate::layout::DatasetLayout;
use crate::metadata::MetaData;
use crate::preview::Preview;
use crate::slicing::{full_slice_list, SliceSpec};
use ndarray::ArrayD;
use parking_lot::RwLock;
use std::sync::Arc;

/// A raw dataset as seen by the dark/flat views
pub struct Dataset<T> {
    /// Axis labels and sizes
    layout: DatasetLayout,

    /// Physical array, data and calibration frames interleaved
    data: Arc<ArrayD<T>>,

    /// Optional preview window
    preview: Option<Preview>,

    /// Metadata sink shared with derived views
    meta_data: Arc<RwLock<MetaData>>,
}

impl<T> Dataset<T> {
    /// Create a dataset over a physical array
    pub fn new(layout: DatasetLayout, data: ArrayD<T>) -> Result<Self> {
        if !layout.matches_shape(data.shape()) {
            return Err(DarkFlatError::InvalidDimensions(format!(
                "Array shape {:?} does not match layout {:?}",
                data.shape(),
                layout.shape()
            )));
        }

        Ok(Self {
            layout,
            data: Arc::new(data),
            preview: None,
            meta_data: Arc::new(RwLock::new(MetaData::new())),
        })
    }

    /// Set the preview window
    pub fn with_preview(mut self, preview: Preview) -> Result<Self> {
        if preview.len() != self.layout.dimensionality() {
            return Err(DarkFlatError::InvalidDimensions(format!(
                "Preview has {} entries for a {}D dataset",
                preview.len(),
                self.layout.dimensionality()
            )));
        }
        self.preview = Some(preview);
        Ok(self)
    }

    /// Share an existing metadata store
    pub fn with_meta_data(mut self, meta_data: Arc<RwLock<MetaData>>) -> Self {
        self.meta_data = meta_data;
        self
    }

    /// Get the dataset layout
    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Physical array
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Physical shape
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn find_axis_label_dimension(&self, label: &str) -> Result<usize> {
        self.layout.find_axis_label_dimension(label)
    }

    /// Get the preview window, failing if none is configured
    pub fn get_preview(&self) -> Result<&Preview> {
        self.preview
            .as_ref()
            .ok_or_else(|| DarkFlatError::Preview("No preview configured".to_string()))
    }

    /// Preview slice list, selecting everything when no preview is set
    pub fn preview_slice_list(&self) -> Vec<SliceSpec> {
        match &self.preview {
            Some(preview) => preview.get_preview_slice_list(),
            None => full_slice_list(self.layout.dimensionality()),
        }
    }

    /// Snapshot of the metadata store
    pub fn meta_data(&self) -> MetaData {
        self.meta_data.read().clone()
    }

    /// Handle to the shared metadata store
    pub fn meta_data_handle(&self) -> Arc<RwLock<MetaData>> {
        Arc::clone(&self.meta_data)
    }

    /// Publish an array to the metadata store
    pub fn set_meta_data(&self, key: impl Into<String>, value: ArrayD<f32>) {
        self.meta_data.write().set_meta_data(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AxisDescriptor, DETECTOR_X, DETECTOR_Y, ROTATION_ANGLE};
    use ndarray::{Array, IxDyn};

    fn create_test_dataset() -> Dataset<u16> {
        let layout = DatasetLayout::new(vec![
            AxisDescriptor::new(6, ROTATION_ANGLE, "degrees"),
            AxisDescriptor::new(2, DETECTOR_Y, "pixel"),
            AxisDescriptor::new(3, DETECTOR_X, "pixel"),
        ])
        .unwrap();
        Dataset::new(layout, Array::zeros(IxDyn(&[6, 2, 3]))).unwrap()
    }

    #[test]
    fn test_shape_must_match_layout() {
        let layout = DatasetLayout::new(vec![AxisDescriptor::new(4, ROTATION_ANGLE, "degrees")]).unwrap();
        let result = Dataset::<u16>::new(layout, Array::zeros(IxDyn(&[5])));
        assert!(matches!(result, Err(DarkFlatError::InvalidDimensions(_))));
    }

    #[test]
    fn test_preview_lookup() {
        let dataset = create_test_dataset();
        assert!(dataset.get_preview().is_err());
        assert_eq!(dataset.preview_slice_list(), full_slice_list(3));

        let preview = Preview::new(vec![SliceSpec::range(0, 2), SliceSpec::All, SliceSpec::All]);
        let dataset = dataset.with_preview(preview.clone()).unwrap();
        assert_eq!(dataset.get_preview().unwrap(), &preview);
        assert_eq!(dataset.preview_slice_list()[0], SliceSpec::range(0, 2));
    }

    #[test]
    fn test_preview_length_checked() {
        let dataset = create_test_dataset();
        assert!(dataset.with_preview(Preview::new(vec![SliceSpec::All])).is_err());
    }

    #[test]
    fn test_metadata_is_shared() {
        let dataset = create_test_dataset();
        let handle = dataset.meta_data_handle();
        dataset.set_meta_data("dark", Array::zeros(IxDyn(&[2, 3])));
        assert!(handle.read().contains("dark"));
        assert!(dataset.meta_data().contains("dark"));
    }
}
