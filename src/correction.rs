//! Dark/flat reference frames: slice-list reduction, extraction, scaling
//! and overrides

use crate::error::{DarkFlatError, Result};
use crate::layout::DatasetLayout;
use crate::slicing::{apply_slice_list, SliceSpec};
use crate::types::{CalibrationKind, DETECTOR_X, DETECTOR_Y, ROTATION_ANGLE};
use crate::utils::to_f32_array;
use ndarray::{ArrayD, Axis};
use num_traits::{AsPrimitive, ToPrimitive};
use tracing::debug;

/// Derive the slice list used to extract calibration frames
///
/// Starts from the preview slice list, selects every rotation angle, and
/// for more than three dimensions keeps only the rotation-angle and
/// detector axes.
pub fn calibration_slice_list(
    mut slice_list: Vec<SliceSpec>,
    layout: &DatasetLayout,
) -> Result<Vec<SliceSpec>> {
    let rot_dim = layout.find_axis_label_dimension(ROTATION_ANGLE)?;
    let entry = slice_list
        .get_mut(rot_dim)
        .ok_or(DarkFlatError::InvalidAxis(rot_dim))?;
    *entry = SliceSpec::All;

    if slice_list.len() > 3 {
        let det_x = layout.find_axis_label_dimension(DETECTOR_X)?;
        let det_y = layout.find_axis_label_dimension(DETECTOR_Y)?;
        for dim in (0..slice_list.len()).rev() {
            if dim != rot_dim && dim != det_x && dim != det_y {
                slice_list.remove(dim);
            }
        }
    }

    Ok(slice_list)
}

/// Map a reduced calibration slice list back onto every dimension of `layout`
///
/// Entries kept by [`calibration_slice_list`] return to their own
/// dimensions. Every other axis is collapsed to the first position its
/// preview entry selects, so the frames keep only the rotation-angle and
/// detector axes. Lists that already cover every dimension are returned
/// as they are.
pub fn full_calibration_slice_list(
    reduced: &[SliceSpec],
    preview: &[SliceSpec],
    layout: &DatasetLayout,
) -> Result<Vec<SliceSpec>> {
    let ndim = layout.dimensionality();
    if reduced.len() >= ndim {
        return Ok(reduced.to_vec());
    }

    let mut kept = vec![
        layout.find_axis_label_dimension(ROTATION_ANGLE)?,
        layout.find_axis_label_dimension(DETECTOR_X)?,
        layout.find_axis_label_dimension(DETECTOR_Y)?,
    ];
    kept.sort_unstable();
    if kept.len() != reduced.len() {
        return Err(DarkFlatError::InvalidDimensions(format!(
            "Calibration slice list has {} entries for {} calibration axes",
            reduced.len(),
            kept.len()
        )));
    }

    let shape = layout.shape();
    let mut full = Vec::with_capacity(ndim);
    for dim in 0..ndim {
        if let Some(k) = kept.iter().position(|&d| d == dim) {
            full.push(reduced[k].clone());
            continue;
        }
        let entry = preview.get(dim).unwrap_or(&SliceSpec::All);
        let first = entry.positions(shape[dim])?.first().copied().ok_or_else(|| {
            DarkFlatError::Preview(format!("Preview selects nothing on dimension {}", dim))
        })?;
        full.push(SliceSpec::Index(first));
    }
    Ok(full)
}

/// Extract calibration frames at `positions` along `proj_dim`
///
/// The frames are cut with `slice_list`, cast to `f32` and multiplied by
/// `scale`.
pub fn extract_frames<T: Copy + ToPrimitive>(
    array: &ArrayD<T>,
    proj_dim: usize,
    positions: &[usize],
    slice_list: &[SliceSpec],
    scale: f32,
) -> Result<ArrayD<f32>> {
    if proj_dim >= array.ndim() {
        return Err(DarkFlatError::InvalidAxis(proj_dim));
    }
    if let Some(&bad) = positions.iter().find(|&&p| p >= array.len_of(Axis(proj_dim))) {
        return Err(DarkFlatError::OutOfBounds(format!(
            "Frame {} beyond projection axis of length {}",
            bad,
            array.len_of(Axis(proj_dim))
        )));
    }

    let frames = array.select(Axis(proj_dim), positions);
    cut_and_scale(&frames, slice_list, scale)
}

/// Cut a whole reference array with `slice_list`, cast and scale it
pub fn cut_and_scale<T: Copy + ToPrimitive>(
    array: &ArrayD<T>,
    slice_list: &[SliceSpec],
    scale: f32,
) -> Result<ArrayD<f32>> {
    let frames = apply_slice_list(array.view(), slice_list)?;
    Ok(to_f32_array(frames.view()) * scale)
}

/// Average a frame stack along `axis`; 2-D frames are returned as they are
pub fn calc_mean(data: ArrayD<f32>, axis: usize) -> Result<ArrayD<f32>> {
    if data.ndim() <= 2 {
        return Ok(data);
    }
    if axis >= data.ndim() {
        return Err(DarkFlatError::InvalidAxis(axis));
    }
    data.mean_axis(Axis(axis))
        .ok_or_else(|| DarkFlatError::NoFrames("calibration".to_string()))
}

/// Scale factors, overrides and the cached calibration slice list
#[derive(Debug, Clone)]
pub struct DarkFlatCorrector {
    dscale: f32,
    fscale: f32,
    dark_updated: Option<ArrayD<f32>>,
    flat_updated: Option<ArrayD<f32>>,
    dark_flat_slice_list: Option<Vec<SliceSpec>>,
}

impl DarkFlatCorrector {
    pub fn new() -> Self {
        Self {
            dscale: 1.0,
            fscale: 1.0,
            dark_updated: None,
            flat_updated: None,
            dark_flat_slice_list: None,
        }
    }

    pub fn set_dark_scale<S: AsPrimitive<f32>>(&mut self, dscale: S) {
        self.dscale = dscale.as_();
    }

    pub fn set_flat_scale<S: AsPrimitive<f32>>(&mut self, fscale: S) {
        self.fscale = fscale.as_();
    }

    /// Set the scale factor of either kind
    pub fn set_scale<S: AsPrimitive<f32>>(&mut self, kind: CalibrationKind, scale: S) {
        match kind {
            CalibrationKind::Dark => self.set_dark_scale(scale),
            CalibrationKind::Flat => self.set_flat_scale(scale),
        }
    }

    pub fn scale(&self, kind: CalibrationKind) -> f32 {
        match kind {
            CalibrationKind::Dark => self.dscale,
            CalibrationKind::Flat => self.fscale,
        }
    }

    /// Override frame, if one has been supplied
    pub fn override_frame(&self, kind: CalibrationKind) -> Option<&ArrayD<f32>> {
        match kind {
            CalibrationKind::Dark => self.dark_updated.as_ref(),
            CalibrationKind::Flat => self.flat_updated.as_ref(),
        }
    }

    /// Store an override and reset the matching scale to 1.0
    ///
    /// Overrides are kept for the lifetime of the corrector.
    pub fn update(&mut self, kind: CalibrationKind, frame: ArrayD<f32>) {
        debug!(%kind, shape = ?frame.shape(), "calibration override set");
        match kind {
            CalibrationKind::Dark => {
                self.dark_updated = Some(frame);
                self.dscale = 1.0;
            }
            CalibrationKind::Flat => {
                self.flat_updated = Some(frame);
                self.fscale = 1.0;
            }
        }
    }

    /// Cache the calibration slice list
    pub fn set_slice_list(&mut self, slice_list: Vec<SliceSpec>) {
        self.dark_flat_slice_list = Some(slice_list);
    }

    /// Cached calibration slice list
    pub fn slice_list(&self) -> Result<&[SliceSpec]> {
        self.dark_flat_slice_list
            .as_deref()
            .ok_or(DarkFlatError::NotSetUp)
    }

    pub fn is_set_up(&self) -> bool {
        self.dark_flat_slice_list.is_some()
    }

    /// Fresh corrector carrying over only the overrides
    pub fn carry_overrides(&self) -> Self {
        Self {
            dark_updated: self.dark_updated.clone(),
            flat_updated: self.flat_updated.clone(),
            ..Self::new()
        }
    }
}

impl Default for DarkFlatCorrector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AxisDescriptor;
    use ndarray::{Array, IxDyn};

    fn five_dim_layout() -> DatasetLayout {
        DatasetLayout::new(vec![
            AxisDescriptor::new(10, ROTATION_ANGLE, "degrees"),
            AxisDescriptor::new(2, "scan", "index"),
            AxisDescriptor::new(4, DETECTOR_X, "pixel"),
            AxisDescriptor::new(3, DETECTOR_Y, "pixel"),
            AxisDescriptor::new(2, "energy", "keV"),
        ])
        .unwrap()
    }

    #[test]
    fn test_slice_list_keeps_calibration_axes() {
        let preview = vec![
            SliceSpec::range(2, 5),
            SliceSpec::Index(1),
            SliceSpec::range(0, 2),
            SliceSpec::All,
            SliceSpec::Index(0),
        ];
        let reduced = calibration_slice_list(preview, &five_dim_layout()).unwrap();
        assert_eq!(
            reduced,
            vec![SliceSpec::All, SliceSpec::range(0, 2), SliceSpec::All]
        );
    }

    #[test]
    fn test_slice_list_three_dims_untouched_except_rotation() {
        let layout = DatasetLayout::new(vec![
            AxisDescriptor::new(10, ROTATION_ANGLE, "degrees"),
            AxisDescriptor::new(3, DETECTOR_Y, "pixel"),
            AxisDescriptor::new(4, DETECTOR_X, "pixel"),
        ])
        .unwrap();
        let preview = vec![SliceSpec::range(1, 4), SliceSpec::Index(2), SliceSpec::All];
        let reduced = calibration_slice_list(preview, &layout).unwrap();
        assert_eq!(
            reduced,
            vec![SliceSpec::All, SliceSpec::Index(2), SliceSpec::All]
        );
    }

    #[test]
    fn test_slice_list_missing_axis() {
        let layout = DatasetLayout::new(vec![AxisDescriptor::new(10, DETECTOR_X, "pixel")]).unwrap();
        let result = calibration_slice_list(vec![SliceSpec::All], &layout);
        assert!(matches!(result, Err(DarkFlatError::AxisNotFound(_))));
    }

    #[test]
    fn test_full_slice_list_restores_dimensions() {
        let preview = vec![
            SliceSpec::range(2, 5),
            SliceSpec::range(1, 2),
            SliceSpec::range(0, 2),
            SliceSpec::All,
            SliceSpec::Index(1),
        ];
        let layout = five_dim_layout();
        let reduced = calibration_slice_list(preview.clone(), &layout).unwrap();
        let full = full_calibration_slice_list(&reduced, &preview, &layout).unwrap();
        assert_eq!(
            full,
            vec![
                SliceSpec::All,
                SliceSpec::Index(1),
                SliceSpec::range(0, 2),
                SliceSpec::All,
                SliceSpec::Index(1),
            ]
        );

        // no preview: auxiliary axes collapse to their first position
        let all = vec![SliceSpec::All; 5];
        let reduced = calibration_slice_list(all.clone(), &layout).unwrap();
        let full = full_calibration_slice_list(&reduced, &all, &layout).unwrap();
        assert_eq!(full[1], SliceSpec::Index(0));
        assert_eq!(full[4], SliceSpec::Index(0));

        let empty = vec![SliceSpec::All, SliceSpec::range(2, 2)];
        assert!(full_calibration_slice_list(&reduced, &empty, &layout).is_err());
    }

    #[test]
    fn test_full_slice_list_three_dims_unchanged() {
        let reduced = vec![SliceSpec::All, SliceSpec::Index(2), SliceSpec::All];
        let layout = DatasetLayout::new(vec![
            AxisDescriptor::new(10, ROTATION_ANGLE, "degrees"),
            AxisDescriptor::new(3, DETECTOR_Y, "pixel"),
            AxisDescriptor::new(4, DETECTOR_X, "pixel"),
        ])
        .unwrap();
        assert_eq!(
            full_calibration_slice_list(&reduced, &[], &layout).unwrap(),
            reduced
        );
    }

    #[test]
    fn test_extract_and_mean() {
        // frame i is filled with the value i
        let array = Array::from_shape_fn(IxDyn(&[4, 2, 3]), |ix| ix[0] as u16);
        let frames = extract_frames(&array, 0, &[1, 3], &[SliceSpec::All], 2.0).unwrap();
        assert_eq!(frames.shape(), &[2, 2, 3]);
        let mean = calc_mean(frames, 0).unwrap();
        assert_eq!(mean.shape(), &[2, 3]);
        assert!(mean.iter().all(|&v| v == 4.0));

        assert!(extract_frames(&array, 0, &[4], &[], 1.0).is_err());
    }

    #[test]
    fn test_mean_of_empty_stack() {
        let empty = ArrayD::<f32>::zeros(IxDyn(&[0, 2, 2]));
        assert!(matches!(calc_mean(empty, 0), Err(DarkFlatError::NoFrames(_))));
        let frame = ArrayD::<f32>::ones(IxDyn(&[2, 2]));
        assert_eq!(calc_mean(frame.clone(), 0).unwrap(), frame);
    }

    #[test]
    fn test_update_resets_scale() {
        let mut corrector = DarkFlatCorrector::new();
        corrector.set_flat_scale(2);
        corrector.set_scale(CalibrationKind::Dark, 0.5f64);
        assert_eq!(corrector.scale(CalibrationKind::Flat), 2.0);
        assert_eq!(corrector.scale(CalibrationKind::Dark), 0.5);

        corrector.update(CalibrationKind::Flat, ArrayD::ones(IxDyn(&[2, 2])));
        assert_eq!(corrector.scale(CalibrationKind::Flat), 1.0);
        assert_eq!(corrector.scale(CalibrationKind::Dark), 0.5);
        assert!(corrector.override_frame(CalibrationKind::Flat).is_some());
        assert!(corrector.override_frame(CalibrationKind::Dark).is_none());
    }

    #[test]
    fn test_slice_list_cache() {
        let mut corrector = DarkFlatCorrector::new();
        assert!(matches!(corrector.slice_list(), Err(DarkFlatError::NotSetUp)));
        corrector.set_slice_list(vec![SliceSpec::All]);
        assert!(corrector.is_set_up());
        assert_eq!(corrector.slice_list().unwrap(), &[SliceSpec::All]);

        corrector.update(CalibrationKind::Dark, ArrayD::zeros(IxDyn(&[1, 1])));
        let carried = corrector.carry_overrides();
        assert!(!carried.is_set_up());
        assert!(carried.override_frame(CalibrationKind::Dark).is_some());
    }
}
