//! Dataset views - logical, data-only access with dark/flat references
//!
//! A [`DarkFlatView`] hides calibration frames from callers. Two variants
//! exist:
//!
//! - **embedded**: data, dark and flat frames share the physical array and
//!   are told apart by an [`ImageKey`];
//! - **external**: darks and flats live in separate reference arrays, each
//!   optionally carrying its own [`ImageKey`].
//!
//! Calibration requests resolve frame positions with an explicit
//! [`resolve`] call against whichever label array applies, so `dark()` and
//! `flat()` only need `&self`.

use crate::config::ViewConfig;
use crate::correction::{
    calc_mean, calibration_slice_list, cut_and_scale, extract_frames,
    full_calibration_slice_list, DarkFlatCorrector,
};
use crate::dataset::Dataset;
use crate::error::{DarkFlatError, Result};
use crate::image_key::{resolve, ImageKey};
use crate::slicing::{apply_slice_list, reduced_axis, SliceSpec};
use crate::types::{CalibrationKind, FrameLabel};
use crate::utils::format_shape;
use ndarray::ArrayD;
use num_traits::{AsPrimitive, ToPrimitive};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// A dark or flat array held outside the main dataset
pub struct ReferenceArray<T> {
    data: Arc<ArrayD<T>>,
    image_key: Option<ImageKey>,
}

impl<T> ReferenceArray<T> {
    pub fn new(data: Arc<ArrayD<T>>, image_key: Option<ImageKey>) -> Self {
        Self { data, image_key }
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn image_key(&self) -> Option<&ImageKey> {
        self.image_key.as_ref()
    }
}

impl<T> Clone for ReferenceArray<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            image_key: self.image_key.clone(),
        }
    }
}

/// Where dark and flat frames come from
enum CalibrationSource<T> {
    Embedded,
    External {
        dark: Option<ReferenceArray<T>>,
        flat: Option<ReferenceArray<T>>,
        axis_expansion: bool,
    },
}

impl<T> Clone for CalibrationSource<T> {
    fn clone(&self) -> Self {
        match self {
            CalibrationSource::Embedded => CalibrationSource::Embedded,
            CalibrationSource::External {
                dark,
                flat,
                axis_expansion,
            } => CalibrationSource::External {
                dark: dark.clone(),
                flat: flat.clone(),
                axis_expansion: *axis_expansion,
            },
        }
    }
}

/// Logical view of a dataset with dark/flat correction support
pub struct DarkFlatView<T> {
    dataset: Arc<Dataset<T>>,
    image_key: Option<ImageKey>,
    proj_dim: usize,
    shape: Vec<usize>,
    source: CalibrationSource<T>,
    corrector: DarkFlatCorrector,
}

impl<T: Copy + ToPrimitive> DarkFlatView<T> {
    /// View over an array whose frames are labelled by `image_key`
    ///
    /// Flat batches listed in `config` are marked as ignored before the
    /// logical shape is computed.
    pub fn embedded(
        dataset: Arc<Dataset<T>>,
        mut image_key: ImageKey,
        proj_dim: usize,
        config: &ViewConfig,
    ) -> Result<Self> {
        check_image_key(&dataset, &image_key, proj_dim)?;
        if !config.ignore_flat_batches.is_empty() {
            image_key.ignore_flat_batches(&config.ignore_flat_batches)?;
        }

        Self::build(
            dataset,
            Some(image_key),
            proj_dim,
            CalibrationSource::Embedded,
            config,
        )
    }

    /// View whose darks and flats are supplied separately
    ///
    /// `image_key` labels the main array if it still interleaves data and
    /// calibration frames.
    pub fn external(
        dataset: Arc<Dataset<T>>,
        image_key: Option<ImageKey>,
        proj_dim: usize,
        config: &ViewConfig,
    ) -> Result<Self> {
        if let Some(key) = &image_key {
            check_image_key(&dataset, key, proj_dim)?;
        }

        let source = CalibrationSource::External {
            dark: None,
            flat: None,
            axis_expansion: config.axis_expansion,
        };
        Self::build(dataset, image_key, proj_dim, source, config)
    }

    fn build(
        dataset: Arc<Dataset<T>>,
        image_key: Option<ImageKey>,
        proj_dim: usize,
        source: CalibrationSource<T>,
        config: &ViewConfig,
    ) -> Result<Self> {
        if proj_dim >= dataset.shape().len() {
            return Err(DarkFlatError::InvalidAxis(proj_dim));
        }

        let mut corrector = DarkFlatCorrector::new();
        corrector.set_dark_scale(config.dark_scale);
        corrector.set_flat_scale(config.flat_scale);

        let mut view = Self {
            dataset,
            image_key,
            proj_dim,
            shape: Vec::new(),
            source,
            corrector,
        };
        view.shape = view.logical_shape()?;
        debug!(shape = %format_shape(&view.shape), proj_dim, "dark/flat view created");
        Ok(view)
    }

    fn logical_shape(&self) -> Result<Vec<usize>> {
        let mut shape = self.dataset.shape().to_vec();
        if self.image_key.is_some() {
            shape[self.proj_dim] = self.get_index(FrameLabel::Data, false)?.len();
        }
        Ok(shape)
    }

    /// Logical shape: the physical shape with only data frames along the
    /// projection axis
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn n_dims(&self) -> usize {
        self.shape.len()
    }

    pub fn proj_dim(&self) -> usize {
        self.proj_dim
    }

    pub fn dataset(&self) -> &Arc<Dataset<T>> {
        &self.dataset
    }

    pub fn image_key(&self) -> Option<&ImageKey> {
        self.image_key.as_ref()
    }

    /// Darks and flats share the physical array with the data
    pub fn has_embedded_calibration(&self) -> bool {
        matches!(self.source, CalibrationSource::Embedded)
    }

    /// The dataset is exposed through a 3D to 4D axis expansion
    pub fn has_axis_expansion(&self) -> bool {
        matches!(
            self.source,
            CalibrationSource::External {
                axis_expansion: true,
                ..
            }
        )
    }

    /// Physical positions of `label` in the main array
    ///
    /// With `full` the preview window is ignored.
    pub fn get_index(&self, label: FrameLabel, full: bool) -> Result<Vec<usize>> {
        let key = self
            .image_key
            .as_ref()
            .ok_or_else(|| DarkFlatError::MissingReference("image key".to_string()))?;
        let window = if full { None } else { self.preview_window() };
        Ok(resolve(key, label, window.as_ref()))
    }

    fn preview_window(&self) -> Option<SliceSpec> {
        match self
            .dataset
            .get_preview()
            .and_then(|p| p.slice_for(self.proj_dim))
        {
            Ok(spec) => Some(spec.clone()),
            Err(e) => {
                trace!(error = %e, "no preview window on projection axis");
                None
            }
        }
    }

    /// Read from the dataset using logical indices
    ///
    /// The projection-axis entry selects among data frames only; missing
    /// trailing entries select whole axes.
    pub fn get(&self, index: &[SliceSpec]) -> Result<ArrayD<T>> {
        let Some(key) = &self.image_key else {
            return apply_slice_list(self.dataset.data().view(), index);
        };

        let mut specs = index.to_vec();
        if specs.len() <= self.proj_dim {
            specs.resize(self.proj_dim + 1, SliceSpec::All);
        }

        let data_positions = key.positions(FrameLabel::Data);
        let physical = match &specs[self.proj_dim] {
            SliceSpec::Index(i) => SliceSpec::Index(*data_positions.get(*i).ok_or_else(|| {
                DarkFlatError::OutOfBounds(format!(
                    "Logical frame {} of {}",
                    i,
                    data_positions.len()
                ))
            })?),
            spec => SliceSpec::Indices(spec.select(&data_positions)?),
        };
        specs[self.proj_dim] = physical;

        apply_slice_list(self.dataset.data().view(), &specs)
    }

    /// Register a separate dark array, optionally labelled
    pub fn set_dark_path(&mut self, data: Arc<ArrayD<T>>, image_key: Option<ImageKey>) -> Result<()> {
        self.set_reference(CalibrationKind::Dark, ReferenceArray::new(data, image_key))
    }

    /// Register a separate flat array, optionally labelled
    pub fn set_flat_path(&mut self, data: Arc<ArrayD<T>>, image_key: Option<ImageKey>) -> Result<()> {
        self.set_reference(CalibrationKind::Flat, ReferenceArray::new(data, image_key))
    }

    fn set_reference(&mut self, kind: CalibrationKind, reference: ReferenceArray<T>) -> Result<()> {
        if let Some(key) = &reference.image_key {
            let len = reference.data.shape().get(self.proj_dim).copied();
            if len != Some(key.len()) {
                return Err(DarkFlatError::InvalidDimensions(format!(
                    "{} image key has {} labels for shape {:?}",
                    kind,
                    key.len(),
                    reference.data.shape()
                )));
            }
        }

        match &mut self.source {
            CalibrationSource::Embedded => Err(DarkFlatError::Configuration(format!(
                "{} reference not supported on an embedded view",
                kind
            ))),
            CalibrationSource::External { dark, flat, .. } => {
                match kind {
                    CalibrationKind::Dark => *dark = Some(reference),
                    CalibrationKind::Flat => *flat = Some(reference),
                }
                Ok(())
            }
        }
    }

    fn reference(&self, kind: CalibrationKind) -> Option<&ReferenceArray<T>> {
        match &self.source {
            CalibrationSource::Embedded => None,
            CalibrationSource::External { dark, flat, .. } => match kind {
                CalibrationKind::Dark => dark.as_ref(),
                CalibrationKind::Flat => flat.as_ref(),
            },
        }
    }

    /// Compute and cache the calibration slice list, then publish the mean
    /// dark and flat frames to the dataset metadata
    ///
    /// With axis expansion the trailing preview entry belongs to the
    /// synthetic axis and is dropped before reduction. The slice list is
    /// not recomputed if the preview changes afterwards.
    pub fn set_dark_and_flat(&mut self) -> Result<()> {
        let mut preview = self.dataset.preview_slice_list();
        if self.has_axis_expansion() {
            preview.pop();
        }
        let slice_list = calibration_slice_list(preview, self.dataset.layout())?;
        self.corrector.set_slice_list(slice_list);

        for kind in [CalibrationKind::Dark, CalibrationKind::Flat] {
            let available = match &self.source {
                CalibrationSource::Embedded => !self.get_index(kind.label(), false)?.is_empty(),
                CalibrationSource::External { .. } => {
                    self.reference(kind).is_some() || self.corrector.override_frame(kind).is_some()
                }
            };
            if available {
                let mean = self.published_mean(kind)?;
                self.dataset.set_meta_data(kind.meta_key(), mean);
            } else {
                debug!(%kind, "no calibration frames to publish");
            }
        }

        let slice_list = self.corrector.slice_list()?;
        info!(?slice_list, "dark and flat set up");
        Ok(())
    }

    /// Cached calibration slice list
    pub fn dark_flat_slice_list(&self) -> Result<&[SliceSpec]> {
        self.corrector.slice_list()
    }

    /// Mean dark frame, or the override if one was supplied
    pub fn dark(&self) -> Result<ArrayD<f32>> {
        self.calibration(CalibrationKind::Dark)
    }

    /// Mean flat frame, or the override if one was supplied
    pub fn flat(&self) -> Result<ArrayD<f32>> {
        self.calibration(CalibrationKind::Flat)
    }

    /// Scaled dark frames before averaging
    pub fn dark_frames(&self) -> Result<ArrayD<f32>> {
        self.calibration_frames(CalibrationKind::Dark)
    }

    /// Scaled flat frames before averaging
    pub fn flat_frames(&self) -> Result<ArrayD<f32>> {
        self.calibration_frames(CalibrationKind::Flat)
    }

    fn calibration(&self, kind: CalibrationKind) -> Result<ArrayD<f32>> {
        if let Some(frame) = self.corrector.override_frame(kind) {
            return Ok(frame.clone());
        }
        let (frames, axis) = self.frames_and_mean_axis(kind)?;
        calc_mean(frames, axis)
    }

    fn published_mean(&self, kind: CalibrationKind) -> Result<ArrayD<f32>> {
        match self.corrector.override_frame(kind) {
            Some(frame) => calc_mean(frame.clone(), self.proj_dim),
            None => self.calibration(kind),
        }
    }

    fn calibration_frames(&self, kind: CalibrationKind) -> Result<ArrayD<f32>> {
        Ok(self.frames_and_mean_axis(kind)?.0)
    }

    /// Scaled calibration frames and the axis their frames are stacked on
    fn frames_and_mean_axis(&self, kind: CalibrationKind) -> Result<(ArrayD<f32>, usize)> {
        let scale = self.corrector.scale(kind);

        match &self.source {
            CalibrationSource::Embedded => {
                let data = self.dataset.data();
                let slice_list = self.frame_slice_list(data.ndim())?;
                let positions = self.get_index(kind.label(), false)?;
                let frames = extract_frames(data, self.proj_dim, &positions, &slice_list, scale)?;
                Ok((frames, self.mean_axis(&slice_list)))
            }
            CalibrationSource::External { .. } => {
                let reference = self
                    .reference(kind)
                    .ok_or_else(|| DarkFlatError::MissingReference(kind.to_string()))?;
                let slice_list = self.frame_slice_list(reference.data.ndim())?;
                let frames = match &reference.image_key {
                    Some(key) => {
                        let window = self.preview_window();
                        let positions = resolve(key, kind.label(), window.as_ref());
                        extract_frames(&reference.data, self.proj_dim, &positions, &slice_list, scale)?
                    }
                    None => cut_and_scale(&reference.data, &slice_list, scale)?,
                };
                Ok((frames, self.mean_axis(&slice_list)))
            }
        }
    }

    /// Calibration slice list for an array of `ndim` dimensions
    ///
    /// Arrays with the full rank of the dataset get the reduced list mapped
    /// back onto every dimension.
    fn frame_slice_list(&self, ndim: usize) -> Result<Vec<SliceSpec>> {
        let reduced = self.corrector.slice_list()?;
        let layout = self.dataset.layout();
        if ndim > reduced.len() && ndim == layout.dimensionality() {
            full_calibration_slice_list(reduced, &self.dataset.preview_slice_list(), layout)
        } else {
            Ok(reduced.to_vec())
        }
    }

    fn mean_axis(&self, slice_list: &[SliceSpec]) -> usize {
        reduced_axis(slice_list, self.proj_dim).unwrap_or(self.proj_dim)
    }

    pub fn set_dark_scale<S: AsPrimitive<f32>>(&mut self, dscale: S) {
        self.corrector.set_dark_scale(dscale);
    }

    pub fn set_flat_scale<S: AsPrimitive<f32>>(&mut self, fscale: S) {
        self.corrector.set_flat_scale(fscale);
    }

    pub fn set_scale<S: AsPrimitive<f32>>(&mut self, kind: CalibrationKind, scale: S) {
        self.corrector.set_scale(kind, scale);
    }

    pub fn scale(&self, kind: CalibrationKind) -> f32 {
        self.corrector.scale(kind)
    }

    /// Replace the dark reference; resets the dark scale to 1.0
    pub fn update_dark(&mut self, frame: ArrayD<f32>) -> Result<()> {
        self.update(CalibrationKind::Dark, frame)
    }

    /// Replace the flat reference; resets the flat scale to 1.0
    pub fn update_flat(&mut self, frame: ArrayD<f32>) -> Result<()> {
        self.update(CalibrationKind::Flat, frame)
    }

    fn update(&mut self, kind: CalibrationKind, frame: ArrayD<f32>) -> Result<()> {
        let mean = calc_mean(frame.clone(), self.proj_dim)?;
        self.corrector.update(kind, frame);
        self.dataset.set_meta_data(kind.meta_key(), mean);
        Ok(())
    }

    /// The same view over another dataset
    ///
    /// Labels, references and overrides are carried over; scales start at
    /// 1.0 and dark/flat are set up again.
    pub fn copy_for(&self, dataset: Arc<Dataset<T>>) -> Result<Self> {
        if let Some(key) = &self.image_key {
            check_image_key(&dataset, key, self.proj_dim)?;
        }

        let mut view = Self {
            dataset,
            image_key: self.image_key.clone(),
            proj_dim: self.proj_dim,
            shape: Vec::new(),
            source: self.source.clone(),
            corrector: self.corrector.carry_overrides(),
        };
        view.shape = view.logical_shape()?;
        view.set_dark_and_flat()?;
        Ok(view)
    }
}

fn check_image_key<T>(dataset: &Dataset<T>, key: &ImageKey, proj_dim: usize) -> Result<()> {
    let len = dataset
        .shape()
        .get(proj_dim)
        .copied()
        .ok_or(DarkFlatError::InvalidAxis(proj_dim))?;
    if len != key.len() {
        return Err(DarkFlatError::InvalidDimensions(format!(
            "Image key has {} labels, projection axis has {} frames",
            key.len(),
            len
        )));
    }
    Ok(())
}
