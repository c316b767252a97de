//! darkflat - dark/flat field handling for tomography datasets
//!
//! Tomography acquisitions interleave calibration exposures with the actual
//! projections along the rotation axis. Each frame carries a label
//! (data, flat, dark or ignored); this crate turns those labels into a
//! logical, data-only view of the dataset and computes the dark and flat
//! reference frames used for correction.
//!
//! # Features
//!
//! - Label resolution with preview-window narrowing that keeps the
//!   calibration runs bracketing the visible data
//! - Run segmentation and exclusion of whole flat batches
//! - Calibration slice lists reduced to rotation/detector geometry
//! - Scaled, averaged or overridden dark/flat frames published to metadata
//! - Embedded (single array) and external (separate arrays) calibration
//!
//! # Example
//!
//! ```rust,ignore
//! use darkflat::{DarkFlatView, Dataset, ImageKey, ViewConfig};
//! use std::sync::Arc;
//!
//! # fn example(dataset: Dataset<u16>, key: ImageKey) -> darkflat::Result<()> {
//! let mut view = DarkFlatView::embedded(Arc::new(dataset), key, 0, &ViewConfig::default())?;
//! view.set_dark_and_flat()?;
//!
//! let flat = view.flat()?;
//! let dark = view.dark()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod correction;
pub mod dataset;
pub mod error;
pub mod image_key;
pub mod layout;
pub mod metadata;
pub mod preview;
pub mod recon;
pub mod slicing;
pub mod types;
pub mod utils;
pub mod view;

// Re-exports
pub use config::ViewConfig;
pub use correction::{calibration_slice_list, DarkFlatCorrector};
pub use dataset::Dataset;
pub use error::{DarkFlatError, Result};
pub use image_key::{resolve, segment, ImageKey, Runs};
pub use layout::DatasetLayout;
pub use metadata::MetaData;
pub use preview::Preview;
pub use recon::ReconstructionSolver;
pub use slicing::SliceSpec;
pub use types::{AxisDescriptor, CalibrationKind, FrameLabel};
pub use view::{DarkFlatView, ReferenceArray};

/// Version of the darkflat crate
pub const DARKFLAT_VERSION: &str = env!("CARGO_PKG_VERSION");
