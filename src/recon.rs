//! Boundary to reconstruction solvers
//!
//! The solver itself is pluggable. This module prepares a corrected
//! sinogram the way solvers expect it: non-finite values zeroed, a
//! `ln(1 + x)` transform, and reflect padding that puts the centre of
//! rotation in the middle of the detector row.

use crate::error::{DarkFlatError, Result};
use ndarray::{Array2, ArrayView2};
use tracing::debug;

/// Columns of padding added on both sides beyond the centring offset
pub const PAD_MARGIN: usize = 50;

/// A 2D reconstruction backend
pub trait ReconstructionSolver {
    /// Reconstruct a prepared sinogram (rows are projections) taken at
    /// `angles` radians into an image of `shape` (rows, columns)
    fn reconstruct(
        &self,
        sinogram: ArrayView2<'_, f32>,
        angles: &[f64],
        shape: (usize, usize),
    ) -> Result<Array2<f32>>;
}

/// Padding (low, high) centring the rotation axis in a row of `width`
pub fn centring_padding(width: usize, centre_of_rotation: f64) -> (usize, usize) {
    let before = centre_of_rotation;
    let after = width as f64 - centre_of_rotation;
    let offset = (before - after).abs().round() as usize;

    if centre_of_rotation > width as f64 / 2.0 {
        (PAD_MARGIN, offset + PAD_MARGIN)
    } else {
        (offset + PAD_MARGIN, PAD_MARGIN)
    }
}

/// Zero non-finite values, apply `ln(1 + x)` and reflect-pad the columns
pub fn prepare_sinogram(sinogram: ArrayView2<'_, f32>, centre_of_rotation: f64) -> Result<Array2<f32>> {
    let (rows, width) = sinogram.dim();
    if width == 0 {
        return Err(DarkFlatError::InvalidDimensions(
            "Sinogram has no detector columns".to_string(),
        ));
    }

    let logdata = sinogram.mapv(|v| if v.is_finite() { v.ln_1p() } else { 0.0 });
    let (low, high) = centring_padding(width, centre_of_rotation);
    debug!(width, low, high, "padding sinogram");

    let padded = Array2::from_shape_fn((rows, low + width + high), |(r, c)| {
        logdata[[r, reflect_index(c as isize - low as isize, width)]]
    });
    Ok(padded)
}

/// Mirror an out-of-range column back into `0..len` without repeating the
/// edge sample
fn reflect_index(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = index.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Prepare a corrected sinogram and hand it to `solver`
///
/// `angles` are in degrees, one per sinogram row.
pub fn reconstruct<S: ReconstructionSolver + ?Sized>(
    solver: &S,
    sinogram: ArrayView2<'_, f32>,
    centre_of_rotation: f64,
    angles: &[f64],
    shape: (usize, usize),
) -> Result<Array2<f32>> {
    if angles.len() != sinogram.nrows() {
        return Err(DarkFlatError::InvalidDimensions(format!(
            "{} angles for {} projections",
            angles.len(),
            sinogram.nrows()
        )));
    }

    let prepared = prepare_sinogram(sinogram, centre_of_rotation)?;
    let radians: Vec<f64> = angles.iter().map(|a| a.to_radians()).collect();
    solver.reconstruct(prepared.view(), &radians, shape)
}
