//! Utility functions

use ndarray::{ArrayD, ArrayViewD};
use num_traits::ToPrimitive;

/// Cast any numeric array to `f32`; unrepresentable values become NaN
pub fn to_f32_array<T: Copy + ToPrimitive>(array: ArrayViewD<'_, T>) -> ArrayD<f32> {
    array.mapv(|v| v.to_f32().unwrap_or(f32::NAN))
}

/// Format an array shape as `a x b x c`
pub fn format_shape(shape: &[usize]) -> String {
    shape
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" x ")
}
