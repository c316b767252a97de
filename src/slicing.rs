//! Per-dimension slice specifications and their application to arrays

use crate::error::{DarkFlatError, Result};
use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use serde::{Deserialize, Serialize};

/// Selection along one dimension of an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceSpec {
    /// Every position
    All,
    /// Half-open stepped range; `stop: None` runs to the end of the axis
    Range {
        start: usize,
        stop: Option<usize>,
        step: usize,
    },
    /// A single position; the axis is removed from the result
    Index(usize),
    /// Arbitrary positions in the given order; the axis is kept
    Indices(Vec<usize>),
}

impl SliceSpec {
    /// Contiguous range `start..stop`
    pub fn range(start: usize, stop: usize) -> Self {
        SliceSpec::Range {
            start,
            stop: Some(stop),
            step: 1,
        }
    }

    /// Stepped range `start..stop` taking every `step`-th position
    pub fn stepped(start: usize, stop: Option<usize>, step: usize) -> Self {
        SliceSpec::Range { start, stop, step }
    }

    /// Whether the axis survives this selection
    pub fn keeps_axis(&self) -> bool {
        !matches!(self, SliceSpec::Index(_))
    }

    /// Positions selected from an axis of length `len`
    ///
    /// Ranges are clamped to the axis like Python slices; explicit indices
    /// must be in bounds.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>> {
        match self {
            SliceSpec::All => Ok((0..len).collect()),
            SliceSpec::Range { start, stop, step } => {
                let (start, stop) = clamp_range(*start, *stop, *step, len)?;
                Ok((start..stop).step_by(*step).collect())
            }
            SliceSpec::Index(i) => {
                check_bounds(*i, len)?;
                Ok(vec![*i])
            }
            SliceSpec::Indices(indices) => {
                for &i in indices {
                    check_bounds(i, len)?;
                }
                Ok(indices.clone())
            }
        }
    }

    /// Select items from a sequence, e.g. physical positions by logical index
    pub fn select<T: Copy>(&self, items: &[T]) -> Result<Vec<T>> {
        Ok(self
            .positions(items.len())?
            .into_iter()
            .map(|i| items[i])
            .collect())
    }
}

/// Clamp a range to an axis of length `len` like a Python slice
fn clamp_range(start: usize, stop: Option<usize>, step: usize, len: usize) -> Result<(usize, usize)> {
    if step == 0 {
        return Err(DarkFlatError::InvalidDimensions(
            "Slice step must be positive".to_string(),
        ));
    }
    let stop = stop.unwrap_or(len).min(len);
    Ok((start.min(stop), stop))
}

fn check_bounds(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(DarkFlatError::OutOfBounds(format!(
            "Index {} out of range for axis of length {}",
            index, len
        )));
    }
    Ok(())
}

/// A slice list selecting everything in `ndim` dimensions
pub fn full_slice_list(ndim: usize) -> Vec<SliceSpec> {
    vec![SliceSpec::All; ndim]
}

/// Apply a slice list to an array
///
/// Missing trailing entries select the whole axis. `Index` entries drop
/// their axis. Ranges and indices narrow the view in place, so only the
/// selected elements are copied; `Indices` entries are gathered last.
pub fn apply_slice_list<T: Clone>(array: ArrayViewD<'_, T>, specs: &[SliceSpec]) -> Result<ArrayD<T>> {
    if specs.len() > array.ndim() {
        return Err(DarkFlatError::InvalidDimensions(format!(
            "Slice list has {} entries for a {}D array",
            specs.len(),
            array.ndim()
        )));
    }

    // Axes are visited from last to first so earlier axis numbers stay valid
    let mut view = array;
    let mut gathers: Vec<(usize, &[usize])> = Vec::new();
    for (axis, spec) in specs.iter().enumerate().rev() {
        let len = view.len_of(Axis(axis));
        match spec {
            SliceSpec::All => {}
            SliceSpec::Range { start, stop, step } => {
                let (start, stop) = clamp_range(*start, *stop, *step, len)?;
                view.slice_axis_inplace(
                    Axis(axis),
                    Slice::new(start as isize, Some(stop as isize), *step as isize),
                );
            }
            SliceSpec::Index(i) => {
                check_bounds(*i, len)?;
                view = view.index_axis_move(Axis(axis), *i);
            }
            SliceSpec::Indices(indices) => {
                for &i in indices {
                    check_bounds(i, len)?;
                }
                let dropped = specs[..axis].iter().filter(|s| !s.keeps_axis()).count();
                gathers.push((axis - dropped, indices.as_slice()));
            }
        }
    }

    let Some(((axis, indices), rest)) = gathers.split_first() else {
        return Ok(view.to_owned());
    };
    let mut out = view.select(Axis(*axis), indices);
    for (axis, indices) in rest {
        out = out.select(Axis(*axis), indices);
    }
    Ok(out)
}

/// Position of `axis` after applying `specs`, or `None` if it was dropped
pub fn reduced_axis(specs: &[SliceSpec], axis: usize) -> Option<usize> {
    if specs.get(axis).is_some_and(|s| !s.keeps_axis()) {
        return None;
    }
    let dropped = specs
        .iter()
        .take(axis)
        .filter(|s| !s.keeps_axis())
        .count();
    Some(axis - dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    fn sample_array() -> ArrayD<u16> {
        Array::from_shape_vec(IxDyn(&[3, 2, 4]), (0..24).collect()).unwrap()
    }

    #[test]
    fn test_positions() {
        assert_eq!(SliceSpec::All.positions(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(SliceSpec::range(1, 3).positions(5).unwrap(), vec![1, 2]);
        assert_eq!(
            SliceSpec::stepped(0, None, 2).positions(5).unwrap(),
            vec![0, 2, 4]
        );
        // Ranges clamp like Python slices
        assert_eq!(SliceSpec::range(3, 10).positions(4).unwrap(), vec![3]);
        assert!(SliceSpec::range(6, 10).positions(4).unwrap().is_empty());
        assert!(SliceSpec::Index(4).positions(4).is_err());
        assert!(SliceSpec::stepped(0, None, 0).positions(4).is_err());
    }

    #[test]
    fn test_select_items() {
        let physical = [1usize, 2, 3, 8, 9];
        assert_eq!(SliceSpec::range(1, 3).select(&physical).unwrap(), vec![2, 3]);
        assert_eq!(
            SliceSpec::Indices(vec![4, 0]).select(&physical).unwrap(),
            vec![9, 1]
        );
    }

    #[test]
    fn test_apply_slice_list() {
        let array = sample_array();
        let out = apply_slice_list(
            array.view(),
            &[SliceSpec::Indices(vec![0, 2]), SliceSpec::All, SliceSpec::range(1, 3)],
        )
        .unwrap();
        assert_eq!(out.shape(), &[2, 2, 2]);
        assert_eq!(out[[1, 0, 0]], array[[2, 0, 1]]);
    }

    #[test]
    fn test_apply_index_drops_axis() {
        let array = sample_array();
        let out = apply_slice_list(array.view(), &[SliceSpec::Index(1), SliceSpec::Index(0)]).unwrap();
        assert_eq!(out.shape(), &[4]);
        assert_eq!(out[[3]], array[[1, 0, 3]]);
    }

    #[test]
    fn test_apply_short_list_keeps_trailing_axes() {
        let array = sample_array();
        let out = apply_slice_list(array.view(), &[SliceSpec::range(0, 1)]).unwrap();
        assert_eq!(out.shape(), &[1, 2, 4]);
        assert!(apply_slice_list(array.view(), &full_slice_list(4)).is_err());
    }

    #[test]
    fn test_apply_mixed_entries_on_view() {
        let array = sample_array();
        let out = apply_slice_list(
            array.view(),
            &[SliceSpec::Indices(vec![2, 0]), SliceSpec::Index(1), SliceSpec::stepped(0, None, 2)],
        )
        .unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out[[0, 0]], array[[2, 1, 0]]);
        assert_eq!(out[[1, 1]], array[[0, 1, 2]]);

        let out = apply_slice_list(
            array.view(),
            &[SliceSpec::Index(2), SliceSpec::All, SliceSpec::Indices(vec![3, 3])],
        )
        .unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out[[1, 0]], array[[2, 1, 3]]);
        assert!(apply_slice_list(array.view(), &[SliceSpec::Indices(vec![3])]).is_err());
    }

    #[test]
    fn test_apply_leaves_source_untouched() {
        let array = sample_array();
        let view = array.view();
        let out = apply_slice_list(view.clone(), &[SliceSpec::range(1, 2), SliceSpec::Index(0)]).unwrap();
        assert_eq!(out.shape(), &[1, 4]);
        assert_eq!(out[[0, 2]], array[[1, 0, 2]]);
        assert_eq!(view.shape(), &[3, 2, 4]);
    }

    #[test]
    fn test_reduced_axis() {
        let specs = [SliceSpec::Index(0), SliceSpec::All, SliceSpec::All];
        assert_eq!(reduced_axis(&specs, 0), None);
        assert_eq!(reduced_axis(&specs, 2), Some(1));
        assert_eq!(reduced_axis(&[], 1), Some(1));
    }
}
