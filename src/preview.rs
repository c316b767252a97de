//! Preview windows restricting the visible part of a dataset

use crate::error::{DarkFlatError, Result};
use crate::slicing::SliceSpec;
use serde::{Deserialize, Serialize};

/// Per-dimension preview slice list
///
/// Along the projection axis the entry selects *logical* data frames,
/// not physical frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    slice_list: Vec<SliceSpec>,
}

impl Preview {
    /// Create a preview from one slice per dimension
    pub fn new(slice_list: Vec<SliceSpec>) -> Self {
        Self { slice_list }
    }

    /// Number of dimensions covered
    pub fn len(&self) -> usize {
        self.slice_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice_list.is_empty()
    }

    /// Copy of the full preview slice list
    pub fn get_preview_slice_list(&self) -> Vec<SliceSpec> {
        self.slice_list.clone()
    }

    /// Preview entry for a single dimension
    pub fn slice_for(&self, dim: usize) -> Result<&SliceSpec> {
        self.slice_list.get(dim).ok_or_else(|| {
            DarkFlatError::Preview(format!(
                "No preview entry for dimension {} ({} entries)",
                dim,
                self.slice_list.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_for() {
        let preview = Preview::new(vec![SliceSpec::range(1, 3), SliceSpec::All]);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview.slice_for(0).unwrap(), &SliceSpec::range(1, 3));
        assert!(matches!(preview.slice_for(2), Err(DarkFlatError::Preview(_))));
    }
}
