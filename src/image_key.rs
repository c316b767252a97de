//! Frame labels, run segmentation and label index resolution
//!
//! Frames along the projection axis are tagged with a [`FrameLabel`]. This
//! module turns those tags into physical frame positions, optionally
//! narrowed by the projection-axis entry of a preview window.

use crate::error::{DarkFlatError, Result};
use crate::slicing::SliceSpec;
use crate::types::FrameLabel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Frame label array, one label per physical frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageKey {
    labels: Vec<FrameLabel>,
}

impl ImageKey {
    pub fn new(labels: Vec<FrameLabel>) -> Self {
        Self { labels }
    }

    /// Build from raw integer labels, rejecting unknown values
    pub fn from_raw(raw: &[i64]) -> Result<Self> {
        let labels = raw
            .iter()
            .map(|&v| FrameLabel::from_raw(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { labels })
    }

    /// Number of physical frames
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[FrameLabel] {
        &self.labels
    }

    /// Every physical position carrying `label`, in position order
    pub fn positions(&self, label: FrameLabel) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| (l == label).then_some(i))
            .collect()
    }

    /// Number of frames carrying `label`
    pub fn count(&self, label: FrameLabel) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Relabel whole runs of flat frames as ignored
    ///
    /// `batches` are 1-based indices into the runs of flat frames in
    /// position order.
    pub fn ignore_flat_batches(&mut self, batches: &[usize]) -> Result<()> {
        let runs = segment(&self.positions(FrameLabel::Flat));

        for &batch in batches {
            if batch == 0 || batch > runs.len() {
                return Err(DarkFlatError::OutOfBounds(format!(
                    "Flat batch {} requested, {} batches present",
                    batch,
                    runs.len()
                )));
            }
            let (start, end) = runs.bounds(batch - 1);
            for label in &mut self.labels[start..=end] {
                *label = FrameLabel::Ignore;
            }
            info!(batch, start, end, "ignoring flat batch");
        }

        Ok(())
    }
}

/// Maximal contiguous runs within a sorted position list
///
/// `starts`/`ends` index into the segmented list; `start_values` and
/// `end_values` are the positions found there.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Runs {
    pub starts: Vec<usize>,
    pub ends: Vec<usize>,
    pub start_values: Vec<usize>,
    pub end_values: Vec<usize>,
}

impl Runs {
    /// Number of runs
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// First and last position of a run
    pub fn bounds(&self, run: usize) -> (usize, usize) {
        (self.start_values[run], self.end_values[run])
    }

    /// Run containing the position `value`
    pub fn containing(&self, value: usize) -> Option<usize> {
        let run = self.end_values.partition_point(|&end| end < value);
        (run < self.len() && self.start_values[run] <= value).then_some(run)
    }
}

/// Split positions into maximal runs of consecutive values
///
/// Positions are expected in ascending order, as [`ImageKey::positions`]
/// returns them. Out-of-order input never starts a new run.
pub fn segment(positions: &[usize]) -> Runs {
    let mut runs = Runs::default();
    if positions.is_empty() {
        return runs;
    }

    runs.starts.push(0);
    for (i, pair) in positions.windows(2).enumerate() {
        if pair[1] > pair[0] + 1 {
            runs.ends.push(i);
            runs.starts.push(i + 1);
        }
    }
    runs.ends.push(positions.len() - 1);

    runs.start_values = runs.starts.iter().map(|&i| positions[i]).collect();
    runs.end_values = runs.ends.iter().map(|&i| positions[i]).collect();
    runs
}

/// Physical positions of `label`, optionally narrowed by a preview window
///
/// `window` is the preview entry for the projection axis and selects
/// logical data frames. With no window every position of `label` is
/// returned. Data frames are narrowed directly; calibration frames span
/// from the run preceding the first windowed data frame to the run
/// following the last one. A window that cannot be honoured falls back
/// to the full positions.
pub fn resolve(key: &ImageKey, label: FrameLabel, window: Option<&SliceSpec>) -> Vec<usize> {
    let Some(window) = window else {
        return key.positions(label);
    };

    match reduced_positions(key, label, window) {
        Ok(positions) => positions,
        Err(e) => {
            debug!(%label, error = %e, "preview not applicable, using all frames");
            key.positions(label)
        }
    }
}

fn reduced_positions(key: &ImageKey, label: FrameLabel, window: &SliceSpec) -> Result<Vec<usize>> {
    let data_entries = window.select(&key.positions(FrameLabel::Data))?;
    if label == FrameLabel::Data {
        return Ok(data_entries);
    }

    let (first, last) = match (data_entries.first(), data_entries.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            return Err(DarkFlatError::Preview(
                "Preview selects no data frames".to_string(),
            ))
        }
    };

    let index = key.positions(label);
    let runs = segment(&index);

    let before = index
        .iter()
        .rev()
        .find(|&&p| p < first)
        .and_then(|&p| runs.containing(p))
        .ok_or_else(|| DarkFlatError::Preview(format!("No {} run before frame {}", label, first)))?;
    let after = index
        .iter()
        .find(|&&p| p > last)
        .and_then(|&p| runs.containing(p))
        .ok_or_else(|| DarkFlatError::Preview(format!("No {} run after frame {}", label, last)))?;

    Ok(index[runs.starts[before]..=runs.ends[after]].to_vec())
}
