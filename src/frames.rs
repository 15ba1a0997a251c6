//! Ordering and labelling of snapshots into an animation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};
use crate::surface::{GridSpec, SurfaceSnapshot};
use crate::types::View;

/// One animation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Bucket start as `HH:MM`.
    pub label: String,
    pub bucket: NaiveDateTime,
    pub snapshot: SurfaceSnapshot,
}

/// Chronological frames of one view, with the grid they share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub view: View,
    /// Spot the grid is centred on.
    pub spot: f64,
    pub grid: GridSpec,
    pub frames: Vec<Frame>,
}

impl Animation {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Slider labels in frame order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.label.as_str())
    }
}

/// Sort `snapshots` by bucket and label them.
///
/// # Errors
/// Returns [`SurfaceError::NoAnimatableData`] when there is no snapshot.
pub fn sequence_frames(
    view: View,
    grid: &GridSpec,
    mut snapshots: Vec<SurfaceSnapshot>,
) -> Result<Animation> {
    if snapshots.is_empty() {
        return Err(SurfaceError::NoAnimatableData {
            view: view.as_str(),
        });
    }
    snapshots.sort_by_key(|s| s.bucket);

    let frames = snapshots
        .into_iter()
        .map(|snapshot| Frame {
            label: snapshot.bucket.format("%H:%M").to_string(),
            bucket: snapshot.bucket,
            snapshot,
        })
        .collect();

    Ok(Animation {
        view,
        spot: grid.spot,
        grid: grid.clone(),
        frames,
    })
}
