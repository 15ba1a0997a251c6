//! Fixed strike × tenor evaluation grid.
//!
//! One grid is built per run and shared by every bucket and every view, so
//! frames stay comparable as the animation plays.

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::curve::CurvePoint;
use crate::error::{Result, SurfaceError};

/// Strike and tenor axes plus the spot they are centred on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Median underlying reference over the whole curve.
    pub spot: f64,
    /// Strike nodes, ascending.
    pub strikes: Vec<f64>,
    /// Tenor nodes in days, ascending.
    pub tenors: Vec<f64>,
}

impl GridSpec {
    /// Build the grid around an explicit spot.
    ///
    /// # Errors
    /// Returns [`SurfaceError::InvalidInput`] for a non-positive spot or a
    /// config that fails validation.
    pub fn new(spot: f64, config: &GridConfig) -> Result<Self> {
        if !spot.is_finite() || spot <= 0.0 {
            return Err(SurfaceError::InvalidInput {
                message: format!("grid spot must be positive and finite, got {spot}"),
            });
        }
        if config.strike_points < 2 || config.tenor_points < 2 {
            return Err(SurfaceError::InvalidInput {
                message: format!(
                    "grid needs at least 2 nodes per axis, got {} x {}",
                    config.strike_points, config.tenor_points
                ),
            });
        }
        let span = config.strike_span;
        Ok(Self {
            spot,
            strikes: linspace(spot * (1.0 - span), spot * (1.0 + span), config.strike_points),
            tenors: linspace(config.tenor_range.0, config.tenor_range.1, config.tenor_points),
        })
    }

    /// Build the grid around the median underlying of the entire curve.
    ///
    /// # Errors
    /// Returns [`SurfaceError::InvalidInput`] for an empty curve.
    pub fn from_curve(points: &[CurvePoint], config: &GridConfig) -> Result<Self> {
        let spot = median(points.iter().map(|p| p.underlying)).ok_or_else(|| {
            SurfaceError::InvalidInput {
                message: "cannot centre a grid on an empty curve".into(),
            }
        })?;
        Self::new(spot, config)
    }

    /// Number of nodes (tenors × strikes).
    pub fn len(&self) -> usize {
        self.strikes.len() * self.tenors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `n` evenly spaced points over `[lo, hi]`, endpoints included.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

/// Median of the finite values; mean of the middle pair for even counts.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut v: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    })
}
