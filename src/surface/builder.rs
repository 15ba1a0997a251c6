//! Per-bucket surface construction.
//!
//! Every bucket is fitted independently against the shared [`GridSpec`]:
//!
//! ```
//! use volsurf_frames::config::SurfaceConfig;
//! use volsurf_frames::surface::{GridSpec, interpolate_view};
//! use volsurf_frames::View;
//!
//! let grid = GridSpec::new(445.0, &Default::default())?;
//! let surfaces = interpolate_view(&[], &grid, View::Combined, &SurfaceConfig::default());
//! assert!(surfaces.snapshots.is_empty());
//! # Ok::<(), volsurf_frames::SurfaceError>(())
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::SurfaceConfig;
use crate::curve::CurvePoint;
use crate::error::SurfaceError;
use crate::surface::grid::{GridSpec, median};
use crate::surface::interp::LinearInterpolator;
use crate::surface::{ScatterPoint, SurfaceGrid, SurfaceOmission, SurfaceSnapshot};
use crate::types::{OptionType, View};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Counters for one view's interpolation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationStats {
    /// Distinct buckets in the curve.
    pub buckets: usize,
    /// Buckets with too few rows for a frame.
    pub thin_buckets: usize,
    /// Frames without a grid because too few OTM rows remained.
    pub too_few_otm: usize,
    /// Frames without a grid because the OTM sites were degenerate.
    pub degenerate: usize,
    /// Frames carrying an interpolated grid.
    pub surfaces: usize,
}

/// Snapshots for one view, ascending by bucket.
#[derive(Debug, Clone)]
pub struct ViewSurfaces {
    pub view: View,
    pub snapshots: Vec<SurfaceSnapshot>,
    pub stats: InterpolationStats,
}

/// Fit `grid` for `rows` (one bucket's OTM points); IV is reported in percent.
fn fit_grid(rows: &[&CurvePoint], grid: &GridSpec) -> crate::error::Result<SurfaceGrid> {
    let xs: Vec<f64> = rows.iter().map(|p| p.strike).collect();
    let ys: Vec<f64> = rows.iter().map(|p| p.dte as f64).collect();
    let zs: Vec<f64> = rows.iter().map(|p| p.iv * 100.0).collect();
    let interp = LinearInterpolator::new(&xs, &ys, &zs)?;

    let values = grid
        .tenors
        .iter()
        .map(|&t| grid.strikes.iter().map(|&k| interp.eval(k, t)).collect())
        .collect();
    Ok(SurfaceGrid { values })
}

/// Build the snapshot for one bucket, or `None` when it is too thin.
fn snapshot_for(
    bucket: NaiveDateTime,
    rows: &[&CurvePoint],
    grid: &GridSpec,
    view: View,
    min_points: usize,
) -> Option<SurfaceSnapshot> {
    let rows: Vec<&CurvePoint> = rows
        .iter()
        .copied()
        .filter(|p| view.includes(p.option_type))
        .collect();
    if rows.len() < min_points {
        return None;
    }

    let otm: Vec<&CurvePoint> = rows.iter().copied().filter(|p| p.is_otm).collect();
    let (surface, omission) = if otm.len() < min_points {
        (None, Some(SurfaceOmission::TooFewOtm { count: otm.len() }))
    } else {
        match fit_grid(&otm, grid) {
            Ok(g) => (Some(g), None),
            Err(err) => {
                #[cfg(feature = "logging")]
                tracing::warn!(%bucket, %view, error = %err, "surface fit failed, keeping scatter only");
                let message = match err {
                    SurfaceError::Degenerate { message, .. } => message,
                    other => other.to_string(),
                };
                (None, Some(SurfaceOmission::Degenerate { message }))
            }
        }
    };

    let scatter = |side: OptionType| -> Vec<ScatterPoint> {
        rows.iter()
            .filter(|p| p.option_type == side)
            .map(|p| ScatterPoint {
                strike: p.strike,
                dte: p.dte,
                iv: p.iv,
                option_type: p.option_type,
                is_otm: p.is_otm,
            })
            .collect()
    };

    Some(SurfaceSnapshot {
        bucket,
        underlying: median(rows.iter().map(|p| p.underlying)).unwrap_or(grid.spot),
        surface,
        omission,
        calls: scatter(OptionType::Call),
        puts: scatter(OptionType::Put),
    })
}

/// Build one snapshot per sufficiently populated bucket of `curve`.
///
/// Buckets are taken from the whole curve, then restricted to `view`'s rows.
/// A bucket with fewer than `config.min_points` rows yields no snapshot;
/// one with fewer OTM rows (or a degenerate OTM cloud) yields a snapshot
/// without a grid. With the `parallel` feature buckets are fitted on the
/// rayon pool; the output is identical either way.
pub fn interpolate_view(
    curve: &[CurvePoint],
    grid: &GridSpec,
    view: View,
    config: &SurfaceConfig,
) -> ViewSurfaces {
    let mut by_bucket: BTreeMap<NaiveDateTime, Vec<&CurvePoint>> = BTreeMap::new();
    for p in curve {
        by_bucket.entry(p.bucket).or_default().push(p);
    }
    let buckets: Vec<(NaiveDateTime, Vec<&CurvePoint>)> = by_bucket.into_iter().collect();

    #[cfg(feature = "logging")]
    tracing::debug!(%view, n_buckets = buckets.len(), "view interpolation started");

    let min_points = config.min_points;
    let build = |(bucket, rows): &(NaiveDateTime, Vec<&CurvePoint>)| {
        snapshot_for(*bucket, rows, grid, view, min_points)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Option<SurfaceSnapshot>> = buckets.par_iter().map(build).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Option<SurfaceSnapshot>> = buckets.iter().map(build).collect();

    let mut stats = InterpolationStats {
        buckets: buckets.len(),
        ..InterpolationStats::default()
    };
    let mut snapshots = Vec::with_capacity(results.len());
    for snap in results {
        let Some(snap) = snap else {
            stats.thin_buckets += 1;
            continue;
        };
        match snap.omission {
            None => stats.surfaces += 1,
            Some(SurfaceOmission::TooFewOtm { .. }) => stats.too_few_otm += 1,
            Some(SurfaceOmission::Degenerate { .. }) => stats.degenerate += 1,
        }
        snapshots.push(snap);
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        %view,
        frames = snapshots.len(),
        surfaces = stats.surfaces,
        thin_buckets = stats.thin_buckets,
        too_few_otm = stats.too_few_otm,
        degenerate = stats.degenerate,
        "view interpolation complete"
    );

    ViewSurfaces {
        view,
        snapshots,
        stats,
    }
}
