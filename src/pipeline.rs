//! End-to-end run: tape → cleaned trades → curve → per-view animations.
//!
//! ```no_run
//! use volsurf_frames::{Pipeline, View};
//! use volsurf_frames::config::PipelineConfig;
//!
//! let out = Pipeline::new(PipelineConfig::default()).run_path("trades.csv")?;
//! if let Some(anim) = out.animation(View::Puts) {
//!     println!("{} put frames around spot {:.2}", anim.len(), anim.spot);
//! }
//! # Ok::<(), volsurf_frames::SurfaceError>(())
//! ```

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bars::{PriceBar, price_bars};
use crate::config::PipelineConfig;
use crate::curve::{CurvePoint, CurveStats, aggregate_curves};
use crate::error::{Result, SurfaceError};
use crate::filter::{FilterStats, filter_trades};
use crate::frames::{Animation, sequence_frames};
use crate::ingest::{LoadStats, LoadedTrades, load_trades, load_trades_from_path};
use crate::surface::{GridSpec, InterpolationStats, interpolate_view};
use crate::types::View;

/// Result of one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOutput {
    pub view: View,
    /// `None` when no bucket had enough rows for this view.
    pub animation: Option<Animation>,
    pub stats: InterpolationStats,
}

/// Counters from every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub load: LoadStats,
    pub filter: FilterStats,
    pub curve: CurveStats,
    /// Views that produced no animation.
    pub missing_views: Vec<View>,
}

/// Everything a renderer needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Trading date the buckets belong to.
    pub reference_date: Option<NaiveDate>,
    /// Grid shared by every view; `None` when the curve is empty.
    pub grid: Option<GridSpec>,
    pub bars: Vec<PriceBar>,
    pub curve: Vec<CurvePoint>,
    /// One entry per view, in [`View::ALL`] order.
    pub views: Vec<ViewOutput>,
    pub stats: RunStats,
}

impl RunOutput {
    pub fn view(&self, view: View) -> Option<&ViewOutput> {
        self.views.iter().find(|v| v.view == view)
    }

    /// The animation of `view`, if it has one.
    pub fn animation(&self, view: View) -> Option<&Animation> {
        self.view(view)?.animation.as_ref()
    }
}

/// Configured pipeline; cheap to construct and reusable across tapes.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run over a CSV tape.
    ///
    /// # Errors
    /// Fatal only for an invalid config, a missing required column, or an
    /// unreadable source. Empty views are reported in the output.
    pub fn run<R: Read>(&self, source: R) -> Result<RunOutput> {
        self.config.validate()?;
        let loaded = load_trades(source, &self.config.loader)?;
        self.run_validated(loaded)
    }

    /// Run over a CSV file on disk.
    ///
    /// # Errors
    /// As [`Pipeline::run`], plus [`SurfaceError::Io`] if the file can't be opened.
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<RunOutput> {
        self.config.validate()?;
        let loaded = load_trades_from_path(path, &self.config.loader)?;
        self.run_validated(loaded)
    }

    /// Run over records already loaded.
    ///
    /// # Errors
    /// Returns [`SurfaceError::InvalidInput`] for an invalid config.
    pub fn run_loaded(&self, loaded: LoadedTrades) -> Result<RunOutput> {
        self.config.validate()?;
        self.run_validated(loaded)
    }

    /// Stages after loading; the config has already been validated.
    fn run_validated(&self, loaded: LoadedTrades) -> Result<RunOutput> {
        let cfg = &self.config;

        let filtered = filter_trades(&loaded.records, &cfg.filter);
        let bars = price_bars(&filtered.trades);
        let curve = aggregate_curves(&filtered.trades, &cfg.curve);

        let mut stats = RunStats {
            load: loaded.stats,
            filter: filtered.stats,
            curve: curve.stats,
            missing_views: Vec::new(),
        };

        let grid = match GridSpec::from_curve(&curve.points, &cfg.grid) {
            Ok(grid) => Some(grid),
            Err(SurfaceError::InvalidInput { .. }) if curve.is_empty() => None,
            Err(err) => return Err(err),
        };

        let mut views = Vec::with_capacity(View::ALL.len());
        for view in View::ALL {
            let (animation, view_stats) = match &grid {
                Some(grid) => {
                    let surfaces = interpolate_view(&curve.points, grid, view, &cfg.surface);
                    match sequence_frames(view, grid, surfaces.snapshots) {
                        Ok(anim) => (Some(anim), surfaces.stats),
                        Err(SurfaceError::NoAnimatableData { .. }) => (None, surfaces.stats),
                        Err(err) => return Err(err),
                    }
                }
                None => (None, InterpolationStats::default()),
            };
            if animation.is_none() {
                #[cfg(feature = "logging")]
                tracing::warn!(%view, "no bucket has enough rows, view skipped");
                stats.missing_views.push(view);
            }
            views.push(ViewOutput {
                view,
                animation,
                stats: view_stats,
            });
        }

        #[cfg(feature = "logging")]
        tracing::debug!(
            rows = stats.load.rows_read,
            trades = stats.filter.kept,
            curve_points = curve.points.len(),
            buckets = bars.len(),
            missing_views = stats.missing_views.len(),
            "run complete"
        );

        Ok(RunOutput {
            reference_date: filtered.reference_date,
            grid,
            bars,
            curve: curve.points,
            views,
            stats,
        })
    }
}
