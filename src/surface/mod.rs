//! Implied-volatility surfaces over a fixed strike × tenor grid.
//!
//! Each time bucket's out-of-the-money curve points are triangulated in
//! (strike, days-to-expiry) space and interpolated linearly onto a
//! [`GridSpec`] shared by the whole run:
//!
//! - [`Triangulation`]: Delaunay triangulation of scattered sites
//! - [`LinearInterpolator`]: barycentric blend inside the convex hull
//! - [`GridSpec`]: strike and tenor axes centred on the run's spot
//! - [`interpolate_view`]: one [`SurfaceSnapshot`] per populated bucket

pub mod builder;
pub mod delaunay;
pub mod grid;
pub mod interp;

pub use builder::{InterpolationStats, ViewSurfaces, interpolate_view};
pub use delaunay::Triangulation;
pub use grid::GridSpec;
pub use interp::LinearInterpolator;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::OptionType;

/// Interpolated IV (percent) on the grid nodes.
///
/// Indexed `values[tenor][strike]`, matching [`GridSpec::tenors`] and
/// [`GridSpec::strikes`]. Nodes outside the convex hull of the bucket's
/// OTM points are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub values: Vec<Vec<Option<f64>>>,
}

impl SurfaceGrid {
    /// Value at `(tenor_index, strike_index)`, if defined.
    pub fn get(&self, tenor: usize, strike: usize) -> Option<f64> {
        self.values.get(tenor)?.get(strike).copied().flatten()
    }

    /// Number of nodes carrying a value.
    pub fn defined_count(&self) -> usize {
        self.values.iter().flatten().filter(|v| v.is_some()).count()
    }
}

/// Why a snapshot has no grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SurfaceOmission {
    /// Fewer OTM points than the fit requires.
    TooFewOtm { count: usize },
    /// The OTM points could not be triangulated.
    Degenerate { message: String },
}

/// One curve point as drawn in the scatter overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub strike: f64,
    pub dte: i64,
    /// Decimal IV.
    pub iv: f64,
    pub option_type: OptionType,
    pub is_otm: bool,
}

/// Surface state of one view at one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSnapshot {
    pub bucket: NaiveDateTime,
    /// Median underlying of the bucket's rows in this view; marks the ATM line.
    pub underlying: f64,
    pub surface: Option<SurfaceGrid>,
    pub omission: Option<SurfaceOmission>,
    /// Every call row of the bucket in this view, ITM included.
    pub calls: Vec<ScatterPoint>,
    /// Every put row of the bucket in this view, ITM included.
    pub puts: Vec<ScatterPoint>,
}

impl SurfaceSnapshot {
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Total scatter points across both sides.
    pub fn scatter_len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }
}
