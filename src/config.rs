//! Pipeline configuration.
//!
//! Every stage reads its own section. All sections deserialize with
//! `#[serde(default)]`, so a partial JSON document only needs the keys it
//! overrides:
//!
//! ```
//! use volsurf_frames::config::PipelineConfig;
//!
//! let cfg: PipelineConfig = serde_json::from_str(r#"{ "curve": { "min_volume": 5.0 } }"#)?;
//! assert_eq!(cfg.curve.min_volume, 5.0);
//! assert_eq!(cfg.filter.bucket_seconds, 300);
//! cfg.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};
use crate::validate::{validate_at_least, validate_band, validate_non_negative, validate_positive};

/// Record loading options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Underlying to keep when the source carries a ticker column.
    /// `None` keeps every row.
    pub ticker: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ticker: Some("SPY".to_string()),
        }
    }
}

/// Trade admission and bucketing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum trade price (inclusive).
    pub min_price: f64,
    /// Exclusive IV band `(lo, hi)` for single trades.
    pub trade_iv_band: (f64, f64),
    /// Inclusive moneyness band `[lo, hi]`.
    pub moneyness_band: (f64, f64),
    /// Bucket width in seconds.
    pub bucket_seconds: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_price: 0.05,
            trade_iv_band: (0.02, 1.0),
            moneyness_band: (0.80, 1.20),
            bucket_seconds: 300,
        }
    }
}

/// Curve aggregation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Minimum summed size per curve point (inclusive).
    pub min_volume: f64,
    /// Inclusive IV sanity band for aggregated points.
    pub iv_band: (f64, f64),
    /// Longest days-to-expiration kept (inclusive).
    pub max_dte: i64,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            min_volume: 2.0,
            iv_band: (0.05, 0.35),
            max_dte: 60,
        }
    }
}

/// Interpolation grid options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of strike nodes.
    pub strike_points: usize,
    /// Number of tenor nodes.
    pub tenor_points: usize,
    /// Strike axis spans `spot · (1 ± strike_span)`.
    pub strike_span: f64,
    /// Tenor axis `[lo, hi]` in days.
    pub tenor_range: (f64, f64),
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            strike_points: 25,
            tenor_points: 18,
            strike_span: 0.10,
            tenor_range: (1.0, 45.0),
        }
    }
}

/// Per-bucket surface options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Minimum rows for a bucket to produce a frame, and minimum OTM rows
    /// for the frame to carry an interpolated grid.
    pub min_points: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { min_points: 5 }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub loader: LoaderConfig,
    pub filter: FilterConfig,
    pub curve: CurveConfig,
    pub grid: GridConfig,
    pub surface: SurfaceConfig,
}

impl PipelineConfig {
    /// Restrict to `ticker`, or keep every underlying with `None`.
    pub fn with_ticker(mut self, ticker: Option<&str>) -> Self {
        self.loader.ticker = ticker.map(str::to_string);
        self
    }

    /// Set the bucket width in seconds.
    pub fn with_bucket_seconds(mut self, secs: u32) -> Self {
        self.filter.bucket_seconds = secs;
        self
    }

    /// Set the minimum aggregated volume per curve point.
    pub fn with_min_volume(mut self, min_volume: f64) -> Self {
        self.curve.min_volume = min_volume;
        self
    }

    /// Set the grid resolution (strike nodes × tenor nodes).
    pub fn with_grid_resolution(mut self, strike_points: usize, tenor_points: usize) -> Self {
        self.grid.strike_points = strike_points;
        self.grid.tenor_points = tenor_points;
        self
    }

    /// Set the minimum points per frame.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.surface.min_points = min_points;
        self
    }

    /// Check every bound.
    ///
    /// # Errors
    /// Returns [`SurfaceError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let f = &self.filter;
        validate_non_negative(f.min_price, "filter.min_price")?;
        validate_band(f.trade_iv_band, "filter.trade_iv_band")?;
        validate_band(f.moneyness_band, "filter.moneyness_band")?;
        validate_positive(f.moneyness_band.0, "filter.moneyness_band.lo")?;
        if f.bucket_seconds == 0 {
            return Err(SurfaceError::InvalidInput {
                message: "filter.bucket_seconds must be positive".into(),
            });
        }

        let c = &self.curve;
        validate_positive(c.min_volume, "curve.min_volume")?;
        validate_band(c.iv_band, "curve.iv_band")?;
        if c.max_dte < 1 {
            return Err(SurfaceError::InvalidInput {
                message: format!("curve.max_dte must be at least 1, got {}", c.max_dte),
            });
        }

        let g = &self.grid;
        validate_at_least(g.strike_points, 2, "grid.strike_points")?;
        validate_at_least(g.tenor_points, 2, "grid.tenor_points")?;
        validate_positive(g.strike_span, "grid.strike_span")?;
        if g.strike_span >= 1.0 {
            return Err(SurfaceError::InvalidInput {
                message: format!("grid.strike_span must be below 1, got {}", g.strike_span),
            });
        }
        validate_band(g.tenor_range, "grid.tenor_range")?;

        validate_at_least(self.surface.min_points, 3, "surface.min_points")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.loader.ticker.as_deref(), Some("SPY"));
        assert_eq!(cfg.filter.min_price, 0.05);
        assert_eq!(cfg.filter.trade_iv_band, (0.02, 1.0));
        assert_eq!(cfg.filter.moneyness_band, (0.80, 1.20));
        assert_eq!(cfg.filter.bucket_seconds, 300);
        assert_eq!(cfg.curve.min_volume, 2.0);
        assert_eq!(cfg.curve.iv_band, (0.05, 0.35));
        assert_eq!(cfg.curve.max_dte, 60);
        assert_eq!(cfg.grid.strike_points, 25);
        assert_eq!(cfg.grid.tenor_points, 18);
        assert_eq!(cfg.grid.tenor_range, (1.0, 45.0));
        assert_eq!(cfg.surface.min_points, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"grid": {"strike_points": 40}, "loader": {"ticker": null}}"#)
                .unwrap();
        assert_eq!(cfg.grid.strike_points, 40);
        assert_eq!(cfg.grid.tenor_points, 18);
        assert_eq!(cfg.loader.ticker, None);
    }

    #[test]
    fn builder_setters() {
        let cfg = PipelineConfig::default()
            .with_ticker(Some("QQQ"))
            .with_bucket_seconds(60)
            .with_min_volume(3.0)
            .with_grid_resolution(10, 8)
            .with_min_points(4);
        assert_eq!(cfg.loader.ticker.as_deref(), Some("QQQ"));
        assert_eq!(cfg.filter.bucket_seconds, 60);
        assert_eq!(cfg.curve.min_volume, 3.0);
        assert_eq!((cfg.grid.strike_points, cfg.grid.tenor_points), (10, 8));
        assert_eq!(cfg.surface.min_points, 4);
    }

    #[test]
    fn inverted_band_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.curve.iv_band = (0.35, 0.05);
        assert!(matches!(cfg.validate(), Err(SurfaceError::InvalidInput { .. })));
    }

    #[test]
    fn zero_bucket_rejected() {
        let cfg = PipelineConfig::default().with_bucket_seconds(0);
        assert!(matches!(cfg.validate(), Err(SurfaceError::InvalidInput { .. })));
    }

    #[test]
    fn tiny_grid_rejected() {
        let cfg = PipelineConfig::default().with_grid_resolution(1, 18);
        match cfg.validate() {
            Err(SurfaceError::InvalidInput { message }) => {
                assert!(message.contains("strike_points"), "{message}");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn min_points_below_triangle_rejected() {
        let cfg = PipelineConfig::default().with_min_points(2);
        assert!(cfg.validate().is_err());
    }
}
