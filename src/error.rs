//! Error types for the volsurf-frames pipeline.
//!
//! Only a violated input schema (or an unreadable source) is fatal. Coercion
//! failures, thin buckets and degenerate point clouds are reported through
//! the stage statistics instead, so most of these variants surface from the
//! lower-level APIs rather than from [`Pipeline::run`](crate::pipeline::Pipeline::run).

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Errors that can occur while building surface frames.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurfaceError {
    /// A required column is absent from the trade source header.
    #[error("missing required column: {column}")]
    MissingColumn {
        /// Column name (or alternatives) that was expected.
        column: String,
    },

    /// Input data or configuration is invalid (e.g., inverted band, zero grid size).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The scattered points cannot support a triangulation
    /// (fewer than three distinct sites, or all collinear).
    #[error("degenerate point set: {message}")]
    Degenerate {
        message: String,
        /// Number of distinct sites that were offered.
        points: usize,
    },

    /// No bucket of a view produced a snapshot.
    #[error("no animatable data for view {view}")]
    NoAnimatableData {
        /// View label (e.g., "calls").
        view: &'static str,
    },

    /// Malformed CSV record in the trade source.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure opening or writing a file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
