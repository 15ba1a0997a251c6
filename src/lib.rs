//! # volsurf-frames
//!
//! Intraday implied-volatility surface frames from a raw options trade tape.
//!
//! Provides the full pipeline: trade records → quality filter → per-bucket
//! IV curve → interpolated strike × tenor surface → time-ordered frames for
//! an animated renderer.
//!
//! ## Architecture
//!
//! - **`ingest`**: CSV tape loading with per-field coercion
//! - **`filter`**: Trade admission, moneyness, time buckets, days to expiry
//! - **`curve`**: Size-weighted IV per (bucket, expiry, strike, side)
//! - **`bars`**: Underlying OHLC per bucket
//! - **`surface`**: Delaunay-based linear interpolation onto a shared grid
//! - **`frames`**: Chronological, labelled animation frames per view
//! - **`pipeline`**: All of the above behind one call
//! - **`present`** / **`export`**: Styling and flat output for renderers
//!
//! ## Design
//!
//! - **Lenient rows, strict schema.** A missing column is an error; a bad
//!   value only drops its row and bumps a counter in the stage's stats.
//! - **No panics.** Every fallible operation returns [`Result`]. Library code
//!   never calls `unwrap()` or `expect()`.
//! - **Deterministic.** Grouping uses ordered maps and ties resolve by input
//!   order, so the same tape always yields the same frames, with or without
//!   the `parallel` feature.
//! - **No extrapolation.** Grid nodes outside the convex hull of a bucket's
//!   out-of-the-money points stay undefined.
//! - **Serializable.** Every output type implements Serde `Serialize` /
//!   `Deserialize`.
//!
//! ## Example
//!
//! ```
//! use volsurf_frames::{Pipeline, View};
//!
//! let tape = "\
//! prtTimestamp,okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,prtIv,uPrc
//! 2023.12.01D14:31:00.000,2023,12,15,440,Put,1.10,5,0.18,445.0
//! ";
//! let out = Pipeline::default().run(tape.as_bytes())?;
//! assert_eq!(out.curve.len(), 1);
//! assert!(out.animation(View::Puts).is_none());
//! # Ok::<(), volsurf_frames::SurfaceError>(())
//! ```

pub mod bars;
pub mod config;
pub mod conventions;
pub mod curve;
pub mod error;
pub mod export;
pub mod filter;
pub mod frames;
pub mod ingest;
pub mod pipeline;
pub mod present;
pub mod surface;
pub mod types;
mod validate;

#[doc(inline)]
pub use config::PipelineConfig;
#[doc(inline)]
pub use error::{Result, SurfaceError};
#[doc(inline)]
pub use frames::{Animation, Frame};
#[doc(inline)]
pub use pipeline::{Pipeline, RunOutput};
#[doc(inline)]
pub use types::{OptionType, View};
