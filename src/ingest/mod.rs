//! Trade-tape ingestion.
//!
//! Turns raw tabular rows into [`TradeRecord`]s: timestamps normalised onto
//! the reference clock, numeric fields coerced, expirations composed from
//! their year / month / day components. No row is rejected here for bad
//! values; that is the quality filter's job.

pub mod loader;
pub mod record;

pub use loader::{LoadStats, LoadedTrades, load_trades, load_trades_from_path};
pub use record::TradeRecord;
