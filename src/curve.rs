//! Volume-weighted curve aggregation.
//!
//! Trades sharing a (bucket, expiration, strike, option type, OTM flag) key
//! collapse into one curve point whose IV is the size-weighted mean of its
//! trades. Reference fields (DTE, underlying, moneyness) come from the
//! group's earliest trade, with input order breaking timestamp ties, so the
//! output never depends on iteration order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::CurveConfig;
use crate::filter::CleanedTrade;
use crate::types::OptionType;

/// One aggregated (bucket, expiration, strike, type, OTM) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub bucket: NaiveDateTime,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub is_otm: bool,
    /// Size-weighted mean IV.
    pub iv: f64,
    /// Total traded size.
    pub volume: f64,
    pub dte: i64,
    /// Underlying price of the group's earliest trade.
    pub underlying: f64,
    /// Moneyness of the group's earliest trade.
    pub moneyness: f64,
}

/// Aggregation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveStats {
    pub groups: usize,
    /// Dropped for summed size below the minimum.
    pub low_volume: usize,
    /// Dropped for a mean IV outside the sanity band.
    pub iv_band: usize,
    /// Dropped for a tenor beyond the horizon.
    pub beyond_horizon: usize,
    pub kept: usize,
}

/// Aggregated curve, ordered by key (bucket first).
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    pub points: Vec<CurvePoint>,
    pub stats: CurveStats,
}

impl CurveSet {
    /// Distinct buckets, ascending.
    pub fn buckets(&self) -> Vec<NaiveDateTime> {
        let mut out: Vec<NaiveDateTime> = self.points.iter().map(|p| p.bucket).collect();
        out.dedup();
        out
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Strike as a totally ordered key component.
#[derive(Debug, Clone, Copy)]
struct StrikeKey(f64);

impl PartialEq for StrikeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StrikeKey {}

impl PartialOrd for StrikeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrikeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CurveKey {
    bucket: NaiveDateTime,
    expiration: NaiveDate,
    strike: StrikeKey,
    option_type: OptionType,
    is_otm: bool,
}

#[derive(Debug)]
struct Accumulator {
    weighted_iv: f64,
    volume: f64,
    first_seen: NaiveDateTime,
    dte: i64,
    underlying: f64,
    moneyness: f64,
}

impl Accumulator {
    fn new(trade: &CleanedTrade) -> Self {
        Self {
            weighted_iv: 0.0,
            volume: 0.0,
            first_seen: trade.timestamp,
            dte: trade.dte,
            underlying: trade.underlying,
            moneyness: trade.moneyness,
        }
    }

    fn add(&mut self, trade: &CleanedTrade) {
        self.weighted_iv += trade.iv * trade.size;
        self.volume += trade.size;
        // Strictly earlier only: equal timestamps keep the first in input order.
        if trade.timestamp < self.first_seen {
            self.first_seen = trade.timestamp;
            self.dte = trade.dte;
            self.underlying = trade.underlying;
            self.moneyness = trade.moneyness;
        }
    }
}

/// Aggregate cleaned trades into curve points and apply the curve filter.
///
/// Weights are trade sizes, which the quality filter guarantees positive.
pub fn aggregate_curves(trades: &[CleanedTrade], config: &CurveConfig) -> CurveSet {
    let mut groups: BTreeMap<CurveKey, Accumulator> = BTreeMap::new();
    for trade in trades {
        let key = CurveKey {
            bucket: trade.bucket,
            expiration: trade.expiration,
            strike: StrikeKey(trade.strike),
            option_type: trade.option_type,
            is_otm: trade.is_otm,
        };
        groups
            .entry(key)
            .or_insert_with(|| Accumulator::new(trade))
            .add(trade);
    }

    let mut stats = CurveStats {
        groups: groups.len(),
        ..CurveStats::default()
    };
    let (iv_lo, iv_hi) = config.iv_band;
    let mut points = Vec::with_capacity(groups.len());
    for (key, acc) in groups {
        if acc.volume < config.min_volume {
            stats.low_volume += 1;
            continue;
        }
        let iv = acc.weighted_iv / acc.volume;
        if !(iv >= iv_lo && iv <= iv_hi) {
            stats.iv_band += 1;
            continue;
        }
        if acc.dte > config.max_dte {
            stats.beyond_horizon += 1;
            continue;
        }
        points.push(CurvePoint {
            bucket: key.bucket,
            expiration: key.expiration,
            strike: key.strike.0,
            option_type: key.option_type,
            is_otm: key.is_otm,
            iv,
            volume: acc.volume,
            dte: acc.dte,
            underlying: acc.underlying,
            moneyness: acc.moneyness,
        });
    }
    stats.kept = points.len();

    #[cfg(feature = "logging")]
    tracing::debug!(
        groups = stats.groups,
        kept = stats.kept,
        low_volume = stats.low_volume,
        iv_band = stats.iv_band,
        beyond_horizon = stats.beyond_horizon,
        "curve aggregated"
    );

    CurveSet { points, stats }
}
