//! Trade quality filter.
//!
//! Admits economically sane trades near the money, classifies them as in or
//! out of the money, assigns wall-clock buckets and derives days to
//! expiration relative to the session's first bucket.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::FilterConfig;
use crate::conventions::{bucket_floor, days_between, moneyness};
use crate::ingest::TradeRecord;
use crate::types::OptionType;

/// A trade that passed every quality check, with derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedTrade {
    pub timestamp: NaiveDateTime,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub price: f64,
    pub size: f64,
    pub iv: f64,
    pub underlying: f64,
    pub underlying_bid: Option<f64>,
    pub underlying_ask: Option<f64>,
    /// Strike over underlying.
    pub moneyness: f64,
    /// Strict OTM classification, see [`OptionType::is_otm`].
    pub is_otm: bool,
    /// Timestamp truncated to the bucket width.
    pub bucket: NaiveDateTime,
    /// Whole days from the session reference date to expiration (> 0).
    pub dte: i64,
}

/// Rejection counters, one per reason. A trade is counted once, under the
/// first check it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub input: usize,
    /// Strike, option type or another field the checks need was unavailable.
    pub missing_fields: usize,
    pub price: usize,
    pub size: usize,
    pub iv: usize,
    pub underlying: usize,
    pub moneyness: usize,
    /// No timestamp, so no bucket.
    pub no_timestamp: usize,
    /// No expiration date, so no tenor.
    pub no_expiration: usize,
    /// Expired or same-day contracts (DTE ≤ 0).
    pub expired: usize,
    pub kept: usize,
}

/// Admitted trades and the session they were measured against.
#[derive(Debug, Clone, Default)]
pub struct FilteredTrades {
    pub trades: Vec<CleanedTrade>,
    /// Midnight of the earliest bucket, `None` when nothing was admitted.
    pub reference_date: Option<NaiveDate>,
    pub stats: FilterStats,
}

/// Why a record fails admission.
enum Reject {
    MissingFields,
    Price,
    Size,
    Iv,
    Underlying,
    Moneyness,
}

struct Admitted<'a> {
    record: &'a TradeRecord,
    strike: f64,
    option_type: OptionType,
    price: f64,
    size: f64,
    iv: f64,
    underlying: f64,
    moneyness: f64,
}

fn admit<'a>(record: &'a TradeRecord, config: &FilterConfig) -> Result<Admitted<'a>, Reject> {
    let price = record.price.ok_or(Reject::Price)?;
    if price < config.min_price {
        return Err(Reject::Price);
    }
    let size = record.size.ok_or(Reject::Size)?;
    if size <= 0.0 {
        return Err(Reject::Size);
    }
    let iv = record.iv.ok_or(Reject::Iv)?;
    let (iv_lo, iv_hi) = config.trade_iv_band;
    if !(iv > iv_lo && iv < iv_hi) {
        return Err(Reject::Iv);
    }
    let underlying = record.underlying.ok_or(Reject::Underlying)?;
    if underlying <= 0.0 {
        return Err(Reject::Underlying);
    }

    let strike = record.strike.ok_or(Reject::MissingFields)?;
    let option_type = record.option_type.ok_or(Reject::MissingFields)?;
    let m = moneyness(strike, underlying);
    let (m_lo, m_hi) = config.moneyness_band;
    if !(m >= m_lo && m <= m_hi) {
        return Err(Reject::Moneyness);
    }

    Ok(Admitted {
        record,
        strike,
        option_type,
        price,
        size,
        iv,
        underlying,
        moneyness: m,
    })
}

/// Run the quality filter over loaded records.
///
/// The reference date is taken from the admitted trades that have a bucket,
/// before expired contracts are removed, so it always marks the session's
/// first active bucket.
pub fn filter_trades(records: &[TradeRecord], config: &FilterConfig) -> FilteredTrades {
    let mut stats = FilterStats {
        input: records.len(),
        ..FilterStats::default()
    };

    let mut bucketed: Vec<(Admitted<'_>, NaiveDateTime, NaiveDateTime)> = Vec::new();
    for record in records {
        let admitted = match admit(record, config) {
            Ok(a) => a,
            Err(reason) => {
                match reason {
                    Reject::MissingFields => stats.missing_fields += 1,
                    Reject::Price => stats.price += 1,
                    Reject::Size => stats.size += 1,
                    Reject::Iv => stats.iv += 1,
                    Reject::Underlying => stats.underlying += 1,
                    Reject::Moneyness => stats.moneyness += 1,
                }
                continue;
            }
        };
        let Some((ts, bucket)) = admitted
            .record
            .timestamp
            .and_then(|ts| bucket_floor(ts, config.bucket_seconds).map(|b| (ts, b)))
        else {
            stats.no_timestamp += 1;
            continue;
        };
        bucketed.push((admitted, ts, bucket));
    }

    let reference_date = bucketed.iter().map(|(_, _, b)| *b).min().map(|b| b.date());

    let mut trades = Vec::with_capacity(bucketed.len());
    if let Some(reference) = reference_date {
        for (a, timestamp, bucket) in bucketed {
            let Some(expiration) = a.record.expiration else {
                stats.no_expiration += 1;
                continue;
            };
            let dte = days_between(reference, expiration);
            if dte <= 0 {
                stats.expired += 1;
                continue;
            }
            trades.push(CleanedTrade {
                timestamp,
                expiration,
                strike: a.strike,
                option_type: a.option_type,
                price: a.price,
                size: a.size,
                iv: a.iv,
                underlying: a.underlying,
                underlying_bid: a.record.underlying_bid,
                underlying_ask: a.record.underlying_ask,
                moneyness: a.moneyness,
                is_otm: a.option_type.is_otm(a.strike, a.underlying),
                bucket,
                dte,
            });
        }
    }
    stats.kept = trades.len();

    #[cfg(feature = "logging")]
    tracing::debug!(
        input = stats.input,
        kept = stats.kept,
        rejected_price = stats.price,
        rejected_iv = stats.iv,
        rejected_moneyness = stats.moneyness,
        expired = stats.expired,
        reference_date = ?reference_date,
        "quality filter applied"
    );

    FilteredTrades {
        trades,
        reference_date,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn record(time: &str, strike: f64, cp: OptionType, iv: f64, size: f64) -> TradeRecord {
        TradeRecord {
            timestamp: Some(ts(time)),
            ticker: Some("SPY".into()),
            expiration: NaiveDate::from_ymd_opt(2023, 12, 15),
            strike: Some(strike),
            option_type: Some(cp),
            price: Some(1.25),
            size: Some(size),
            iv: Some(iv),
            underlying_bid: Some(444.9),
            underlying_ask: Some(445.1),
            underlying: Some(445.0),
        }
    }

    fn run(records: &[TradeRecord]) -> FilteredTrades {
        filter_trades(records, &FilterConfig::default())
    }

    #[test]
    fn clean_trade_gets_derived_fields() {
        let out = run(&[record("2023-12-01 09:32:41", 440.0, OptionType::Put, 0.18, 5.0)]);
        assert_eq!(out.trades.len(), 1);
        let t = &out.trades[0];
        assert_eq!(t.bucket, ts("2023-12-01 09:30:00"));
        assert_eq!(t.dte, 14);
        assert!(t.is_otm);
        assert!((t.moneyness - 440.0 / 445.0).abs() < 1e-12);
        assert_eq!(out.reference_date, NaiveDate::from_ymd_opt(2023, 12, 1));
    }

    #[test]
    fn price_boundary_is_inclusive() {
        let mut cheap = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.18, 5.0);
        cheap.price = Some(0.05);
        let mut cheaper = cheap.clone();
        cheaper.price = Some(0.049);
        let out = run(&[cheap, cheaper]);
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.stats.price, 1);
    }

    #[test]
    fn iv_band_is_exclusive() {
        let rows = [
            record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.02, 5.0),
            record("2023-12-01 09:31:00", 440.0, OptionType::Put, 1.0, 5.0),
            record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.021, 5.0),
        ];
        let out = run(&rows);
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.stats.iv, 2);
    }

    #[test]
    fn zero_size_and_zero_underlying_rejected() {
        let zero_size = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 0.0);
        let mut no_spot = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        no_spot.underlying = Some(0.0);
        let out = run(&[zero_size, no_spot]);
        assert!(out.trades.is_empty());
        assert_eq!(out.stats.size, 1);
        assert_eq!(out.stats.underlying, 1);
        assert_eq!(out.reference_date, None);
    }

    #[test]
    fn moneyness_band_is_inclusive() {
        // 356 / 445 = 0.8 exactly, 534 / 445 = 1.2 exactly
        let rows = [
            record("2023-12-01 09:31:00", 356.0, OptionType::Put, 0.2, 1.0),
            record("2023-12-01 09:31:00", 534.0, OptionType::Call, 0.2, 1.0),
            record("2023-12-01 09:31:00", 300.0, OptionType::Put, 0.2, 1.0),
            record("2023-12-01 09:31:00", 600.0, OptionType::Call, 0.2, 1.0),
        ];
        let out = run(&rows);
        assert_eq!(out.trades.len(), 2);
        assert_eq!(out.stats.moneyness, 2);
    }

    #[test]
    fn atm_trades_are_not_otm() {
        let rows = [
            record("2023-12-01 09:31:00", 445.0, OptionType::Put, 0.2, 1.0),
            record("2023-12-01 09:31:00", 445.0, OptionType::Call, 0.2, 1.0),
        ];
        let out = run(&rows);
        assert_eq!(out.trades.len(), 2);
        assert!(out.trades.iter().all(|t| !t.is_otm));
    }

    #[test]
    fn same_day_expiry_dropped() {
        let mut zero_dte = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        zero_dte.expiration = NaiveDate::from_ymd_opt(2023, 12, 1);
        let kept = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        let out = run(&[zero_dte, kept]);
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.stats.expired, 1);
    }

    #[test]
    fn reference_date_is_earliest_bucket_midnight() {
        // Late-evening trade on the previous day sets the reference.
        let early = record("2023-11-30 23:58:00", 440.0, OptionType::Put, 0.2, 1.0);
        let late = record("2023-12-01 10:00:00", 440.0, OptionType::Put, 0.2, 1.0);
        let out = run(&[late, early]);
        assert_eq!(out.reference_date, NaiveDate::from_ymd_opt(2023, 11, 30));
        assert!(out.trades.iter().all(|t| t.dte == 15));
    }

    #[test]
    fn unavailable_fields_are_counted() {
        let mut no_ts = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        no_ts.timestamp = None;
        let mut no_exp = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        no_exp.expiration = None;
        let mut no_cp = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        no_cp.option_type = None;
        let mut no_iv = record("2023-12-01 09:31:00", 440.0, OptionType::Put, 0.2, 1.0);
        no_iv.iv = None;
        let out = run(&[no_ts, no_exp, no_cp, no_iv]);
        assert!(out.trades.is_empty());
        assert_eq!(out.stats.no_timestamp, 1);
        assert_eq!(out.stats.no_expiration, 1);
        assert_eq!(out.stats.missing_fields, 1);
        assert_eq!(out.stats.iv, 1);
    }
}
