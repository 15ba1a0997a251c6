//! Underlying OHLC bars per bucket.
//!
//! Built from the cleaned trade set so the price panel covers exactly the
//! buckets the surfaces are drawn from.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::filter::CleanedTrade;

/// Open / high / low / close of the underlying within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub bucket: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Trades observed in the bucket.
    pub trades: usize,
}

/// Build one bar per bucket, ascending.
///
/// Open and close follow trade timestamps; trades with equal timestamps
/// keep their input order.
pub fn price_bars(trades: &[CleanedTrade]) -> Vec<PriceBar> {
    let mut ordered: Vec<&CleanedTrade> = trades.iter().collect();
    // Stable: ties stay in input order.
    ordered.sort_by_key(|t| t.timestamp);

    let mut bars: BTreeMap<NaiveDateTime, PriceBar> = BTreeMap::new();
    for t in ordered {
        let px = t.underlying;
        bars.entry(t.bucket)
            .and_modify(|bar| {
                bar.high = bar.high.max(px);
                bar.low = bar.low.min(px);
                bar.close = px;
                bar.trades += 1;
            })
            .or_insert(PriceBar {
                bucket: t.bucket,
                open: px,
                high: px,
                low: px,
                close: px,
                trades: 1,
            });
    }
    bars.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::types::OptionType;

    fn trade(time: &str, underlying: f64) -> CleanedTrade {
        let timestamp = NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S").unwrap();
        CleanedTrade {
            timestamp,
            expiration: NaiveDate::from_ymd_opt(2023, 12, 15).unwrap(),
            strike: 440.0,
            option_type: OptionType::Put,
            price: 1.0,
            size: 1.0,
            iv: 0.2,
            underlying,
            underlying_bid: None,
            underlying_ask: None,
            moneyness: 440.0 / underlying,
            is_otm: true,
            bucket: crate::conventions::bucket_floor(timestamp, 300).unwrap(),
            dte: 14,
        }
    }

    #[test]
    fn ohlc_per_bucket() {
        let trades = [
            trade("2023-12-01 09:31:00", 445.0),
            trade("2023-12-01 09:32:00", 447.0),
            trade("2023-12-01 09:33:00", 443.5),
            trade("2023-12-01 09:34:00", 444.0),
            trade("2023-12-01 09:36:00", 444.2),
        ];
        let bars = price_bars(&trades);
        assert_eq!(bars.len(), 2);
        let b = bars[0];
        assert_eq!((b.open, b.high, b.low, b.close), (445.0, 447.0, 443.5, 444.0));
        assert_eq!(b.trades, 4);
        assert_eq!(bars[1].open, 444.2);
        assert_eq!(bars[1].close, 444.2);
    }

    #[test]
    fn open_and_close_follow_time_not_input_order() {
        let trades = [
            trade("2023-12-01 09:34:00", 444.0),
            trade("2023-12-01 09:31:00", 445.0),
        ];
        let bars = price_bars(&trades);
        assert_eq!(bars[0].open, 445.0);
        assert_eq!(bars[0].close, 444.0);
    }

    #[test]
    fn empty_input_has_no_bars() {
        assert!(price_bars(&[]).is_empty());
    }
}
