//! Typed trade records and lenient field coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::conventions::shift_to_reference;
use crate::types::OptionType;

/// One observed options trade as read from the tape.
///
/// Every field that can fail coercion is an `Option`: `None` means "not
/// available" and the row is carried forward for the quality filter to
/// reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Event time on the reference clock (tape shift already applied).
    pub timestamp: Option<NaiveDateTime>,
    /// Underlying ticker, when the source carries one.
    pub ticker: Option<String>,
    /// Contract expiration date.
    pub expiration: Option<NaiveDate>,
    pub strike: Option<f64>,
    pub option_type: Option<OptionType>,
    /// Trade price.
    pub price: Option<f64>,
    /// Trade size (contracts).
    pub size: Option<f64>,
    /// Trade-implied volatility.
    pub iv: Option<f64>,
    pub underlying_bid: Option<f64>,
    pub underlying_ask: Option<f64>,
    /// Underlying last price at trade time.
    pub underlying: Option<f64>,
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y.%m.%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a tape timestamp and shift it onto the reference clock.
///
/// Accepts the kdb+ `2023.12.01D14:30:00.123456789` form (the `D` separator
/// is read as `T`), dash- or dot-separated dates with a `T` or space
/// separator, and RFC 3339 as a fallback.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim().replace('D', "T");
    if s.is_empty() {
        return None;
    }
    let parsed = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.naive_utc()))?;
    Some(shift_to_reference(parsed))
}

/// Coerce a numeric text field; blanks and garbage become `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Compose an expiration date from the tape's year / month / day fields.
///
/// Components may be written as floats (`2023.0`) by upstream exporters;
/// anything that isn't a whole number or a real calendar date yields `None`.
pub fn parse_expiration(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let component = |raw: &str| -> Option<u32> {
        let v = parse_number(raw)?;
        (v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX)).then_some(v as u32)
    };
    let y = i32::try_from(component(year)?).ok()?;
    NaiveDate::from_ymd_opt(y, component(month)?, component(day)?)
}
