//! CSV trade-tape loader.
//!
//! Column lookup happens once against the header; each row is then coerced
//! field by field. Only a missing required column aborts the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;
use crate::error::{Result, SurfaceError};
use crate::ingest::record::{TradeRecord, parse_expiration, parse_number, parse_timestamp};

/// Preferred and fallback timestamp column names.
const TIMESTAMP_COLUMNS: [&str; 2] = ["timestamp", "prtTimestamp"];
const TICKER_COLUMN: &str = "ticker_tk";

/// Counters describing what the loader saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Data rows read from the source.
    pub rows_read: usize,
    /// Rows dropped because their ticker didn't match.
    pub other_ticker: usize,
    /// Kept rows whose timestamp could not be parsed.
    pub bad_timestamp: usize,
    /// Kept rows whose expiration components were malformed.
    pub bad_expiration: usize,
    /// Kept rows with an unrecognised option type code.
    pub bad_option_type: usize,
    /// Rows with fewer fields than the header; missing trailing fields are
    /// read as unavailable.
    pub short_rows: usize,
}

/// Records produced by the loader, plus what happened along the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedTrades {
    pub records: Vec<TradeRecord>,
    pub stats: LoadStats,
}

/// Header positions of every column the loader reads.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    timestamp: usize,
    ticker: Option<usize>,
    year: usize,
    month: usize,
    day: usize,
    strike: usize,
    option_type: usize,
    price: usize,
    size: usize,
    iv: usize,
    bid: Option<usize>,
    ask: Option<usize>,
    underlying: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| SurfaceError::MissingColumn {
                column: name.to_string(),
            })
        };

        let timestamp = TIMESTAMP_COLUMNS
            .iter()
            .find_map(|name| find(name))
            .ok_or_else(|| SurfaceError::MissingColumn {
                column: TIMESTAMP_COLUMNS.join(" | "),
            })?;

        Ok(Self {
            timestamp,
            ticker: find(TICKER_COLUMN),
            year: require("okey_yr")?,
            month: require("okey_mn")?,
            day: require("okey_dy")?,
            strike: require("okey_xx")?,
            option_type: require("okey_cp")?,
            price: require("prtPrice")?,
            size: require("prtSize")?,
            iv: require("prtIv")?,
            bid: find("uBid"),
            ask: find("uAsk"),
            underlying: require("uPrc")?,
        })
    }
}

/// Load trade records from any CSV source.
///
/// # Errors
/// Returns [`SurfaceError::MissingColumn`] when a required column is absent
/// and [`SurfaceError::Csv`] for an unreadable source. Short rows and
/// unparseable field values are never errors.
///
/// # Examples
/// ```
/// use volsurf_frames::config::LoaderConfig;
/// use volsurf_frames::ingest::load_trades;
///
/// let csv = "\
/// prtTimestamp,ticker_tk,okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,prtIv,uBid,uAsk,uPrc
/// 2023.12.01D14:31:00.000,SPY,2023,12,15,440,Put,1.10,5,0.18,444.9,445.1,445.0
/// 2023.12.01D14:31:02.000,QQQ,2023,12,15,380,Put,1.20,5,0.21,384.9,385.1,385.0
/// ";
/// let loaded = load_trades(csv.as_bytes(), &LoaderConfig::default())?;
/// assert_eq!(loaded.records.len(), 1);
/// assert_eq!(loaded.stats.other_ticker, 1);
/// # Ok::<(), volsurf_frames::SurfaceError>(())
/// ```
pub fn load_trades<R: Read>(source: R, config: &LoaderConfig) -> Result<LoadedTrades> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = rdr.headers()?.clone();
    let cols = ColumnMap::from_headers(&headers)?;

    let mut out = LoadedTrades::default();
    let mut row = StringRecord::new();
    while rdr.read_record(&mut row)? {
        out.stats.rows_read += 1;
        if row.len() < headers.len() {
            out.stats.short_rows += 1;
        }
        let field = |idx: usize| row.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| idx.and_then(|i| parse_number(field(i)));

        let ticker = cols.ticker.map(|i| field(i).trim().to_string());
        if let (Some(wanted), Some(have)) = (config.ticker.as_deref(), ticker.as_deref())
            && have != wanted
        {
            out.stats.other_ticker += 1;
            continue;
        }

        let record = TradeRecord {
            timestamp: parse_timestamp(field(cols.timestamp)),
            ticker,
            expiration: parse_expiration(field(cols.year), field(cols.month), field(cols.day)),
            strike: parse_number(field(cols.strike)),
            option_type: field(cols.option_type).parse().ok(),
            price: parse_number(field(cols.price)),
            size: parse_number(field(cols.size)),
            iv: parse_number(field(cols.iv)),
            underlying_bid: optional(cols.bid),
            underlying_ask: optional(cols.ask),
            underlying: parse_number(field(cols.underlying)),
        };

        if record.timestamp.is_none() {
            out.stats.bad_timestamp += 1;
        }
        if record.expiration.is_none() {
            out.stats.bad_expiration += 1;
        }
        if record.option_type.is_none() {
            out.stats.bad_option_type += 1;
        }
        out.records.push(record);
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        rows_read = out.stats.rows_read,
        kept = out.records.len(),
        other_ticker = out.stats.other_ticker,
        bad_timestamp = out.stats.bad_timestamp,
        bad_expiration = out.stats.bad_expiration,
        short_rows = out.stats.short_rows,
        "trade tape loaded"
    );

    Ok(out)
}

/// Load trade records from a CSV file on disk.
///
/// # Errors
/// As [`load_trades`], plus [`SurfaceError::Io`] if the file can't be opened.
pub fn load_trades_from_path(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<LoadedTrades> {
    let file = File::open(path.as_ref())?;
    load_trades(file, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::types::OptionType;

    const HEADER: &str =
        "prtTimestamp,ticker_tk,okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,prtIv,uBid,uAsk,uPrc";

    fn load(body: &str) -> Result<LoadedTrades> {
        load_trades(format!("{HEADER}\n{body}").as_bytes(), &LoaderConfig::default())
    }

    #[test]
    fn parses_a_full_row() {
        let loaded = load("2023.12.01D14:31:00.000,SPY,2023,12,15,440,Put,1.10,5,0.18,444.9,445.1,445.0\n")
            .unwrap();
        assert_eq!(loaded.records.len(), 1);
        let r = &loaded.records[0];
        assert_eq!(
            r.timestamp.map(|t| t.format("%H:%M").to_string()).as_deref(),
            Some("09:31")
        );
        assert_eq!(r.expiration, NaiveDate::from_ymd_opt(2023, 12, 15));
        assert_eq!(r.strike, Some(440.0));
        assert_eq!(r.option_type, Some(OptionType::Put));
        assert_eq!(r.size, Some(5.0));
        assert_eq!(r.iv, Some(0.18));
        assert_eq!(r.underlying_bid, Some(444.9));
        assert_eq!(r.underlying, Some(445.0));
    }

    #[test]
    fn bad_values_are_carried_as_unavailable() {
        let loaded = load("garbage,SPY,2023,02,30,abc,Straddle,,5,x,,,445.0\n").unwrap();
        assert_eq!(loaded.records.len(), 1);
        let r = &loaded.records[0];
        assert_eq!(r.timestamp, None);
        assert_eq!(r.expiration, None);
        assert_eq!(r.strike, None);
        assert_eq!(r.option_type, None);
        assert_eq!(r.price, None);
        assert_eq!(r.iv, None);
        assert_eq!(loaded.stats.bad_timestamp, 1);
        assert_eq!(loaded.stats.bad_expiration, 1);
        assert_eq!(loaded.stats.bad_option_type, 1);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "prtTimestamp,okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,uPrc\n";
        match load_trades(csv.as_bytes(), &LoaderConfig::default()) {
            Err(SurfaceError::MissingColumn { column }) => assert_eq!(column, "prtIv"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn missing_timestamp_column_is_fatal() {
        let csv = "okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,prtIv,uPrc\n";
        assert!(matches!(
            load_trades(csv.as_bytes(), &LoaderConfig::default()),
            Err(SurfaceError::MissingColumn { .. })
        ));
    }

    #[test]
    fn timestamp_column_preferred_over_prt_timestamp() {
        let csv = "\
timestamp,prtTimestamp,okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,prtIv,uPrc
2023-12-01T15:00:00,2023.12.01D14:00:00,2023,12,15,440,Call,1,1,0.2,445
";
        let loaded = load_trades(csv.as_bytes(), &LoaderConfig::default()).unwrap();
        let hour = loaded.records[0].timestamp.map(|t| t.format("%H").to_string());
        assert_eq!(hour.as_deref(), Some("10"));
    }

    #[test]
    fn without_ticker_column_every_row_is_kept() {
        let csv = "\
prtTimestamp,okey_yr,okey_mn,okey_dy,okey_xx,okey_cp,prtPrice,prtSize,prtIv,uPrc,extra
2023.12.01D14:31:00,2023,12,15,440,Put,1.1,5,0.18,445,ignored
";
        let loaded = load_trades(csv.as_bytes(), &LoaderConfig::default()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].ticker, None);
        assert_eq!(loaded.records[0].underlying_bid, None);
    }

    #[test]
    fn ticker_restriction_can_be_disabled() {
        let cfg = LoaderConfig { ticker: None };
        let body = "\
2023.12.01D14:31:00,SPY,2023,12,15,440,Put,1.1,5,0.18,444.9,445.1,445
2023.12.01D14:31:00,QQQ,2023,12,15,380,Put,1.1,5,0.18,384.9,385.1,385
";
        let loaded = load_trades(format!("{HEADER}\n{body}").as_bytes(), &cfg).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.stats.other_ticker, 0);
    }

    #[test]
    fn short_row_is_carried_forward() {
        let body = "\
2023.12.01D14:31:00.000,SPY,2023,12,15,440,Put,1.10,5,0.18,444.9,445.1,445.0
2023.12.01D14:31:00.000,SPY,2023,12,15,440,Put,1.5,4
";
        let loaded = load(body).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.stats.short_rows, 1);
        let r = &loaded.records[1];
        assert_eq!(r.size, Some(4.0));
        assert_eq!(r.iv, None);
        assert_eq!(r.underlying_bid, None);
        assert_eq!(r.underlying, None);
        assert_eq!(loaded.records[0].underlying, Some(445.0));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_trades_from_path("/definitely/not/here.csv", &LoaderConfig::default());
        assert!(matches!(result, Err(SurfaceError::Io(_))));
    }
}
