//! Flat tabular and JSON export of a run.
//!
//! CSV writers take any `io::Write`; IV in frame tables is in percent and an
//! undefined node is written as an empty field.

use std::io::Write;

use serde::Serialize;

use crate::bars::PriceBar;
use crate::curve::CurvePoint;
use crate::error::Result;
use crate::frames::Animation;
use crate::pipeline::RunOutput;
use crate::types::OptionType;

#[derive(Serialize)]
struct CurveRow {
    bucket: String,
    expiration: String,
    strike: f64,
    option_type: OptionType,
    is_otm: bool,
    iv: f64,
    volume: f64,
    dte: i64,
    underlying: f64,
    moneyness: f64,
}

#[derive(Serialize)]
struct FrameRow<'a> {
    view: &'a str,
    label: &'a str,
    strike: f64,
    dte: f64,
    iv_pct: Option<f64>,
}

/// Write the curve as CSV, one row per point.
///
/// # Errors
/// Returns [`SurfaceError::Csv`](crate::SurfaceError::Csv) on write failure.
pub fn write_curve_csv<W: Write>(writer: W, curve: &[CurvePoint]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for p in curve {
        wtr.serialize(CurveRow {
            bucket: p.bucket.format("%Y-%m-%d %H:%M:%S").to_string(),
            expiration: p.expiration.format("%Y-%m-%d").to_string(),
            strike: p.strike,
            option_type: p.option_type,
            is_otm: p.is_otm,
            iv: p.iv,
            volume: p.volume,
            dte: p.dte,
            underlying: p.underlying,
            moneyness: p.moneyness,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write OHLC bars as CSV.
///
/// # Errors
/// Returns [`SurfaceError::Csv`](crate::SurfaceError::Csv) on write failure.
pub fn write_bars_csv<W: Write>(writer: W, bars: &[PriceBar]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["bucket", "open", "high", "low", "close", "trades"])?;
    for b in bars {
        wtr.write_record([
            b.bucket.format("%Y-%m-%d %H:%M:%S").to_string(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            b.trades.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every grid node of every frame in long format
/// (`view, label, strike, dte, iv_pct`).
///
/// Frames without a surface contribute no rows.
///
/// # Errors
/// Returns [`SurfaceError::Csv`](crate::SurfaceError::Csv) on write failure.
pub fn write_frames_csv<W: Write>(writer: W, animations: &[&Animation]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    let mut wrote_any = false;
    for anim in animations {
        let view = anim.view.as_str();
        for frame in &anim.frames {
            let Some(surface) = &frame.snapshot.surface else {
                continue;
            };
            for (ti, &dte) in anim.grid.tenors.iter().enumerate() {
                for (ki, &strike) in anim.grid.strikes.iter().enumerate() {
                    wtr.serialize(FrameRow {
                        view,
                        label: &frame.label,
                        strike,
                        dte,
                        iv_pct: surface.get(ti, ki),
                    })?;
                    wrote_any = true;
                }
            }
        }
    }
    if !wrote_any {
        wtr.write_record(["view", "label", "strike", "dte", "iv_pct"])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the whole run as one pretty-printed JSON document.
///
/// # Errors
/// Returns [`SurfaceError::Json`](crate::SurfaceError::Json) on failure.
pub fn write_run_json<W: Write>(writer: W, run: &RunOutput) -> Result<()> {
    serde_json::to_writer_pretty(writer, run)?;
    Ok(())
}
