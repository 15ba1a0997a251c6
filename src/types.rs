//! Core domain enums shared by every pipeline stage.
//!
//! Prices, strikes and vols stay bare `f64` here: every value that crosses a
//! stage boundary lives in a named struct field, so a newtype per quantity
//! would add ceremony without catching anything the field names don't.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Option type: call or put.
///
/// Ordered (`Call < Put`) so it can participate in composite grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionType {
    /// Whether a contract of this type is out of the money.
    ///
    /// Strict on both sides: a strike equal to the underlying is OTM for
    /// neither calls nor puts.
    ///
    /// # Examples
    /// ```
    /// use volsurf_frames::OptionType;
    /// assert!(OptionType::Put.is_otm(440.0, 445.0));
    /// assert!(!OptionType::Put.is_otm(445.0, 445.0));
    /// assert!(!OptionType::Call.is_otm(445.0, 445.0));
    /// ```
    pub fn is_otm(self, strike: f64, underlying: f64) -> bool {
        match self {
            OptionType::Put => strike < underlying,
            OptionType::Call => strike > underlying,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => f.write_str("Call"),
            OptionType::Put => f.write_str("Put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = ();

    /// Accepts the tape codes `Call`/`Put` (any case) and `C`/`P`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("call") || s.eq_ignore_ascii_case("c") {
            Ok(OptionType::Call)
        } else if s.eq_ignore_ascii_case("put") || s.eq_ignore_ascii_case("p") {
            Ok(OptionType::Put)
        } else {
            Err(())
        }
    }
}

/// Which side(s) of the curve a surface is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Call rows only.
    Calls,
    /// Put rows only.
    Puts,
    /// Both sides together.
    #[serde(rename = "both")]
    Combined,
}

impl View {
    /// All views, in the order a run produces them.
    pub const ALL: [View; 3] = [View::Combined, View::Puts, View::Calls];

    /// Whether rows of `option_type` belong to this view.
    pub fn includes(self, option_type: OptionType) -> bool {
        match self {
            View::Calls => option_type == OptionType::Call,
            View::Puts => option_type == OptionType::Put,
            View::Combined => true,
        }
    }

    /// Short machine-friendly name, used in file names, logs and serde.
    pub fn as_str(self) -> &'static str {
        match self {
            View::Calls => "calls",
            View::Puts => "puts",
            View::Combined => "both",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tape_codes() {
        assert_eq!("Call".parse(), Ok(OptionType::Call));
        assert_eq!("put".parse(), Ok(OptionType::Put));
        assert_eq!(" P ".parse(), Ok(OptionType::Put));
        assert_eq!("c".parse(), Ok(OptionType::Call));
        assert!("Straddle".parse::<OptionType>().is_err());
        assert!("".parse::<OptionType>().is_err());
    }

    #[test]
    fn atm_is_otm_for_neither_side() {
        assert!(!OptionType::Call.is_otm(100.0, 100.0));
        assert!(!OptionType::Put.is_otm(100.0, 100.0));
        assert!(OptionType::Call.is_otm(101.0, 100.0));
        assert!(!OptionType::Call.is_otm(99.0, 100.0));
        assert!(OptionType::Put.is_otm(99.0, 100.0));
    }

    #[test]
    fn view_membership() {
        assert!(View::Combined.includes(OptionType::Call));
        assert!(View::Combined.includes(OptionType::Put));
        assert!(View::Calls.includes(OptionType::Call));
        assert!(!View::Calls.includes(OptionType::Put));
        assert!(!View::Puts.includes(OptionType::Call));
    }

    #[test]
    fn view_serde_name_matches_as_str() {
        for view in View::ALL {
            let json = serde_json::to_string(&view).unwrap();
            assert_eq!(json, format!("\"{}\"", view.as_str()));
            let back: View = serde_json::from_str(&json).unwrap();
            assert_eq!(back, view);
        }
        assert_eq!(serde_json::to_string(&View::Combined).unwrap(), "\"both\"");
    }
}
