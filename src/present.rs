//! Styling handed to renderers.
//!
//! Rendering itself lives outside this crate; a [`Theme`] is passed in
//! explicitly so two renderers can style the same run differently.

use serde::{Deserialize, Serialize};

use crate::types::{OptionType, View};

/// Look of one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStyle {
    /// Short label used in file names (`both`, `puts`, `calls`).
    pub label: String,
    pub title: String,
    /// Named colorscale for the surface.
    pub colorscale: String,
    /// Marker colour for single-side scatter; `None` colours by option type.
    pub scatter_color: Option<String>,
}

/// Complete styling for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub combined: ViewStyle,
    pub puts: ViewStyle,
    pub calls: ViewStyle,
    pub put_color: String,
    pub call_color: String,
    /// Colour of the at-the-money marker line.
    pub atm_color: String,
    pub candle_up: String,
    pub candle_down: String,
}

impl Default for Theme {
    fn default() -> Self {
        let style = |view: View, title: &str, colorscale: &str, scatter: Option<&str>| ViewStyle {
            label: view.as_str().to_string(),
            title: title.to_string(),
            colorscale: colorscale.to_string(),
            scatter_color: scatter.map(str::to_string),
        };
        Self {
            combined: style(View::Combined, "Puts & Calls", "Viridis", None),
            puts: style(View::Puts, "Put Options", "Reds", Some("red")),
            calls: style(View::Calls, "Call Options", "Blues", Some("blue")),
            put_color: "red".into(),
            call_color: "blue".into(),
            atm_color: "limegreen".into(),
            candle_up: "#26a69a".into(),
            candle_down: "#ef5350".into(),
        }
    }
}

impl Theme {
    pub fn style(&self, view: View) -> &ViewStyle {
        match view {
            View::Combined => &self.combined,
            View::Puts => &self.puts,
            View::Calls => &self.calls,
        }
    }

    /// Marker colour for a scatter point of `option_type` drawn in `view`.
    pub fn marker_color(&self, view: View, option_type: OptionType) -> &str {
        if let Some(c) = self.style(view).scatter_color.as_deref() {
            return c;
        }
        match option_type {
            OptionType::Put => &self.put_color,
            OptionType::Call => &self.call_color,
        }
    }

    /// Candle colour for a bar closing at `close` after opening at `open`.
    pub fn candle_color(&self, open: f64, close: f64) -> &str {
        if close >= open {
            &self.candle_up
        } else {
            &self.candle_down
        }
    }
}
