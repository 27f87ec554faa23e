use serde::{Deserialize, Serialize};
use std::fmt;

/// Market condition reported on the regime row of the scan sheet.
///
/// The sheet carries this as a display string (often with emoji markers). We
/// classify it once at parse time and render the canonical label from the
/// enum; downstream consumers must not re-derive state from the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    ConfirmedUptrend,
    UptrendUnderPressure,
    RallyAttempt,
    Correction,
    Unknown,
}

impl MarketRegime {
    /// Case-insensitive substring classification. "pressure" is checked before
    /// "confirm" because "Confirmed Uptrend Under Pressure" variants exist in
    /// the wild.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("pressure") {
            MarketRegime::UptrendUnderPressure
        } else if lower.contains("confirm") {
            MarketRegime::ConfirmedUptrend
        } else if lower.contains("rally") {
            MarketRegime::RallyAttempt
        } else if lower.contains("correction") {
            MarketRegime::Correction
        } else {
            MarketRegime::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketRegime::ConfirmedUptrend => "Confirmed Uptrend",
            MarketRegime::UptrendUnderPressure => "Uptrend Under Pressure",
            MarketRegime::RallyAttempt => "Rally Attempt",
            MarketRegime::Correction => "Correction",
            MarketRegime::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
