use crate::domain::regime::MarketRegime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One parsed snapshot of scanner output. `scan_time` is the identity used
/// for history deduplication and is carried verbatim as the source reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub title: String,
    pub scan_time: String,
    pub regime: MarketRegime,
    pub dist_days: String,
    pub buy_ok: String,
    pub account_balance: Option<f64>,
    pub risk_per_trade: Option<f64>,
    pub actionable_count: Option<i64>,
    /// Auxiliary key/value pairs (includes the raw regime text under
    /// `regime_raw`). Forward-compatible; consumers must tolerate extra keys.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Column names in sheet order. Callers iterate these rather than
    /// assuming a fixed schema.
    pub headers: Vec<String>,
    pub stocks: Vec<StockRow>,
}

/// One candidate instrument within a scan, keyed by the header row. The
/// parser guarantees the key set matches `headers`; the annotator may add
/// derived columns (Score, Shares, Cost) to both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockRow {
    pub cells: BTreeMap<String, String>,
}

impl StockRow {
    pub fn get(&self, key: &str) -> &str {
        self.cells.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.cells.insert(key.to_string(), value);
    }

    pub fn ticker(&self) -> &str {
        self.get("Ticker")
    }

    /// Lenient numeric read: tolerates `$`, thousands separators, `%` and
    /// surrounding whitespace. Returns None for empty or non-finite values.
    pub fn number(&self, key: &str) -> Option<f64> {
        parse_number(self.get(key))
    }

    /// First key out of `keys` that yields a number. Sheets are inconsistent
    /// about e.g. "RS" vs "RS Rating".
    pub fn number_any(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Listing entry for the history API; cheap projection of a stored snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub scan_time: String,
    pub regime: MarketRegime,
    pub actionable_count: Option<i64>,
    pub stock_count: usize,
}

impl SnapshotSummary {
    pub fn of(record: &ScanRecord) -> Self {
        Self {
            scan_time: record.scan_time.clone(),
            regime: record.regime,
            actionable_count: record.actionable_count,
            stock_count: record.stocks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_numbers() {
        assert_eq!(parse_number("$1,234.50"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("1.5%"), Some(1.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn row_number_any_tries_aliases_in_order() {
        let mut row = StockRow::default();
        row.set("RS Rating", "95".to_string());
        assert_eq!(row.number_any(&["RS", "RS Rating"]), Some(95.0));
        assert_eq!(row.number_any(&["Comp", "Comp Rating"]), None);
    }
}
