use crate::config::Settings;
use crate::error::ScanError;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Upstream provider of the raw scan grid. Pure read; no retries here, the
/// caller owns retry policy.
#[async_trait::async_trait]
pub trait ScanSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_raw_grid(&self) -> Result<Vec<Vec<String>>, ScanError>;
}

/// Reads a fixed range (default spans columns A-W) from the Google Sheets
/// `values` endpoint and returns it as ordered rows of cell strings.
#[derive(Debug, Clone)]
pub struct SheetsSource {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let spreadsheet_id = settings.require_scan_sheet_id()?.to_string();

        // A hung upstream must not block the cache layer indefinitely.
        let http = reqwest::Client::builder()
            .timeout(settings.sheets_timeout())
            .build()
            .context("failed to build sheets http client")?;

        Ok(Self {
            http,
            base_url: settings.sheets_base_url().to_string(),
            spreadsheet_id,
            range: settings.scan_range().to_string(),
            api_key: settings.sheets_api_key.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id,
            self.range
        )
    }
}

#[async_trait::async_trait]
impl ScanSource for SheetsSource {
    fn source_name(&self) -> &'static str {
        "google_sheets"
    }

    async fn fetch_raw_grid(&self) -> Result<Vec<Vec<String>>, ScanError> {
        let mut req = self.http.get(self.url());
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }

        let res = req
            .send()
            .await
            .map_err(|e| ScanError::SourceUnavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(ScanError::SourceUnavailable(format!(
                "sheets HTTP {status}"
            )));
        }

        let body: ValuesResponse = res
            .json()
            .await
            .map_err(|e| ScanError::SourceUnavailable(format!("invalid sheets payload: {e}")))?;

        if body.values.is_empty() {
            return Err(ScanError::SourceEmpty);
        }

        Ok(body.values.into_iter().map(row_to_cells).collect())
    }
}

fn row_to_cells(row: Vec<serde_json::Value>) -> Vec<String> {
    row.into_iter()
        .map(|cell| match cell {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_payload_parses_mixed_cell_types() {
        let v = json!({
            "range": "Scanner!A1:W200",
            "majorDimension": "ROWS",
            "values": [["CANSLIM Scan", "Last Scan: 2026-01-05 09:30"], [42, true, null]]
        });
        let parsed: ValuesResponse = serde_json::from_value(v).unwrap();
        let grid: Vec<Vec<String>> = parsed.values.into_iter().map(row_to_cells).collect();
        assert_eq!(grid[0][1], "Last Scan: 2026-01-05 09:30");
        assert_eq!(grid[1], vec!["42", "true", ""]);
    }

    #[test]
    fn missing_values_key_means_empty() {
        let parsed: ValuesResponse =
            serde_json::from_value(json!({"range": "Scanner!A1:W200"})).unwrap();
        assert!(parsed.values.is_empty());
    }
}
