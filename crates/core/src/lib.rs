pub mod cache;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod sizing;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
    const DEFAULT_SCAN_RANGE: &str = "Scanner!A1:W200";
    const DEFAULT_CACHE_TTL_SECS: i64 = 300;
    const DEFAULT_SHEETS_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sheets_base_url: Option<String>,
        pub scan_sheet_id: Option<String>,
        pub sheets_api_key: Option<String>,
        pub scan_range: Option<String>,
        pub sheets_timeout_secs: Option<u64>,
        pub data_dir: Option<String>,
        pub cache_ttl_secs: Option<i64>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sheets_base_url: std::env::var("SHEETS_BASE_URL").ok(),
                scan_sheet_id: std::env::var("SCAN_SHEET_ID").ok(),
                sheets_api_key: std::env::var("SHEETS_API_KEY").ok(),
                scan_range: std::env::var("SCAN_RANGE").ok(),
                sheets_timeout_secs: std::env::var("SHEETS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                data_dir: std::env::var("DATA_DIR").ok(),
                cache_ttl_secs: std::env::var("SCAN_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_scan_sheet_id(&self) -> anyhow::Result<&str> {
            self.scan_sheet_id
                .as_deref()
                .context("SCAN_SHEET_ID is required")
        }

        pub fn sheets_base_url(&self) -> &str {
            self.sheets_base_url
                .as_deref()
                .unwrap_or(DEFAULT_SHEETS_BASE_URL)
        }

        pub fn scan_range(&self) -> &str {
            self.scan_range.as_deref().unwrap_or(DEFAULT_SCAN_RANGE)
        }

        pub fn data_dir(&self) -> PathBuf {
            PathBuf::from(self.data_dir.as_deref().unwrap_or("data"))
        }

        pub fn history_dir(&self) -> PathBuf {
            self.data_dir().join("history")
        }

        pub fn cache_ttl(&self) -> chrono::Duration {
            let secs = self
                .cache_ttl_secs
                .filter(|s| *s >= 0)
                .unwrap_or(DEFAULT_CACHE_TTL_SECS);
            chrono::Duration::seconds(secs)
        }

        pub fn sheets_timeout(&self) -> std::time::Duration {
            std::time::Duration::from_secs(
                self.sheets_timeout_secs.unwrap_or(DEFAULT_SHEETS_TIMEOUT_SECS),
            )
        }
    }

}
