use crate::domain::scan::ScanRecord;
use crate::domain::trackers::SizingSettings;
use crate::error::ScanError;
use crate::ingest::parse;
use crate::ingest::source::ScanSource;
use crate::sizing;
use crate::storage::snapshot::SnapshotStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// What a read returns: the annotated record plus enough provenance for the
/// caller to distinguish a fresh fetch from a stale-served one. A cold cache
/// with a failing source returns an error instead; "no data yet" is never
/// conflated with "stale data".
#[derive(Debug, Clone, Serialize)]
pub struct CachedScan {
    pub record: ScanRecord,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

#[derive(Debug)]
struct CacheEntry {
    record: ScanRecord,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    /// `scan_time` of the last durably snapshotted record; the sole
    /// deduplication input. Distinct from the cached record's own time.
    last_scan_time: Option<String>,
}

/// Process-lifetime scan cache. Created empty at startup (a restart always
/// forces one fresh fetch); replaced wholesale on every successful refresh.
/// Owned explicitly by the application state, never a module-level global.
pub struct ScanCache {
    source: Arc<dyn ScanSource>,
    store: SnapshotStore,
    ttl: Duration,
    state: tokio::sync::Mutex<CacheState>,
}

impl ScanCache {
    pub fn new(source: Arc<dyn ScanSource>, store: SnapshotStore, ttl: Duration) -> Self {
        Self {
            source,
            store,
            ttl,
            state: tokio::sync::Mutex::new(CacheState::default()),
        }
    }

    /// Serve the cached record, refreshing through source -> parser ->
    /// annotator when the entry is cold, older than the TTL, or `force` is
    /// set. Refresh runs on the calling task while the state lock is held, so
    /// concurrent readers serialize rather than racing to refresh.
    ///
    /// Failure policy: cold-cache failures propagate; warm-cache failures are
    /// logged and degrade to serving the previous record flagged stale.
    pub async fn get_or_refresh(
        &self,
        force: bool,
        settings: &SizingSettings,
    ) -> Result<CachedScan, ScanError> {
        let mut state = self.state.lock().await;

        if !force {
            if let Some(entry) = &state.entry {
                if Utc::now().signed_duration_since(entry.fetched_at) <= self.ttl {
                    return Ok(CachedScan {
                        record: entry.record.clone(),
                        fetched_at: entry.fetched_at,
                        stale: false,
                    });
                }
            }
        }

        match self.refresh(&mut state, settings).await {
            Ok(()) => {}
            Err(err) => {
                let Some(entry) = &state.entry else {
                    return Err(err);
                };
                tracing::warn!(
                    source = self.source.source_name(),
                    error = %err,
                    "scan refresh failed; serving last-known-good"
                );
                return Ok(CachedScan {
                    record: entry.record.clone(),
                    fetched_at: entry.fetched_at,
                    stale: true,
                });
            }
        }

        let entry = state.entry.as_ref().ok_or(ScanError::SourceEmpty)?;
        Ok(CachedScan {
            record: entry.record.clone(),
            fetched_at: entry.fetched_at,
            stale: false,
        })
    }

    async fn refresh(
        &self,
        state: &mut CacheState,
        settings: &SizingSettings,
    ) -> Result<(), ScanError> {
        let grid = self.source.fetch_raw_grid().await?;
        let record = parse::parse(&grid)?;
        let record = sizing::annotate(&record, settings);

        if state.last_scan_time.as_deref() != Some(record.scan_time.as_str()) {
            // A persistence failure must never fail the read that caused it;
            // leaving last_scan_time unset retries the write next refresh.
            match self.store.persist(&record) {
                Ok(_) => state.last_scan_time = Some(record.scan_time.clone()),
                Err(err) => {
                    tracing::error!(scan_time = %record.scan_time, error = %err, "snapshot write failed");
                }
            }
        }

        state.entry = Some(CacheEntry {
            record,
            fetched_at: Utc::now(),
        });
        Ok(())
    }
}
