use crate::domain::scan::{ScanRecord, SnapshotSummary};
use crate::error::ScanError;
use crate::storage::files;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Durable scan history: one JSON file per distinct `scan_time`, written at
/// most once. The directory is append-only from this store's perspective.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `record` unless a snapshot for its `scan_time` already exists.
    /// Returns whether a new file was written. Identical timestamps are the
    /// same scan; skipping them is the deduplication rule.
    pub fn persist(&self, record: &ScanRecord) -> Result<bool, ScanError> {
        let path = self.dir.join(file_name_for(&record.scan_time));
        if path.exists() {
            return Ok(false);
        }
        files::write_json_atomic(&path, record).map_err(ScanError::Persistence)?;
        tracing::info!(scan_time = %record.scan_time, path = %path.display(), "wrote scan snapshot");
        Ok(true)
    }

    /// Newest-first summaries of every stored snapshot. Unreadable entries are
    /// logged and skipped rather than failing the listing.
    pub fn list(&self) -> Result<Vec<SnapshotSummary>, ScanError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ScanError::Persistence(err)),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(ScanError::Persistence)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match files::read_json::<ScanRecord>(&path) {
                Ok(Some(record)) => out.push(SnapshotSummary::of(&record)),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable snapshot");
                }
            }
        }
        out.sort_by(|a, b| b.scan_time.cmp(&a.scan_time));
        Ok(out)
    }

    pub fn load(&self, scan_time: &str) -> Result<Option<ScanRecord>, ScanError> {
        let path = self.dir.join(file_name_for(scan_time));
        files::read_json(&path).map_err(ScanError::Persistence)
    }
}

/// Filesystem-safe transform of a scan timestamp: anything outside
/// `[A-Za-z0-9._-]` becomes `_`.
pub fn file_name_for(scan_time: &str) -> String {
    let safe: String = scan_time
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse::{parse, sample_grid};
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("scanboard-snap-{}", uuid::Uuid::new_v4()))
    }

    fn record(scan_time: &str) -> ScanRecord {
        let mut grid = sample_grid(&[&["AAPL", "50", "45"]]);
        grid[0][1] = format!("Last Scan: {scan_time}");
        parse(&grid).unwrap()
    }

    #[test]
    fn sanitizes_timestamps_into_file_names() {
        assert_eq!(
            file_name_for("2026-01-05 09:30"),
            "2026-01-05_09_30.json".to_string()
        );
        assert_eq!(file_name_for("a/b\\c"), "a_b_c.json".to_string());
    }

    #[test]
    fn persists_once_per_scan_time() {
        let dir = scratch_dir();
        let store = SnapshotStore::new(&dir);

        assert!(store.persist(&record("2026-01-05 09:30")).unwrap());
        // Same timestamp: same scan, skip.
        assert!(!store.persist(&record("2026-01-05 09:30")).unwrap());
        assert!(store.persist(&record("2026-01-05 10:30")).unwrap());

        let json_files = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
            .count();
        assert_eq!(json_files, 2);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn lists_newest_first_and_loads_by_scan_time() {
        let dir = scratch_dir();
        let store = SnapshotStore::new(&dir);
        store.persist(&record("2026-01-05 09:30")).unwrap();
        store.persist(&record("2026-01-06 09:30")).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].scan_time, "2026-01-06 09:30");
        assert_eq!(listed[0].stock_count, 1);

        let loaded = store.load("2026-01-05 09:30").unwrap().unwrap();
        assert_eq!(loaded.scan_time, "2026-01-05 09:30");
        assert!(store.load("2026-01-07 09:30").unwrap().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_store_lists_nothing() {
        let store = SnapshotStore::new(scratch_dir());
        assert!(store.list().unwrap().is_empty());
    }
}
