use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Advisory lock file shared by all writers within one data directory.
const LOCK_FILE: &str = ".lock";

/// Durable JSON write: exclusive advisory lock on the directory's lock file,
/// serialize to a sibling `*.tmp`, then atomically rename over the target.
/// Concurrent readers either see the old file or the new one, never a partial
/// write. The lock is released on every exit path (explicitly and on drop).
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(dir.join(LOCK_FILE))?;
    lock.lock_exclusive()?;
    let result = replace_via_tmp(path, value);
    let _ = lock.unlock();
    result
}

fn replace_via_tmp<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Missing file reads as None; a present-but-unparseable file is an error,
/// not silently invented data.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("scanboard-files-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn round_trips_and_replaces() {
        let dir = scratch_dir();
        let path = dir.join("state.json");

        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u32);
        write_json_atomic(&path, &value).unwrap();

        let read: BTreeMap<String, u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(read, value);

        value.insert("b".to_string(), 2);
        write_json_atomic(&path, &value).unwrap();
        let read: BTreeMap<String, u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(read.len(), 2);

        // No temp residue after a successful replace.
        assert!(!dir.join("state.json.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_reads_none() {
        let path = scratch_dir().join("absent.json");
        let read: Option<Vec<u32>> = read_json(&path).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn corrupt_file_is_an_error_not_none() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();
        let read: io::Result<Option<Vec<u32>>> = read_json(&path);
        assert!(read.is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
