use std::fmt;

/// Failures along the scan refresh path. Persistence errors never surface to
/// readers; the cache layer logs and swallows them.
#[derive(Debug)]
pub enum ScanError {
    /// Upstream could not be reached (network, auth, timeout, non-2xx).
    SourceUnavailable(String),
    /// Upstream answered with zero rows.
    SourceEmpty,
    /// Grid is structurally too short to parse.
    MalformedGrid { rows: usize },
    /// Snapshot write failed.
    Persistence(std::io::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::SourceUnavailable(detail) => {
                write!(f, "scan source unavailable: {detail}")
            }
            ScanError::SourceEmpty => write!(f, "scan source returned no rows"),
            ScanError::MalformedGrid { rows } => {
                write!(f, "malformed scan grid: {rows} rows (need at least 5)")
            }
            ScanError::Persistence(err) => write!(f, "snapshot persistence failed: {err}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Persistence(err) => Some(err),
            _ => None,
        }
    }
}
