use anyhow::ensure;
use chrono::NaiveDate;

/// Validate a calendar date at the write boundary. Stored date fields are
/// always `YYYY-MM-DD`; summaries group on the `YYYY-MM` prefix and rely on
/// this shape.
pub fn normalize_date(raw: &str) -> anyhow::Result<String> {
    let date = raw.trim();
    ensure!(
        NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
        "date must be YYYY-MM-DD (got {date:?})"
    );
    Ok(date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_dates() {
        assert_eq!(normalize_date(" 2026-01-05 ").unwrap(), "2026-01-05");
    }

    #[test]
    fn rejects_non_iso_dates() {
        assert!(normalize_date("").is_err());
        assert!(normalize_date("01/05/2026").is_err());
        assert!(normalize_date("2026-13-01").is_err());
        assert!(normalize_date("２０２６年").is_err());
    }
}
