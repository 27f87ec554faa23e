use anyhow::ensure;

/// Normalize and validate a ticker at the write boundary: uppercase
/// alphanumeric plus `.`/`-`, at most 10 characters.
pub fn normalize_ticker(raw: &str) -> anyhow::Result<String> {
    let ticker = raw.trim().to_uppercase();
    ensure!(!ticker.is_empty(), "ticker must be non-empty");
    ensure!(
        ticker.len() <= 10,
        "ticker too long (max 10 chars): {ticker}"
    );
    ensure!(
        ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'),
        "ticker may only contain letters, digits, '.' and '-': {ticker}"
    );
    Ok(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_uppercases() {
        assert_eq!(normalize_ticker(" brk.b ").unwrap(), "BRK.B");
        assert_eq!(normalize_ticker("BF-B").unwrap(), "BF-B");
    }

    #[test]
    fn rejects_bad_tickers() {
        assert!(normalize_ticker("").is_err());
        assert!(normalize_ticker("TOOLONGTICKER").is_err());
        assert!(normalize_ticker("AA PL").is_err());
        assert!(normalize_ticker("AAPL;DROP").is_err());
    }
}
