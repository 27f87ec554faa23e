use crate::domain::regime::MarketRegime;
use crate::domain::scan::{parse_number, ScanRecord, StockRow};
use crate::error::ScanError;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Fixed sheet layout: title row, regime row, account row, spacer, header row,
/// then data rows. Deliberately not configurable at runtime.
pub const MIN_ROWS: usize = 5;
const REGIME_ROW: usize = 1;
const ACCOUNT_ROW: usize = 2;
const HEADER_ROW: usize = 4;
const DATA_START_ROW: usize = 5;

const SCAN_TIME_LABEL: &str = "Last Scan:";
const DIST_DAYS_LABEL: &str = "Dist Days:";
const BUY_OK_LABEL: &str = "Buy OK:";
const ACCOUNT_LABEL: &str = "Account:";
const RISK_LABEL: &str = "Risk/Trade:";
const ACTIONABLE_LABEL: &str = "Actionable:";

/// Deterministic fixed-position extraction of a raw grid into a ScanRecord.
pub fn parse(grid: &[Vec<String>]) -> Result<ScanRecord, ScanError> {
    if grid.len() < MIN_ROWS {
        return Err(ScanError::MalformedGrid { rows: grid.len() });
    }

    let cell =
        |row: usize, col: usize| -> &str { grid[row].get(col).map(String::as_str).unwrap_or("") };

    let title = cell(0, 0).trim().to_string();
    let scan_time = strip_label(cell(0, 1), SCAN_TIME_LABEL);

    let regime_raw = cell(REGIME_ROW, 0).trim().to_string();
    let regime = MarketRegime::classify(&regime_raw);
    let dist_days = strip_label(cell(REGIME_ROW, 1), DIST_DAYS_LABEL);
    let buy_ok = strip_label(cell(REGIME_ROW, 2), BUY_OK_LABEL);

    let account_balance = parse_number(&strip_label(cell(ACCOUNT_ROW, 0), ACCOUNT_LABEL));
    let risk_per_trade = parse_number(&strip_label(cell(ACCOUNT_ROW, 1), RISK_LABEL));
    let actionable_count =
        parse_number(&strip_label(cell(ACCOUNT_ROW, 2), ACTIONABLE_LABEL)).map(|n| n as i64);

    let headers: Vec<String> = grid[HEADER_ROW].iter().map(|h| h.trim().to_string()).collect();

    let mut stocks = Vec::new();
    for row in grid.iter().skip(DATA_START_ROW) {
        // An empty leading cell terminates data consumption; anything after it
        // is trailing junk.
        if row.first().map(|c| c.trim().is_empty()).unwrap_or(true) {
            break;
        }
        let mut cells = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
            cells.insert(header.clone(), value);
        }
        stocks.push(StockRow { cells });
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("regime_raw".to_string(), regime_raw);

    Ok(ScanRecord {
        id: Uuid::new_v4(),
        title,
        scan_time,
        regime,
        dist_days,
        buy_ok,
        account_balance,
        risk_per_trade,
        actionable_count,
        metadata,
        headers,
        stocks,
    })
}

/// Strip a known `Label:` prefix (case-insensitive) and trim. Cells without
/// the label are used verbatim.
fn strip_label(cell: &str, label: &str) -> String {
    let trimmed = cell.trim();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => trimmed[label.len()..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn sample_grid(data_rows: &[&[&str]]) -> Vec<Vec<String>> {
    let mut grid: Vec<Vec<String>> = vec![
        vec!["CANSLIM Scan".into(), "Last Scan: 2026-01-05 09:30".into()],
        vec![
            "🟢 Confirmed Uptrend".into(),
            "Dist Days: 3".into(),
            "Buy OK: Yes".into(),
        ],
        vec![
            "Account: $100,000".into(),
            "Risk/Trade: $500".into(),
            "Actionable: 2".into(),
        ],
        vec![],
        vec![
            "Ticker".into(),
            "Pivot".into(),
            "Stop".into(),
            "RS".into(),
            "Comp".into(),
            "EPS".into(),
            "Setup".into(),
            "Notes".into(),
        ],
    ];
    for row in data_rows {
        grid.push(row.iter().map(|c| c.to_string()).collect());
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metadata_rows() {
        let grid = sample_grid(&[&["AAPL", "50", "45", "95", "98", "92", "Cup w/ Handle", ""]]);
        let record = parse(&grid).unwrap();

        assert_eq!(record.title, "CANSLIM Scan");
        assert_eq!(record.scan_time, "2026-01-05 09:30");
        assert_eq!(record.regime, MarketRegime::ConfirmedUptrend);
        assert_eq!(record.metadata["regime_raw"], "🟢 Confirmed Uptrend");
        assert_eq!(record.dist_days, "3");
        assert_eq!(record.buy_ok, "Yes");
        assert_eq!(record.account_balance, Some(100_000.0));
        assert_eq!(record.risk_per_trade, Some(500.0));
        assert_eq!(record.actionable_count, Some(2));
        assert_eq!(record.headers[0], "Ticker");
    }

    #[test]
    fn stock_count_matches_data_rows() {
        let grid = sample_grid(&[
            &["AAPL", "50", "45"],
            &["MSFT", "300", "290"],
            &["NVDA", "120", "110"],
        ]);
        let record = parse(&grid).unwrap();
        assert_eq!(record.stocks.len(), grid.len() - 5);
    }

    #[test]
    fn row_keys_match_headers() {
        let grid = sample_grid(&[&["AAPL", "50", "45", "95", "98", "92", "Flat Base", "note"]]);
        let record = parse(&grid).unwrap();
        let row = &record.stocks[0];
        let keys: Vec<&String> = row.cells.keys().collect();
        let mut expected: Vec<&String> = record.headers.iter().collect();
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(row.ticker(), "AAPL");
        assert_eq!(row.number("Pivot"), Some(50.0));
    }

    #[test]
    fn ragged_rows_pad_with_empty_strings() {
        let grid = sample_grid(&[&["AAPL", "50"]]);
        let record = parse(&grid).unwrap();
        let row = &record.stocks[0];
        assert_eq!(row.get("Stop"), "");
        assert_eq!(row.get("Notes"), "");
        assert_eq!(row.cells.len(), record.headers.len());
    }

    #[test]
    fn empty_first_cell_terminates_data_rows() {
        let grid = sample_grid(&[
            &["AAPL", "50", "45"],
            &["", "junk", "junk"],
            &["MSFT", "300", "290"],
        ]);
        let record = parse(&grid).unwrap();
        assert_eq!(record.stocks.len(), 1);
    }

    #[test]
    fn blank_trailing_rows_are_skipped() {
        let mut grid = sample_grid(&[&["AAPL", "50", "45"]]);
        grid.push(vec![]);
        grid.push(vec!["".into()]);
        let record = parse(&grid).unwrap();
        assert_eq!(record.stocks.len(), 1);
    }

    #[test]
    fn short_grid_is_malformed() {
        let grid: Vec<Vec<String>> = vec![vec!["CANSLIM Scan".into()]; 4];
        match parse(&grid) {
            Err(ScanError::MalformedGrid { rows }) => assert_eq!(rows, 4),
            other => panic!("expected MalformedGrid, got {other:?}"),
        }
    }

    #[test]
    fn header_only_grid_has_no_stocks() {
        let grid = sample_grid(&[]);
        let record = parse(&grid).unwrap();
        assert!(record.stocks.is_empty());
    }

    #[test]
    fn unlabeled_cells_pass_through_verbatim() {
        let mut grid = sample_grid(&[]);
        grid[0][1] = "2026-01-05 09:30".into();
        grid[2][1] = "not a number".into();
        let record = parse(&grid).unwrap();
        assert_eq!(record.scan_time, "2026-01-05 09:30");
        assert_eq!(record.risk_per_trade, None);
    }
}
