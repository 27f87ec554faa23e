use crate::domain::scan::ScanRecord;
use crate::domain::trackers::SizingSettings;

const SCORE_HEADER: &str = "Score";
const SHARES_HEADER: &str = "Shares";
const COST_HEADER: &str = "Cost";

const PIVOT_KEYS: &[&str] = &["Pivot", "Pivot Price"];
const STOP_KEYS: &[&str] = &["Stop", "Stop Price"];
const RS_KEYS: &[&str] = &["RS", "RS Rating"];
const COMP_KEYS: &[&str] = &["Comp", "Comp Rating"];
const EPS_KEYS: &[&str] = &["EPS", "EPS Rating"];

/// Shares and cost basis for one candidate. None when the trade cannot be
/// sized safely (non-positive risk per share).
pub fn position_size(pivot: f64, stop: f64, risk_per_trade: f64) -> Option<(u64, f64)> {
    let risk_per_share = pivot - stop;
    if risk_per_share <= 0.0 || !risk_per_share.is_finite() || risk_per_trade <= 0.0 {
        return None;
    }
    let shares = (risk_per_trade / risk_per_share).floor() as u64;
    Some((shares, shares as f64 * pivot))
}

/// Dollar risk for this scan. The sheet's own figure wins when present since
/// it reflects the account state at scan time; otherwise it is derived from
/// the operator's sizing settings.
pub fn effective_risk_per_trade(record: &ScanRecord, settings: &SizingSettings) -> f64 {
    record
        .risk_per_trade
        .filter(|r| *r > 0.0)
        .unwrap_or_else(|| settings.risk_per_trade())
}

/// Non-mutating copy of `record` with Score, Shares and Cost columns filled
/// in per row. The parsed grid cells are never overwritten: a column the
/// sheet already carries under one of those names stays sheet-owned and is
/// not derived.
pub fn annotate(record: &ScanRecord, settings: &SizingSettings) -> ScanRecord {
    let risk_per_trade = effective_risk_per_trade(record, settings);
    let mut out = record.clone();

    let derived: Vec<&str> = [SCORE_HEADER, SHARES_HEADER, COST_HEADER]
        .into_iter()
        .filter(|header| !record.headers.iter().any(|h| h == header))
        .collect();
    for header in &derived {
        out.headers.push(header.to_string());
    }

    for row in &mut out.stocks {
        let score = match (
            row.number_any(RS_KEYS),
            row.number_any(COMP_KEYS),
            row.number_any(EPS_KEYS),
        ) {
            (Some(rs), Some(comp), Some(eps)) => format!("{:.1}", (rs + comp + eps) / 3.0),
            _ => String::new(),
        };

        let sized = match (row.number_any(PIVOT_KEYS), row.number_any(STOP_KEYS)) {
            (Some(pivot), Some(stop)) => position_size(pivot, stop, risk_per_trade),
            _ => None,
        };
        let (shares, cost) = match sized {
            Some((shares, cost)) => (shares.to_string(), format_usd(cost)),
            None => (String::new(), String::new()),
        };

        for (header, value) in [
            (SCORE_HEADER, score),
            (SHARES_HEADER, shares),
            (COST_HEADER, cost),
        ] {
            if derived.contains(&header) {
                row.set(header, value);
            }
        }
    }

    out
}

/// `$`-prefixed whole-dollar amount with thousands separators, e.g. "$5,000".
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let mut digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    while digits.len() > 3 {
        let tail = digits.split_off(digits.len() - 3);
        grouped = if grouped.is_empty() {
            tail
        } else {
            format!("{tail},{grouped}")
        };
    }
    grouped = if grouped.is_empty() {
        digits
    } else {
        format!("{digits},{grouped}")
    };
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
