use crate::domain::dates::normalize_date;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// One stock position in the trade tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub ticker: String,
    pub account: String,
    pub side: TradeSide,
    pub entry_date: String,
    pub entry_price: f64,
    pub shares: u64,
    pub cost_basis: f64,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
    pub setup_type: String,
    pub status: PositionStatus,
    pub close_date: Option<String>,
    pub close_price: Option<f64>,
    pub pnl: Option<f64>,
    pub notes: String,
}

/// Fields the API may change after entry. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionUpdate {
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
    pub notes: Option<String>,
    pub close_date: Option<String>,
    pub close_price: Option<f64>,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        ticker: String,
        account: String,
        side: TradeSide,
        entry_date: String,
        entry_price: f64,
        shares: u64,
        stop_price: Option<f64>,
        target_price: Option<f64>,
        setup_type: String,
        notes: String,
    ) -> anyhow::Result<Self> {
        ensure!(
            (1..=1_000_000).contains(&shares),
            "shares must be 1..=1,000,000 (got {shares})"
        );
        ensure!(
            entry_price > 0.0 && entry_price <= 100_000.0,
            "entry price must be positive, max $100k (got {entry_price})"
        );
        let entry_date = normalize_date(&entry_date)?;
        let cost_basis = round_cents(shares as f64 * entry_price);
        Ok(Self {
            id: Uuid::new_v4(),
            ticker,
            account,
            side,
            entry_date,
            entry_price,
            shares,
            cost_basis,
            stop_price,
            target_price,
            setup_type,
            status: PositionStatus::Open,
            close_date: None,
            close_price: None,
            pnl: None,
            notes,
        })
    }

    pub fn apply(&mut self, update: PositionUpdate) {
        if let Some(stop) = update.stop_price {
            self.stop_price = Some(stop);
        }
        if let Some(target) = update.target_price {
            self.target_price = Some(target);
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(close_price) = update.close_price {
            let signed = match self.side {
                TradeSide::Long => close_price - self.entry_price,
                TradeSide::Short => self.entry_price - close_price,
            };
            self.status = PositionStatus::Closed;
            self.close_price = Some(close_price);
            self.close_date = update.close_date;
            self.pnl = Some(round_cents(signed * self.shares as f64));
        } else if let Some(close_date) = update.close_date {
            self.close_date = Some(close_date);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PositionsSummary {
    pub open_count: usize,
    pub closed_count: usize,
    pub total_pnl: f64,
}

pub fn summarize(positions: &[Position]) -> PositionsSummary {
    let open_count = positions
        .iter()
        .filter(|p| p.status == PositionStatus::Open)
        .count();
    let closed: Vec<&Position> = positions
        .iter()
        .filter(|p| p.status != PositionStatus::Open)
        .collect();
    let total_pnl = closed.iter().filter_map(|p| p.pnl).sum();
    PositionsSummary {
        open_count,
        closed_count: closed.len(),
        total_pnl,
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(side: TradeSide, entry: f64, shares: u64) -> Position {
        Position::open(
            "TEST".into(),
            "default".into(),
            side,
            "2026-01-05".into(),
            entry,
            shares,
            None,
            None,
            String::new(),
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn open_computes_cost_basis() {
        let p = position(TradeSide::Long, 100.0, 100);
        assert_eq!(p.cost_basis, 10_000.0);
        assert_eq!(p.status, PositionStatus::Open);
    }

    #[test]
    fn rejects_invalid_entries() {
        assert!(position_try(0, 100.0).is_err());
        assert!(position_try(100, 0.0).is_err());
        assert!(position_try(2_000_000, 100.0).is_err());
    }

    #[test]
    fn rejects_malformed_entry_dates() {
        let result = Position::open(
            "TEST".into(),
            "default".into(),
            TradeSide::Long,
            "Jan 5".into(),
            100.0,
            100,
            None,
            None,
            String::new(),
            String::new(),
        );
        assert!(result.is_err());
    }

    fn position_try(shares: u64, entry: f64) -> anyhow::Result<Position> {
        Position::open(
            "TEST".into(),
            "default".into(),
            TradeSide::Long,
            "2026-01-05".into(),
            entry,
            shares,
            None,
            None,
            String::new(),
            String::new(),
        )
    }

    #[test]
    fn closing_long_computes_pnl() {
        let mut p = position(TradeSide::Long, 50.0, 200);
        p.apply(PositionUpdate {
            close_price: Some(55.0),
            close_date: Some("2026-01-10".into()),
            ..Default::default()
        });
        assert_eq!(p.status, PositionStatus::Closed);
        assert_eq!(p.pnl, Some(1000.0));
    }

    #[test]
    fn closing_short_inverts_pnl() {
        let mut p = position(TradeSide::Short, 50.0, 200);
        p.apply(PositionUpdate {
            close_price: Some(55.0),
            ..Default::default()
        });
        assert_eq!(p.pnl, Some(-1000.0));
    }

    #[test]
    fn summary_splits_open_and_closed() {
        let mut a = position(TradeSide::Long, 10.0, 10);
        a.apply(PositionUpdate {
            close_price: Some(12.0),
            ..Default::default()
        });
        let b = position(TradeSide::Long, 10.0, 10);
        let s = summarize(&[a, b]);
        assert_eq!(s.open_count, 1);
        assert_eq!(s.closed_count, 1);
        assert_eq!(s.total_pnl, 20.0);
    }
}
