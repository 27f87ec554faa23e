use crate::domain::dates::normalize_date;
use crate::domain::positions::round_cents;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Open,
    Expired,
    CalledAway,
    BoughtBack,
}

/// One covered-call trade. Premiums are tracked per contract; `premium_total`
/// is locked in at entry (per-contract premium x contracts x 100 shares).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveredCall {
    pub id: Uuid,
    pub ticker: String,
    pub sell_date: String,
    pub expiry: String,
    pub strike: f64,
    pub contracts: u32,
    pub premium_per_contract: f64,
    pub premium_total: f64,
    pub delta: f64,
    pub stock_price_at_sell: f64,
    pub status: CallStatus,
    pub close_date: Option<String>,
    pub close_price: Option<f64>,
    pub pnl: Option<f64>,
    pub notes: String,
}

/// How an open call leaves the book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallOutcome {
    Expired,
    CalledAway,
    BoughtBack { buyback_price: f64 },
}

impl CoveredCall {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        ticker: String,
        sell_date: String,
        expiry: String,
        strike: f64,
        contracts: u32,
        premium_per_contract: f64,
        delta: f64,
        stock_price_at_sell: f64,
        notes: String,
    ) -> anyhow::Result<Self> {
        ensure!(
            (1..=10_000).contains(&contracts),
            "contracts must be 1..=10,000 (got {contracts})"
        );
        ensure!(
            (0.0..=10_000.0).contains(&premium_per_contract),
            "premium must be 0..=$10,000 per contract (got {premium_per_contract})"
        );
        ensure!(
            strike > 0.0 && strike <= 100_000.0,
            "strike must be positive, max $100k (got {strike})"
        );
        let sell_date = normalize_date(&sell_date)?;
        let expiry = if expiry.trim().is_empty() {
            String::new()
        } else {
            normalize_date(&expiry)?
        };
        let premium_total = round_cents(premium_per_contract * contracts as f64 * 100.0);
        Ok(Self {
            id: Uuid::new_v4(),
            ticker,
            sell_date,
            expiry,
            strike,
            contracts,
            premium_per_contract,
            premium_total,
            delta,
            stock_price_at_sell,
            status: CallStatus::Open,
            close_date: None,
            close_price: None,
            pnl: None,
            notes,
        })
    }

    /// Expired: keep the full premium. Called away: premium plus the stock
    /// appreciation from sale price to strike. Bought back: premium minus the
    /// buyback cost.
    pub fn close(&mut self, outcome: CallOutcome, close_date: String) {
        let shares = self.contracts as f64 * 100.0;
        let (status, pnl, close_price) = match outcome {
            CallOutcome::Expired => (CallStatus::Expired, self.premium_total, None),
            CallOutcome::CalledAway => {
                let appreciation = (self.strike - self.stock_price_at_sell) * shares;
                (
                    CallStatus::CalledAway,
                    self.premium_total + appreciation,
                    None,
                )
            }
            CallOutcome::BoughtBack { buyback_price } => (
                CallStatus::BoughtBack,
                self.premium_total - buyback_price * shares,
                Some(buyback_price),
            ),
        };
        self.status = status;
        self.close_date = Some(close_date);
        self.close_price = close_price;
        self.pnl = Some(round_cents(pnl));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallsBreakdown {
    pub total_premium: f64,
    pub total_pnl: f64,
    pub total_trades: usize,
    pub expired: usize,
    pub called_away: usize,
    pub open: usize,
    pub avg_premium: f64,
    pub annualized_yield_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallsSummary {
    #[serde(flatten)]
    pub overall: CallsBreakdown,
    pub tickers: Vec<String>,
    pub by_ticker: BTreeMap<String, CallsBreakdown>,
}

/// Aggregate premium/pnl stats, overall and per ticker. `capital` is the
/// account equity the annualized yield is expressed against.
pub fn summarize(trades: &[CoveredCall], capital: f64) -> CallsSummary {
    let tickers: BTreeSet<String> = trades.iter().map(|t| t.ticker.clone()).collect();
    let by_ticker = tickers
        .iter()
        .map(|tk| {
            let subset: Vec<&CoveredCall> = trades.iter().filter(|t| &t.ticker == tk).collect();
            (tk.clone(), breakdown(&subset, capital))
        })
        .collect();
    let all: Vec<&CoveredCall> = trades.iter().collect();
    CallsSummary {
        overall: breakdown(&all, capital),
        tickers: tickers.into_iter().collect(),
        by_ticker,
    }
}

fn breakdown(subset: &[&CoveredCall], capital: f64) -> CallsBreakdown {
    if subset.is_empty() {
        return CallsBreakdown {
            total_premium: 0.0,
            total_pnl: 0.0,
            total_trades: 0,
            expired: 0,
            called_away: 0,
            open: 0,
            avg_premium: 0.0,
            annualized_yield_pct: 0.0,
        };
    }

    let total_premium: f64 = subset.iter().map(|t| t.premium_total).sum();
    // Closed trades without a recorded pnl count their premium (legacy rows).
    let total_pnl: f64 = subset
        .iter()
        .filter(|t| t.status != CallStatus::Open)
        .map(|t| t.pnl.unwrap_or(t.premium_total))
        .sum();

    // Distinct sell months spanned, for a rough annualization of premium.
    // `get` tolerates legacy rows whose sell_date predates date validation.
    let months: BTreeSet<&str> = subset
        .iter()
        .filter_map(|t| t.sell_date.get(..7))
        .collect();
    let months = months.len().max(1) as f64;
    let annualized = (total_premium / months) * 12.0 / capital.max(1.0) * 100.0;

    CallsBreakdown {
        total_premium,
        total_pnl,
        total_trades: subset.len(),
        expired: subset
            .iter()
            .filter(|t| t.status == CallStatus::Expired)
            .count(),
        called_away: subset
            .iter()
            .filter(|t| t.status == CallStatus::CalledAway)
            .count(),
        open: subset
            .iter()
            .filter(|t| t.status == CallStatus::Open)
            .count(),
        avg_premium: total_premium / subset.len() as f64,
        annualized_yield_pct: annualized,
    }
}
