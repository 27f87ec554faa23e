use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const DEFAULT_ACCOUNT_EQUITY: f64 = 100_000.0;
pub const DEFAULT_RISK_PCT: f64 = 0.01;
pub const DEFAULT_MAX_POSITIONS: u32 = 6;

/// User-editable position-sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingSettings {
    pub account_equity: f64,
    pub risk_pct: f64,
    pub max_positions: u32,
}

impl Default for SizingSettings {
    fn default() -> Self {
        Self {
            account_equity: DEFAULT_ACCOUNT_EQUITY,
            risk_pct: DEFAULT_RISK_PCT,
            max_positions: DEFAULT_MAX_POSITIONS,
        }
    }
}

impl SizingSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.account_equity > 0.0 && self.account_equity.is_finite(),
            "account_equity must be positive"
        );
        ensure!(
            self.risk_pct > 0.0 && self.risk_pct <= 1.0,
            "risk_pct must be in (0, 1]"
        );
        ensure!(self.max_positions >= 1, "max_positions must be at least 1");
        Ok(())
    }

    /// Settings-derived dollar risk, used when the scan sheet does not carry
    /// its own risk-per-trade figure.
    pub fn risk_per_trade(&self) -> f64 {
        self.account_equity * self.risk_pct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    Above,
    Below,
}

/// Price alert the operator maintains by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub ticker: String,
    pub condition: AlertCondition,
    pub price: f64,
    pub triggered: bool,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(ticker: String, condition: AlertCondition, price: f64) -> anyhow::Result<Self> {
        ensure!(
            price > 0.0 && price <= 1_000_000.0,
            "alert price must be positive, max $1M (got {price})"
        );
        Ok(Self {
            id: Uuid::new_v4(),
            ticker,
            condition,
            price,
            triggered: false,
            created_at: Utc::now(),
        })
    }
}

/// Free-form checklist entries for one side of the daily routine.
pub type RoutineFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutineDay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premarket: Option<RoutineFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postclose: Option<RoutineFields>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Premarket,
    Postclose,
}

impl RoutineDay {
    pub fn set(&mut self, kind: RoutineKind, fields: RoutineFields) {
        match kind {
            RoutineKind::Premarket => self.premarket = Some(fields),
            RoutineKind::Postclose => self.postclose = Some(fields),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.premarket.is_none() && self.postclose.is_none()
    }
}

/// Calendar-view feed: which routine halves exist for a date.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoutineFlags {
    pub has_premarket: bool,
    pub has_postclose: bool,
}

impl RoutineFlags {
    pub fn of(day: &RoutineDay) -> Self {
        Self {
            has_premarket: day.premarket.is_some(),
            has_postclose: day.postclose.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        SizingSettings::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let mut s = SizingSettings::default();
        s.risk_pct = 0.0;
        assert!(s.validate().is_err());
        s.risk_pct = 1.5;
        assert!(s.validate().is_err());
        s = SizingSettings::default();
        s.account_equity = -1.0;
        assert!(s.validate().is_err());
        s = SizingSettings::default();
        s.max_positions = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn derived_risk_per_trade() {
        let s = SizingSettings {
            account_equity: 50_000.0,
            risk_pct: 0.02,
            max_positions: 4,
        };
        assert_eq!(s.risk_per_trade(), 1000.0);
    }

    #[test]
    fn alert_price_bounds() {
        assert!(Alert::new("AAPL".into(), AlertCondition::Above, 0.0).is_err());
        assert!(Alert::new("AAPL".into(), AlertCondition::Above, 2_000_000.0).is_err());
        let a = Alert::new("AAPL".into(), AlertCondition::Below, 150.0).unwrap();
        assert!(!a.triggered);
    }
}
