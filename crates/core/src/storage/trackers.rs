use crate::domain::calls::{CallOutcome, CoveredCall};
use crate::domain::positions::{Position, PositionUpdate};
use crate::domain::trackers::{
    Alert, RoutineDay, RoutineFields, RoutineFlags, RoutineKind, SizingSettings,
};
use crate::storage::files;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SETTINGS_FILE: &str = "settings.json";
const ALERTS_FILE: &str = "alerts.json";
const POSITIONS_FILE: &str = "positions.json";
const CALLS_FILE: &str = "calls.json";
const ROUTINES_FILE: &str = "routines.json";
const EARNINGS_FILE: &str = "earnings.json";

type Routines = BTreeMap<String, RoutineDay>;
type Earnings = BTreeMap<String, String>;

/// Flat-file store for everything the operator tracks by hand. Each
/// collection is one JSON file, replaced wholesale through the locked atomic
/// write in `storage::files`; read-modify-write cycles are serialized behind
/// a process-local mutex.
#[derive(Debug)]
pub struct TrackerStore {
    dir: PathBuf,
    write_guard: tokio::sync::Mutex<()>,
}

impl TrackerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_guard: tokio::sync::Mutex::new(()),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn load_or_default<T>(&self, name: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        Ok(files::read_json(&self.path(name))
            .with_context(|| format!("read {name} failed"))?
            .unwrap_or_default())
    }

    async fn update<T, R>(
        &self,
        name: &str,
        apply: impl FnOnce(&mut T) -> anyhow::Result<R>,
    ) -> anyhow::Result<R>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Default,
    {
        let _guard = self.write_guard.lock().await;
        let mut value: T = self.load_or_default(name)?;
        let out = apply(&mut value)?;
        files::write_json_atomic(&self.path(name), &value)
            .with_context(|| format!("write {name} failed"))?;
        Ok(out)
    }

    // --- sizing settings ---

    /// Missing file or missing keys fall back to the defaults; the dashboard
    /// is usable before the operator ever saves settings.
    pub fn sizing_settings(&self) -> anyhow::Result<SizingSettings> {
        self.load_or_default::<Option<SizingSettings>>(SETTINGS_FILE)
            .map(Option::unwrap_or_default)
    }

    pub async fn save_sizing_settings(&self, settings: SizingSettings) -> anyhow::Result<()> {
        settings.validate()?;
        self.update::<Option<SizingSettings>, _>(SETTINGS_FILE, |value| {
            *value = Some(settings);
            Ok(())
        })
        .await
    }

    // --- alerts ---

    pub fn alerts(&self) -> anyhow::Result<Vec<Alert>> {
        self.load_or_default(ALERTS_FILE)
    }

    pub async fn add_alert(&self, alert: Alert) -> anyhow::Result<Alert> {
        self.update::<Vec<Alert>, _>(ALERTS_FILE, |alerts| {
            alerts.push(alert.clone());
            Ok(alert)
        })
        .await
    }

    pub async fn delete_alert(&self, id: Uuid) -> anyhow::Result<bool> {
        self.update::<Vec<Alert>, _>(ALERTS_FILE, |alerts| {
            let before = alerts.len();
            alerts.retain(|a| a.id != id);
            Ok(alerts.len() < before)
        })
        .await
    }

    // --- positions ---

    pub fn positions(&self) -> anyhow::Result<Vec<Position>> {
        self.load_or_default(POSITIONS_FILE)
    }

    pub async fn add_position(&self, position: Position) -> anyhow::Result<Position> {
        self.update::<Vec<Position>, _>(POSITIONS_FILE, |positions| {
            positions.push(position.clone());
            Ok(position)
        })
        .await
    }

    pub async fn update_position(
        &self,
        id: Uuid,
        update: PositionUpdate,
    ) -> anyhow::Result<Option<Position>> {
        self.update::<Vec<Position>, _>(POSITIONS_FILE, |positions| {
            let Some(position) = positions.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            position.apply(update);
            Ok(Some(position.clone()))
        })
        .await
    }

    pub async fn delete_position(&self, id: Uuid) -> anyhow::Result<bool> {
        self.update::<Vec<Position>, _>(POSITIONS_FILE, |positions| {
            let before = positions.len();
            positions.retain(|p| p.id != id);
            Ok(positions.len() < before)
        })
        .await
    }

    // --- covered calls ---

    pub fn calls(&self) -> anyhow::Result<Vec<CoveredCall>> {
        self.load_or_default(CALLS_FILE)
    }

    pub async fn add_call(&self, call: CoveredCall) -> anyhow::Result<CoveredCall> {
        self.update::<Vec<CoveredCall>, _>(CALLS_FILE, |calls| {
            calls.push(call.clone());
            Ok(call)
        })
        .await
    }

    pub async fn close_call(
        &self,
        id: Uuid,
        outcome: CallOutcome,
        close_date: String,
        notes: Option<String>,
    ) -> anyhow::Result<Option<CoveredCall>> {
        self.update::<Vec<CoveredCall>, _>(CALLS_FILE, |calls| {
            let Some(call) = calls.iter_mut().find(|c| c.id == id) else {
                return Ok(None);
            };
            call.close(outcome, close_date);
            if let Some(notes) = notes {
                call.notes = notes;
            }
            Ok(Some(call.clone()))
        })
        .await
    }

    pub async fn delete_call(&self, id: Uuid) -> anyhow::Result<bool> {
        self.update::<Vec<CoveredCall>, _>(CALLS_FILE, |calls| {
            let before = calls.len();
            calls.retain(|c| c.id != id);
            Ok(calls.len() < before)
        })
        .await
    }

    // --- daily routines ---

    pub fn routine_day(&self, date: &str) -> anyhow::Result<RoutineDay> {
        let routines: Routines = self.load_or_default(ROUTINES_FILE)?;
        Ok(routines.get(date).cloned().unwrap_or_default())
    }

    pub async fn save_routine(
        &self,
        date: &str,
        kind: RoutineKind,
        fields: RoutineFields,
    ) -> anyhow::Result<RoutineDay> {
        let date = date.to_string();
        self.update::<Routines, _>(ROUTINES_FILE, move |routines| {
            let day = routines.entry(date).or_default();
            day.set(kind, fields);
            Ok(day.clone())
        })
        .await
    }

    pub fn routine_dates(&self) -> anyhow::Result<BTreeMap<String, RoutineFlags>> {
        let routines: Routines = self.load_or_default(ROUTINES_FILE)?;
        Ok(routines
            .iter()
            .filter(|(_, day)| !day.is_empty())
            .map(|(date, day)| (date.clone(), RoutineFlags::of(day)))
            .collect())
    }

    // --- earnings dates ---

    pub fn earnings(&self) -> anyhow::Result<Earnings> {
        self.load_or_default(EARNINGS_FILE)
    }

    pub async fn set_earnings(&self, ticker: String, date: String) -> anyhow::Result<()> {
        self.update::<Earnings, _>(EARNINGS_FILE, |earnings| {
            earnings.insert(ticker, date);
            Ok(())
        })
        .await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::positions::TradeSide;
    use crate::domain::trackers::AlertCondition;

    fn scratch_store() -> TrackerStore {
        let dir = std::env::temp_dir().join(format!("scanboard-trk-{}", Uuid::new_v4()));
        TrackerStore::new(dir)
    }

    #[tokio::test]
    async fn settings_default_until_saved_then_persist() {
        let store = scratch_store();
        assert_eq!(store.sizing_settings().unwrap(), SizingSettings::default());

        let custom = SizingSettings {
            account_equity: 250_000.0,
            risk_pct: 0.005,
            max_positions: 8,
        };
        store.save_sizing_settings(custom).await.unwrap();

        // A second store over the same directory sees the saved value.
        let reopened = TrackerStore::new(store.dir().to_path_buf());
        assert_eq!(reopened.sizing_settings().unwrap(), custom);
        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[tokio::test]
    async fn save_settings_rejects_invalid() {
        let store = scratch_store();
        let bad = SizingSettings {
            account_equity: 0.0,
            ..SizingSettings::default()
        };
        assert!(store.save_sizing_settings(bad).await.is_err());
    }

    #[tokio::test]
    async fn alert_add_list_delete() {
        let store = scratch_store();
        let alert = Alert::new("AAPL".into(), AlertCondition::Above, 150.0).unwrap();
        let id = alert.id;
        store.add_alert(alert).await.unwrap();

        assert_eq!(store.alerts().unwrap().len(), 1);
        assert!(store.delete_alert(id).await.unwrap());
        assert!(!store.delete_alert(id).await.unwrap());
        assert!(store.alerts().unwrap().is_empty());
        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[tokio::test]
    async fn position_update_round_trip() {
        let store = scratch_store();
        let position = Position::open(
            "MSFT".into(),
            "default".into(),
            TradeSide::Long,
            "2026-01-05".into(),
            300.0,
            10,
            Some(290.0),
            None,
            "Flat Base".into(),
            String::new(),
        )
        .unwrap();
        let id = position.id;
        store.add_position(position).await.unwrap();

        let closed = store
            .update_position(
                id,
                PositionUpdate {
                    close_price: Some(330.0),
                    close_date: Some("2026-02-01".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.pnl, Some(300.0));

        let missing = store
            .update_position(Uuid::new_v4(), PositionUpdate::default())
            .await
            .unwrap();
        assert!(missing.is_none());
        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[tokio::test]
    async fn routines_track_both_halves() {
        let store = scratch_store();
        let mut fields = RoutineFields::new();
        fields.insert("futures".into(), "up small".into());
        store
            .save_routine("2026-01-05", RoutineKind::Premarket, fields)
            .await
            .unwrap();

        let day = store.routine_day("2026-01-05").unwrap();
        assert!(day.premarket.is_some());
        assert!(day.postclose.is_none());

        let dates = store.routine_dates().unwrap();
        assert!(dates["2026-01-05"].has_premarket);
        assert!(!dates["2026-01-05"].has_postclose);
        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[tokio::test]
    async fn earnings_upsert() {
        let store = scratch_store();
        store
            .set_earnings("AAPL".into(), "2026-01-28".into())
            .await
            .unwrap();
        store
            .set_earnings("AAPL".into(), "2026-01-29".into())
            .await
            .unwrap();
        let earnings = store.earnings().unwrap();
        assert_eq!(earnings["AAPL"], "2026-01-29");
        std::fs::remove_dir_all(store.dir()).unwrap();
    }
}
