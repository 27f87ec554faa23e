use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use scanboard_core::domain::calls::{self, CallOutcome, CallsSummary, CoveredCall};
use scanboard_core::domain::dates::normalize_date;
use scanboard_core::domain::positions::{
    self, Position, PositionUpdate, PositionsSummary, TradeSide,
};
use scanboard_core::domain::ticker::normalize_ticker;
use scanboard_core::domain::trackers::{
    Alert, AlertCondition, RoutineDay, RoutineFields, RoutineFlags, RoutineKind, SizingSettings,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

// --- sizing settings ---

#[derive(Debug, Deserialize)]
pub struct SettingsPatch {
    pub account_equity: Option<f64>,
    pub risk_pct: Option<f64>,
    pub max_positions: Option<u32>,
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SizingSettings>, ApiError> {
    Ok(Json(state.trackers.sizing_settings()?))
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SizingSettings>, ApiError> {
    let mut settings = state.trackers.sizing_settings()?;
    if let Some(equity) = patch.account_equity {
        settings.account_equity = equity;
    }
    if let Some(risk) = patch.risk_pct {
        settings.risk_pct = risk;
    }
    if let Some(max) = patch.max_positions {
        settings.max_positions = max;
    }
    settings
        .validate()
        .map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    state.trackers.save_sizing_settings(settings).await?;
    Ok(Json(settings))
}

// --- alerts ---

#[derive(Debug, Deserialize)]
pub struct NewAlert {
    pub ticker: String,
    #[serde(default = "default_condition")]
    pub condition: AlertCondition,
    pub price: f64,
}

fn default_condition() -> AlertCondition {
    AlertCondition::Above
}

pub async fn list_alerts(State(state): State<AppState>) -> Result<Json<Vec<Alert>>, ApiError> {
    Ok(Json(state.trackers.alerts()?))
}

pub async fn add_alert(
    State(state): State<AppState>,
    Json(body): Json<NewAlert>,
) -> Result<(axum::http::StatusCode, Json<Alert>), ApiError> {
    let ticker =
        normalize_ticker(&body.ticker).map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let alert = Alert::new(ticker, body.condition, body.price)
        .map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let alert = state.trackers.add_alert(alert).await?;
    Ok((axum::http::StatusCode::CREATED, Json(alert)))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.trackers.delete_alert(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::not_found(format!("no alert {id}")))
    }
}

// --- positions ---

#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
    pub summary: PositionsSummary,
}

#[derive(Debug, Deserialize)]
pub struct NewPosition {
    pub ticker: String,
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default = "default_side")]
    pub side: TradeSide,
    pub entry_date: Option<String>,
    pub entry_price: f64,
    pub shares: u64,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
    #[serde(default)]
    pub setup_type: String,
    #[serde(default)]
    pub notes: String,
}

fn default_account() -> String {
    "default".to_string()
}

fn default_side() -> TradeSide {
    TradeSide::Long
}

pub async fn list_positions(
    State(state): State<AppState>,
) -> Result<Json<PositionsResponse>, ApiError> {
    let positions = state.trackers.positions()?;
    let summary = positions::summarize(&positions);
    Ok(Json(PositionsResponse { positions, summary }))
}

pub async fn add_position(
    State(state): State<AppState>,
    Json(body): Json<NewPosition>,
) -> Result<(axum::http::StatusCode, Json<Position>), ApiError> {
    let ticker =
        normalize_ticker(&body.ticker).map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let position = Position::open(
        ticker,
        body.account,
        body.side,
        body.entry_date.unwrap_or_else(today),
        body.entry_price,
        body.shares,
        body.stop_price,
        body.target_price,
        body.setup_type,
        body.notes,
    )
    .map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let position = state.trackers.add_position(position).await?;
    Ok((axum::http::StatusCode::CREATED, Json(position)))
}

pub async fn update_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut update): Json<PositionUpdate>,
) -> Result<Json<Position>, ApiError> {
    if let Some(date) = &update.close_date {
        update.close_date =
            Some(normalize_date(date).map_err(|err| ApiError::bad_request(format!("{err:#}")))?);
    }
    state
        .trackers
        .update_position(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no position {id}")))
}

pub async fn delete_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.trackers.delete_position(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::not_found(format!("no position {id}")))
    }
}

// --- covered calls ---

#[derive(Debug, Serialize)]
pub struct CallsResponse {
    pub trades: Vec<CoveredCall>,
    pub summary: CallsSummary,
}

#[derive(Debug, Deserialize)]
pub struct NewCall {
    #[serde(default = "default_call_ticker")]
    pub ticker: String,
    pub sell_date: Option<String>,
    #[serde(default)]
    pub expiry: String,
    pub strike: f64,
    #[serde(default = "default_contracts")]
    pub contracts: u32,
    #[serde(default)]
    pub premium_per_contract: f64,
    #[serde(default = "default_delta")]
    pub delta: f64,
    #[serde(default)]
    pub stock_price: f64,
    #[serde(default)]
    pub notes: String,
}

fn default_call_ticker() -> String {
    "SPY".to_string()
}

fn default_contracts() -> u32 {
    1
}

fn default_delta() -> f64 {
    0.10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseStatus {
    Expired,
    CalledAway,
    BoughtBack,
}

#[derive(Debug, Deserialize)]
pub struct CloseCall {
    pub status: CloseStatus,
    pub close_date: Option<String>,
    pub buyback_price: Option<f64>,
    pub notes: Option<String>,
}

pub async fn list_calls(State(state): State<AppState>) -> Result<Json<CallsResponse>, ApiError> {
    let trades = state.trackers.calls()?;
    let capital = state.trackers.sizing_settings()?.account_equity;
    let summary = calls::summarize(&trades, capital);
    Ok(Json(CallsResponse { trades, summary }))
}

pub async fn add_call(
    State(state): State<AppState>,
    Json(body): Json<NewCall>,
) -> Result<(axum::http::StatusCode, Json<CoveredCall>), ApiError> {
    let ticker =
        normalize_ticker(&body.ticker).map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let call = CoveredCall::open(
        ticker,
        body.sell_date.unwrap_or_else(today),
        body.expiry,
        body.strike,
        body.contracts,
        body.premium_per_contract,
        body.delta,
        body.stock_price,
        body.notes,
    )
    .map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let call = state.trackers.add_call(call).await?;
    Ok((axum::http::StatusCode::CREATED, Json(call)))
}

pub async fn close_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CloseCall>,
) -> Result<Json<CoveredCall>, ApiError> {
    let outcome = match body.status {
        CloseStatus::Expired => CallOutcome::Expired,
        CloseStatus::CalledAway => CallOutcome::CalledAway,
        CloseStatus::BoughtBack => CallOutcome::BoughtBack {
            buyback_price: body.buyback_price.ok_or_else(|| {
                ApiError::bad_request("buyback_price is required to buy back a call")
            })?,
        },
    };
    let close_date = match body.close_date {
        Some(date) => {
            normalize_date(&date).map_err(|err| ApiError::bad_request(format!("{err:#}")))?
        }
        None => today(),
    };
    state
        .trackers
        .close_call(id, outcome, close_date, body.notes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no covered call {id}")))
}

pub async fn delete_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.trackers.delete_call(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::not_found(format!("no covered call {id}")))
    }
}

// --- daily routine ---

#[derive(Debug, Serialize)]
pub struct RoutineResponse {
    pub date: String,
    #[serde(flatten)]
    pub day: RoutineDay,
}

#[derive(Debug, Deserialize)]
pub struct SaveRoutine {
    #[serde(rename = "type")]
    pub kind: RoutineKind,
    #[serde(default)]
    pub data: RoutineFields,
}

pub async fn get_routine(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<RoutineResponse>, ApiError> {
    let day = state.trackers.routine_day(&date)?;
    Ok(Json(RoutineResponse { date, day }))
}

pub async fn save_routine(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(body): Json<SaveRoutine>,
) -> Result<Json<RoutineResponse>, ApiError> {
    let date =
        normalize_date(&date).map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let day = state
        .trackers
        .save_routine(&date, body.kind, body.data)
        .await?;
    Ok(Json(RoutineResponse { date, day }))
}

pub async fn routine_dates(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, RoutineFlags>>, ApiError> {
    Ok(Json(state.trackers.routine_dates()?))
}

// --- earnings dates ---

#[derive(Debug, Deserialize)]
pub struct SetEarnings {
    pub ticker: String,
    pub date: String,
}

pub async fn get_earnings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(state.trackers.earnings()?))
}

pub async fn set_earnings(
    State(state): State<AppState>,
    Json(body): Json<SetEarnings>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticker =
        normalize_ticker(&body.ticker).map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    let date =
        normalize_date(&body.date).map_err(|err| ApiError::bad_request(format!("{err:#}")))?;
    state.trackers.set_earnings(ticker.clone(), date.clone()).await?;
    Ok(Json(json!({ "ticker": ticker, "date": date })))
}
