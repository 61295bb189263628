//! Handlers for `/dashboard` and `/alerts`.

use agrisense_core::{
  alert::AlertRecord,
  assistant::Backend,
  store::{DashboardMetrics, HistoryStore},
};
use axum::{Json, extract::State};

use crate::{AppState, error::ApiError};

/// `GET /dashboard`: the three farmer-dashboard counters.
pub async fn metrics<B: Backend>(
  State(state): State<AppState<B>>,
) -> Result<Json<DashboardMetrics>, ApiError> {
  let metrics = DashboardMetrics::load(state.assistant.store().as_ref())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(metrics))
}

/// `GET /alerts`
pub async fn alerts<B: Backend>(
  State(state): State<AppState<B>>,
) -> Result<Json<Vec<AlertRecord>>, ApiError> {
  let alerts = state
    .assistant
    .store()
    .list_alerts()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(alerts))
}
