use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::{self, AggregateRow, ErrorRow, SuccessRow};
use crate::store::TimeRange;
use crate::AppState;

use super::{blank_as_none, empty_as_none, RangeParams};

// ─── Request types ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end: Option<i64>,
    /// Last N seconds ending now; overrides `start` / `end`
    #[serde(default, deserialize_with = "empty_as_none")]
    pub duration: Option<u64>,
}

impl AggregateParams {
    fn range(&self, now: i64) -> TimeRange {
        match self.duration {
            Some(d) if d > 0 => {
                let span = i64::try_from(d).unwrap_or(i64::MAX);
                TimeRange::new(Some(now.saturating_sub(span)), Some(now))
            }
            _ => TimeRange::new(self.start, self.end),
        }
    }
}

// ─── Shared computations (JSON and CSV use the same rows) ────────

pub(crate) async fn aggregate_rows(
    state: &AppState,
    params: &AggregateParams,
) -> Result<Vec<AggregateRow>, AppError> {
    let label = params.label.as_deref();
    let samples = state.store.query(params.range(state.now()), label).await?;
    Ok(metrics::aggregate(&samples, label))
}

pub(crate) async fn error_rows(state: &AppState, range: RangeParams) -> Result<Vec<ErrorRow>, AppError> {
    let samples = state.store.query(range.into(), None).await?;
    Ok(metrics::error_breakdown(&samples))
}

pub(crate) async fn success_rows(
    state: &AppState,
    range: RangeParams,
) -> Result<Vec<SuccessRow>, AppError> {
    let samples = state.store.query(range.into(), None).await?;
    Ok(metrics::success_breakdown(&samples))
}

// ─── GET /api/aggregate ──────────────────────────────────────────

pub async fn get_aggregate(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AggregateParams>, QueryRejection>,
) -> Result<Json<Vec<AggregateRow>>, AppError> {
    let Query(params) = params?;
    Ok(Json(aggregate_rows(&state, &params).await?))
}

// ─── GET /api/errors ─────────────────────────────────────────────

pub async fn get_errors(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<ErrorRow>>, AppError> {
    let Query(range) = params?;
    Ok(Json(error_rows(&state, range).await?))
}

// ─── GET /api/success ────────────────────────────────────────────

pub async fn get_success(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<SuccessRow>>, AppError> {
    let Query(range) = params?;
    Ok(Json(success_rows(&state, range).await?))
}

// ─── GET /api/labels ─────────────────────────────────────────────

/// Distinct labels, for building a label filter.
pub async fn get_labels(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.labels().await?))
}
