use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;
use crate::metrics::timeseries::SeriesMetric;
use crate::metrics::{build_series, Concurrency, ErrorRate, Throughput, TimeSeries, Window};
use crate::AppState;

use super::{blank_as_none, empty_as_none};

// ─── Request types ───────────────────────────────────────────────

/// `?window=&end=` for the throughput and concurrency charts.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WindowParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub window: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end: Option<i64>,
}

/// The error-rate chart also takes an explicit `start` and a label filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorRateParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub window: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub label: Option<String>,
}

/// Fetch the window's samples and reduce them to a dense series.
async fn series<M: SeriesMetric>(
    state: &AppState,
    window: Window,
    label: Option<&str>,
) -> Result<TimeSeries<M::Value>, AppError> {
    if window.is_empty() {
        return Ok(build_series::<M>(&[], window));
    }

    let samples = state.store.query(window.into(), label).await?;
    debug!(
        start = window.start,
        end = window.end,
        samples = samples.len(),
        "building series"
    );
    Ok(build_series::<M>(&samples, window))
}

// ─── GET /api/tps ────────────────────────────────────────────────

pub async fn get_throughput(
    State(state): State<Arc<AppState>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<TimeSeries<u64>>, AppError> {
    let Query(p) = params?;
    let window = state.series_window(None, p.end, p.window)?;
    Ok(Json(series::<Throughput>(&state, window, None).await?))
}

// ─── GET /api/threads ────────────────────────────────────────────

pub async fn get_concurrency(
    State(state): State<Arc<AppState>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<TimeSeries<f64>>, AppError> {
    let Query(p) = params?;
    let window = state.series_window(None, p.end, p.window)?;
    Ok(Json(series::<Concurrency>(&state, window, None).await?))
}

// ─── GET /api/errorpct ───────────────────────────────────────────

pub async fn get_error_rate(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ErrorRateParams>, QueryRejection>,
) -> Result<Json<TimeSeries<f64>>, AppError> {
    let Query(p) = params?;
    // window=0 means "not given" here, so `start` or the default applies
    let window = state.series_window(p.start, p.end, p.window.filter(|w| *w > 0))?;
    Ok(Json(
        series::<ErrorRate>(&state, window, p.label.as_deref()).await?,
    ))
}
