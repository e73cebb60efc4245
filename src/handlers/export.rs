use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::export;
use crate::AppState;

use super::aggregate::{aggregate_rows, error_rows, success_rows, AggregateParams};
use super::RangeParams;

/// Wrap CSV text as a file download.
fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}

// ─── GET /download/aggregate.csv ─────────────────────────────────

pub async fn aggregate_csv(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AggregateParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let rows = aggregate_rows(&state, &params).await?;
    Ok(csv_attachment("aggregate.csv", export::aggregate_csv(&rows)))
}

// ─── GET /download/errors.csv ────────────────────────────────────

pub async fn errors_csv(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(range) = params?;
    let rows = error_rows(&state, range).await?;
    Ok(csv_attachment("errors.csv", export::errors_csv(&rows)))
}

// ─── GET /download/success.csv ───────────────────────────────────

pub async fn success_csv(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(range) = params?;
    let rows = success_rows(&state, range).await?;
    Ok(csv_attachment("success.csv", export::success_csv(&rows)))
}
