use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IngestAck {
    pub status: &'static str,
}

// ─── POST /metrics ───────────────────────────────────────────────

/// Accepts one sample per call in whatever shape the load generator's
/// backend listener emits. Retries are stored as separate samples.
pub async fn receive_metrics(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IngestAck>, AppError> {
    let sample = state.normalizer.normalize_bytes(&body, state.now())?;
    debug!(
        label = %sample.label,
        response_time = sample.response_time,
        success = sample.success,
        "sample ingested"
    );

    state.store.append(sample).await?;

    Ok(Json(IngestAck { status: "ok" }))
}
