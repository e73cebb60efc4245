use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::ingest::IngestError;
use crate::store::StoreError;

/// Every failure a handler can surface to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidPayload(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("window of {requested}s exceeds the configured maximum of {max}s")]
    WindowTooLarge { requested: u64, max: u64 },

    #[error("sample store: {0}")]
    Store(#[from] StoreError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidPayload(msg) => Self::InvalidPayload(msg),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) | Self::BadRequest(_) | Self::WindowTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
