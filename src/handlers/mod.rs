pub mod aggregate;
pub mod export;
pub mod ingest;
pub mod series;

use std::fmt::Display;
use std::str::FromStr;

use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::metrics::{Window, MAX_SERIES_SECS};
use crate::store::TimeRange;
use crate::AppState;

// ─── Shared query parameters ─────────────────────────────────────

/// `?start=&end=`: inclusive epoch seconds, either side optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RangeParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end: Option<i64>,
}

impl From<RangeParams> for TimeRange {
    fn from(params: RangeParams) -> Self {
        TimeRange::new(params.start, params.end)
    }
}

/// Treat `?start=` (as sent by export links with no filter) like a missing
/// parameter instead of a parse error.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Same as [`empty_as_none`] for free-text parameters such as `label`.
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

// ─── Window guard ────────────────────────────────────────────────

impl AppState {
    /// Resolve series bounds against the clock and the configured limits.
    pub(crate) fn series_window(
        &self,
        start: Option<i64>,
        end: Option<i64>,
        window: Option<u64>,
    ) -> Result<Window, AppError> {
        let resolved = Window::resolve(
            start,
            end,
            window,
            self.query.default_window_secs,
            self.now(),
        );

        let max = self
            .query
            .max_window_secs
            .map_or(MAX_SERIES_SECS, |max| max.min(MAX_SERIES_SECS));
        if resolved.len() > max {
            return Err(AppError::WindowTooLarge {
                requested: resolved.len(),
                max,
            });
        }
        Ok(resolved)
    }
}

// ─── GET /health ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
