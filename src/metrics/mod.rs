pub mod aggregate;
pub mod breakdown;
pub mod percentiles;
pub mod timeseries;

pub use aggregate::{aggregate, AggregateRow};
pub use breakdown::{error_breakdown, success_breakdown, ErrorRow, SuccessRow};
pub use timeseries::{
    build_series, Concurrency, ErrorRate, Throughput, TimeSeries, Window, MAX_SERIES_SECS,
};

use serde::{Deserialize, Serialize};

/// Label assigned to samples that arrive without one.
pub const DEFAULT_LABEL: &str = "ALL";

/// Status code assigned to samples that arrive without one.
pub const DEFAULT_STATUS_CODE: &str = "200";

/// One request observed during a load test, as stored.
/// This is the "write" side: the ingest normalizer builds these and the
/// store hands them back to the query engines unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch seconds at which the sample was ingested
    pub timestamp: i64,
    /// Operation / sampler name, e.g. "Login"
    pub label: String,
    /// Response time in milliseconds (never negative)
    pub response_time: f64,
    pub success: bool,
    /// Active threads reported by the load generator
    pub thread_count: u64,
    pub status_code: String,
    /// Always empty for successful samples
    pub error_message: String,
}

/// Round half away from zero to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

#[cfg(test)]
pub(crate) fn sample(timestamp: i64, label: &str, response_time: f64, success: bool) -> Sample {
    Sample {
        timestamp,
        label: label.into(),
        response_time,
        success,
        thread_count: 0,
        status_code: if success { "200" } else { "500" }.into(),
        error_message: if success { String::new() } else { "Internal Server Error".into() },
    }
}
