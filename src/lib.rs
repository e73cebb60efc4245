//! Load-test sample ingestion and reporting.
//!
//! Load generators POST one JSON payload per request to `/metrics`; the
//! query endpoints summarize stored samples as per-label aggregates with
//! percentiles and as dense per-second throughput / concurrency / error-rate
//! series.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod ingest;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod store;

use config::{AppConfig, QueryConfig};
use ingest::Normalizer;
use store::SampleStore;

/// Source of "now" in epoch seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Where samples are appended and queried from.
    pub store: Arc<dyn SampleStore>,

    /// Payload-to-sample mapping used by the ingest endpoint.
    pub normalizer: Normalizer,

    /// Default and maximum series windows.
    pub query: QueryConfig,

    clock: Clock,
}

impl AppState {
    pub fn new(store: Arc<dyn SampleStore>, config: &AppConfig) -> Self {
        Self {
            store,
            normalizer: Normalizer {
                accept_client_timestamp: config.ingest.accept_client_timestamp,
            },
            query: config.query.clone(),
            clock: system_clock(),
        }
    }

    /// Replace the wall clock, e.g. to pin ingestion time in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> i64 {
        (self.clock)()
    }
}
