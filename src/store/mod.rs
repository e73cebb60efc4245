//! Append-only sample persistence behind a backend-agnostic trait.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::metrics::{Sample, Window};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("stored sample could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Inclusive epoch-second bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start.map_or(true, |s| s <= timestamp) && self.end.map_or(true, |e| timestamp <= e)
    }
}

impl From<Window> for TimeRange {
    fn from(window: Window) -> Self {
        Self::new(Some(window.start), Some(window.end))
    }
}

/// Anything that can keep samples and hand them back by time range and label.
///
/// Appends are atomic per sample. A query running concurrently with an append
/// may or may not observe it.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn append(&self, sample: Sample) -> Result<(), StoreError>;

    /// Samples with `range.start <= timestamp <= range.end`, restricted to
    /// `label` when given. Order is unspecified.
    async fn query(&self, range: TimeRange, label: Option<&str>) -> Result<Vec<Sample>, StoreError>;

    /// Distinct labels seen so far, sorted.
    async fn labels(&self) -> Result<Vec<String>, StoreError>;
}

/// Build the backend selected in configuration.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn SampleStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("using in-memory sample store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            info!(url = %config.redis_url, key = %config.redis_key, "using redis sample store");
            let store = RedisStore::connect(&config.redis_url, &config.redis_key).await?;
            Ok(Arc::new(store))
        }
    }
}
