use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{SampleStore, StoreError, TimeRange};
use crate::metrics::Sample;

/// Process-local store. Appends take the write lock for a single push;
/// queries copy matching samples out under the read lock.
#[derive(Default)]
pub struct MemoryStore {
    samples: RwLock<Vec<Sample>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn append(&self, sample: Sample) -> Result<(), StoreError> {
        self.samples.write().push(sample);
        Ok(())
    }

    async fn query(&self, range: TimeRange, label: Option<&str>) -> Result<Vec<Sample>, StoreError> {
        let samples = self.samples.read();
        Ok(samples
            .iter()
            .filter(|s| range.contains(s.timestamp))
            .filter(|s| label.map_or(true, |l| s.label == l))
            .cloned()
            .collect())
    }

    async fn labels(&self) -> Result<Vec<String>, StoreError> {
        let samples = self.samples.read();
        let labels: BTreeSet<&str> = samples.iter().map(|s| s.label.as_str()).collect();
        Ok(labels.into_iter().map(str::to_owned).collect())
    }
}
