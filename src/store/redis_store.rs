use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{SampleStore, StoreError, TimeRange};
use crate::metrics::Sample;

/// Samples kept in a Redis sorted set scored by timestamp.
///
/// Every member carries a fresh UUID so that two identical samples (a retried
/// ingest, say) stay two members instead of collapsing into one. Labels are
/// mirrored into a plain set at `<key>:labels`.
///
/// `ConnectionManager` is cheaply cloneable and auto-reconnects; every clone
/// shares the same multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    key: String,
    labels_key: String,
}

/// What is actually written as a sorted-set member.
#[derive(Serialize, Deserialize)]
struct Envelope {
    id: Uuid,
    #[serde(flatten)]
    sample: Sample,
}

impl RedisStore {
    pub async fn connect(url: &str, key: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::with_connection(conn, key))
    }

    pub fn with_connection(conn: ConnectionManager, key: &str) -> Self {
        Self {
            conn,
            key: key.to_owned(),
            labels_key: format!("{key}:labels"),
        }
    }
}

/// `ZRANGEBYSCORE` bound for an optional inclusive limit.
fn score_bound(bound: Option<i64>, open: &str) -> String {
    bound.map_or_else(|| open.to_owned(), |b| b.to_string())
}

#[async_trait]
impl SampleStore for RedisStore {
    async fn append(&self, sample: Sample) -> Result<(), StoreError> {
        let score = sample.timestamp;
        let label = sample.label.clone();
        let member = serde_json::to_string(&Envelope {
            id: Uuid::new_v4(),
            sample,
        })?;

        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .zadd(&self.key, member, score)
            .ignore()
            .sadd(&self.labels_key, label)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn query(&self, range: TimeRange, label: Option<&str>) -> Result<Vec<Sample>, StoreError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(&self.key)
            .arg(score_bound(range.start, "-inf"))
            .arg(score_bound(range.end, "+inf"))
            .query_async(&mut conn)
            .await?;
        debug!(key = %self.key, fetched = members.len(), "range query");

        let mut samples = Vec::with_capacity(members.len());
        for member in &members {
            let Envelope { sample, .. } = serde_json::from_str(member)?;
            if label.map_or(true, |l| sample.label == l) {
                samples.push(sample);
            }
        }
        Ok(samples)
    }

    async fn labels(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut labels: Vec<String> = redis::cmd("SMEMBERS")
            .arg(&self.labels_key)
            .query_async(&mut conn)
            .await?;
        labels.sort();
        Ok(labels)
    }
}
