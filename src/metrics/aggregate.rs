use std::collections::HashMap;

use serde::Serialize;

use super::percentiles::PercentileSet;
use super::{percent, round2, Sample};

// ─── Public types ────────────────────────────────────────────────

/// Per-label summary returned by the aggregate query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub label: String,
    pub count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub error_pct: f64,
}

// ─── Accumulator ─────────────────────────────────────────────────

/// Response times and error tally for one label.
#[derive(Default)]
struct LabelAccumulator {
    response_times: Vec<f64>,
    errors: u64,
}

impl LabelAccumulator {
    fn push(&mut self, sample: &Sample) {
        self.response_times.push(sample.response_time);
        if !sample.success {
            self.errors += 1;
        }
    }

    fn finish(mut self, label: String) -> AggregateRow {
        self.response_times.sort_by(|a, b| a.total_cmp(b));
        let times = &self.response_times;

        let count = times.len() as u64;
        let (avg, min, max) = match (times.first(), times.last()) {
            (Some(&min), Some(&max)) => {
                let sum: f64 = times.iter().sum();
                (round2(sum / count as f64), min, max)
            }
            _ => (0.0, 0.0, 0.0),
        };
        let pcts = PercentileSet::from_sorted(times);

        AggregateRow {
            label,
            count,
            success_count: count - self.errors,
            error_count: self.errors,
            avg,
            min,
            max,
            p90: pcts.p90,
            p95: pcts.p95,
            p99: pcts.p99,
            error_pct: percent(self.errors, count),
        }
    }
}

// ─── Engine ──────────────────────────────────────────────────────

/// Group `samples` by label and summarise each group.
///
/// When `label` is given only that label's row is produced. Rows are ordered
/// by descending count, ties broken by label so repeated queries over the same
/// samples always return the same output.
pub fn aggregate(samples: &[Sample], label: Option<&str>) -> Vec<AggregateRow> {
    let mut groups: HashMap<&str, LabelAccumulator> = HashMap::new();

    for sample in samples {
        if label.is_some_and(|l| l != sample.label) {
            continue;
        }
        groups.entry(sample.label.as_str()).or_default().push(sample);
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(label, acc)| acc.finish(label.to_owned()))
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}
