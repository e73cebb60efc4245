use std::collections::HashMap;

use serde::Serialize;

use super::{round2, Sample};

/// Failing samples grouped by `(label, status_code)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRow {
    pub label: String,
    pub status_code: String,
    pub count: u64,
    /// Distinct non-empty error messages, comma-joined in first-seen order
    pub message: String,
}

/// Successful samples grouped by label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessRow {
    pub label: String,
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

pub fn error_breakdown(samples: &[Sample]) -> Vec<ErrorRow> {
    let mut groups: HashMap<(&str, &str), (u64, Vec<&str>)> = HashMap::new();

    for sample in samples.iter().filter(|s| !s.success) {
        let (count, messages) = groups
            .entry((sample.label.as_str(), sample.status_code.as_str()))
            .or_default();
        *count += 1;
        let msg = sample.error_message.as_str();
        if !msg.is_empty() && !messages.contains(&msg) {
            messages.push(msg);
        }
    }

    let mut rows: Vec<ErrorRow> = groups
        .into_iter()
        .map(|((label, status_code), (count, messages))| ErrorRow {
            label: label.to_owned(),
            status_code: status_code.to_owned(),
            count,
            message: messages.join(","),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.status_code.cmp(&b.status_code))
    });
    rows
}

pub fn success_breakdown(samples: &[Sample]) -> Vec<SuccessRow> {
    // label -> (count, sum, min, max)
    let mut groups: HashMap<&str, (u64, f64, f64, f64)> = HashMap::new();

    for sample in samples.iter().filter(|s| s.success) {
        let rt = sample.response_time;
        groups
            .entry(sample.label.as_str())
            .and_modify(|(count, sum, min, max)| {
                *count += 1;
                *sum += rt;
                *min = min.min(rt);
                *max = max.max(rt);
            })
            .or_insert((1, rt, rt, rt));
    }

    let mut rows: Vec<SuccessRow> = groups
        .into_iter()
        .map(|(label, (count, sum, min, max))| SuccessRow {
            label: label.to_owned(),
            count,
            avg: round2(sum / count as f64),
            min,
            max,
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}
