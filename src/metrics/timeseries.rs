use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::Serialize;

use super::{percent, round2, Sample};

// ─── Window ──────────────────────────────────────────────────────

/// Longest series any request may ask for (31 days), whatever the config says.
/// Series are dense, so this bounds the per-request allocation.
pub const MAX_SERIES_SECS: u64 = 31 * 24 * 60 * 60;

/// Closed interval of epoch seconds `[start, end]`.
/// A window with `start > end` is valid and empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Resolve optional query bounds into a concrete window.
    ///
    /// `end` defaults to `now`. An explicit `window` length wins over `start`
    /// (`start = end - window + 1`); otherwise a missing `start` falls back to
    /// the last `default_window` seconds ending at `end`.
    pub fn resolve(
        start: Option<i64>,
        end: Option<i64>,
        window: Option<u64>,
        default_window: u64,
        now: i64,
    ) -> Self {
        let end = end.unwrap_or(now);
        let span = |len: u64| {
            end.saturating_sub(i64::try_from(len).unwrap_or(i64::MAX))
                .saturating_add(1)
        };

        let start = match (window, start) {
            (Some(len), _) => span(len),
            (None, Some(start)) => start,
            (None, None) => span(default_window),
        };
        Self { start, end }
    }

    /// Number of seconds covered, 0 when `start > end`.
    pub fn len(&self) -> u64 {
        if self.start > self.end {
            0
        } else {
            self.end.abs_diff(self.start).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, second: i64) -> bool {
        self.start <= second && second <= self.end
    }

    pub fn seconds(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }
}

// ─── Series ──────────────────────────────────────────────────────

/// Dense per-second series: `timestamps[i]` is `start + i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries<V> {
    pub timestamps: Vec<i64>,
    pub values: Vec<V>,
}

impl<V> TimeSeries<V> {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Running totals for the samples that fell into one second.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bucket {
    pub count: u64,
    pub errors: u64,
    pub thread_sum: u64,
}

impl Bucket {
    fn push(&mut self, sample: &Sample) {
        self.count += 1;
        if !sample.success {
            self.errors += 1;
        }
        self.thread_sum = self.thread_sum.saturating_add(sample.thread_count);
    }
}

/// How a populated bucket is reduced to a point on the chart.
/// Empty seconds take `Value::default()`.
pub trait SeriesMetric {
    type Value: Copy + Default + Serialize;

    fn reduce(bucket: &Bucket) -> Self::Value;
}

/// Samples per second.
pub struct Throughput;

impl SeriesMetric for Throughput {
    type Value = u64;

    fn reduce(bucket: &Bucket) -> u64 {
        bucket.count
    }
}

/// Mean active thread count per second.
pub struct Concurrency;

impl SeriesMetric for Concurrency {
    type Value = f64;

    fn reduce(bucket: &Bucket) -> f64 {
        if bucket.count == 0 {
            return 0.0;
        }
        round2(bucket.thread_sum as f64 / bucket.count as f64)
    }
}

/// Percentage of failing samples per second.
pub struct ErrorRate;

impl SeriesMetric for ErrorRate {
    type Value = f64;

    fn reduce(bucket: &Bucket) -> f64 {
        percent(bucket.errors, bucket.count)
    }
}

/// Bucket `samples` by second and emit exactly one value for every second of
/// `window`, gap-filled with the metric's zero. Samples outside the window are
/// ignored, so callers may pass an over-broad slice.
pub fn build_series<M: SeriesMetric>(samples: &[Sample], window: Window) -> TimeSeries<M::Value> {
    let mut buckets: HashMap<i64, Bucket> = HashMap::new();
    for sample in samples.iter().filter(|s| window.contains(s.timestamp)) {
        buckets.entry(sample.timestamp).or_default().push(sample);
    }

    let len = window.len() as usize;
    let mut series = TimeSeries {
        timestamps: Vec::with_capacity(len),
        values: Vec::with_capacity(len),
    };

    for second in window.seconds() {
        series.timestamps.push(second);
        series
            .values
            .push(buckets.get(&second).map(M::reduce).unwrap_or_default());
    }

    series
}
