use serde::Serialize;

use super::round2;

/// Linear-interpolation percentile over an ascending-sorted slice.
///
/// The rank is `k = (n - 1) * p / 100`. An integral `k` selects that element
/// directly; otherwise the result is interpolated between `floor(k)` and
/// `ceil(k)`, weighted by the fractional part. `p` is clamped to `[0, 100]`.
///
/// Returns `None` for an empty slice: callers report an absent value, not 0.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let k = last as f64 * p.clamp(0.0, 100.0) / 100.0;
    let lo = k.floor() as usize;
    let hi = (k.ceil() as usize).min(last);

    if lo == hi {
        return Some(sorted[lo]);
    }

    let (a, b) = (sorted[lo], sorted[hi]);
    let value = a + (b - a) * (k - lo as f64);
    Some(value.clamp(a.min(b), a.max(b)))
}

/// The tail percentiles reported on every aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileSet {
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
}

impl PercentileSet {
    /// Compute p90/p95/p99 from sorted response times, rounded to 2 decimals.
    /// Every field is `None` when there are no observations.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        let at = |p| percentile(sorted, p).map(round2);
        Self {
            p90: at(90.0),
            p95: at(95.0),
            p99: at(99.0),
        }
    }
}
