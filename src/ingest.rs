//! Maps the loosely-shaped JSON that load generators post into a [`Sample`].
//!
//! Backend listeners disagree on field names (`label` vs `sampler`,
//! `responseTime` vs `avg`, ...), so every field is resolved through a
//! prioritized alias list with a typed default.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::metrics::{Sample, DEFAULT_LABEL, DEFAULT_STATUS_CODE};

const LABEL_KEYS: &[&str] = &["label", "sampler"];
const RESPONSE_TIME_KEYS: &[&str] = &["responseTime", "avgResponseTime", "avg"];
const STATUS_CODE_KEYS: &[&str] = &["statusCode", "rc"];
const ERROR_MESSAGE_KEYS: &[&str] = &["errorMessage", "errorMsg"];
const THREAD_KEYS: &[&str] = &["activeThreads", "threads"];

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

fn invalid(msg: impl Into<String>) -> IngestError {
    IngestError::InvalidPayload(msg.into())
}

/// Knobs that change how payloads are turned into samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    /// Honor an integer `timestamp` field (epoch seconds) instead of the
    /// ingestion time.
    pub accept_client_timestamp: bool,
}

impl Normalizer {
    /// Parse a raw request body and normalize it.
    pub fn normalize_bytes(&self, body: &[u8], now: i64) -> Result<Sample, IngestError> {
        let payload: Value =
            serde_json::from_slice(body).map_err(|e| invalid(format!("malformed JSON: {e}")))?;
        self.normalize(&payload, now)
    }

    /// Build a sample from an already-parsed payload. `now` is the ingestion
    /// time in epoch seconds.
    pub fn normalize(&self, payload: &Value, now: i64) -> Result<Sample, IngestError> {
        let obj = match payload {
            Value::Object(obj) if !obj.is_empty() => obj,
            Value::Object(_) => return Err(invalid("empty object")),
            _ => return Err(invalid("expected a JSON object")),
        };

        let label = first_present(obj, LABEL_KEYS)
            .and_then(string_of)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL.to_owned());

        let response_time = match first_present(obj, RESPONSE_TIME_KEYS) {
            Some(v) => number_of(v).ok_or_else(|| invalid("responseTime is not a number"))?,
            None => 0.0,
        };
        if !response_time.is_finite() || response_time < 0.0 {
            return Err(invalid("responseTime must be a non-negative number"));
        }

        let success = match (obj.get("success").filter(|v| !v.is_null()), obj.get("errorPct")) {
            (Some(v), _) => truthy(v).ok_or_else(|| invalid("success is not a boolean"))?,
            (None, Some(pct)) if !pct.is_null() => {
                number_of(pct).ok_or_else(|| invalid("errorPct is not a number"))? <= 0.0
            }
            _ => true,
        };

        let status_code = first_present(obj, STATUS_CODE_KEYS)
            .and_then(string_of)
            .unwrap_or_else(|| DEFAULT_STATUS_CODE.to_owned());

        // Failures always carry some text so the errors table has a message.
        let error_message = if success {
            String::new()
        } else {
            first_present(obj, ERROR_MESSAGE_KEYS)
                .and_then(string_of)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("status {status_code}"))
        };

        let thread_count = match first_present(obj, THREAD_KEYS) {
            Some(v) => count_of(v).ok_or_else(|| invalid("activeThreads is not a count"))?,
            None => 0,
        };

        let timestamp = match obj.get("timestamp").and_then(Value::as_i64) {
            Some(ts) if self.accept_client_timestamp => ts,
            _ => now,
        };

        Ok(Sample {
            timestamp,
            label,
            response_time,
            success,
            thread_count,
            status_code,
            error_message,
        })
    }
}

// ─── Field helpers ───────────────────────────────────────────────

/// First alias whose key is present with a non-null value.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && n.is_f64() => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn normalize(payload: Value) -> Result<Sample, IngestError> {
        Normalizer::default().normalize(&payload, NOW)
    }

    #[test]
    fn defaults_for_minimal_payload() {
        let sample = normalize(json!({"foo": 1})).unwrap();
        assert_eq!(
            sample,
            Sample {
                timestamp: NOW,
                label: "ALL".into(),
                response_time: 0.0,
                success: true,
                thread_count: 0,
                status_code: "200".into(),
                error_message: String::new(),
            }
        );
    }

    #[test]
    fn primary_keys_win_over_aliases() {
        let sample = normalize(json!({
            "label": "Login",
            "sampler": "ignored",
            "responseTime": 120.5,
            "avg": 999,
            "statusCode": "201",
            "rc": "500",
            "activeThreads": 8,
            "threads": 2,
        }))
        .unwrap();

        assert_eq!(sample.label, "Login");
        assert_eq!(sample.response_time, 120.5);
        assert_eq!(sample.status_code, "201");
        assert_eq!(sample.thread_count, 8);
    }

    #[test]
    fn aliases_are_used_when_primary_missing() {
        let sample = normalize(json!({
            "sampler": "Checkout",
            "avgResponseTime": "87.25",
            "rc": 404,
            "threads": "12",
            "success": false,
            "errorMsg": "Not Found",
        }))
        .unwrap();

        assert_eq!(sample.label, "Checkout");
        assert_eq!(sample.response_time, 87.25);
        assert_eq!(sample.status_code, "404");
        assert_eq!(sample.thread_count, 12);
        assert!(!sample.success);
        assert_eq!(sample.error_message, "Not Found");
    }

    #[test]
    fn error_pct_decides_success_when_flag_absent() {
        assert!(!normalize(json!({"errorPct": 12.5})).unwrap().success);
        assert!(normalize(json!({"errorPct": 0})).unwrap().success);
        // explicit flag beats errorPct
        assert!(normalize(json!({"success": true, "errorPct": 50})).unwrap().success);
    }

    #[test]
    fn failure_without_message_gets_status_text() {
        let sample = normalize(json!({"success": false, "rc": "502"})).unwrap();
        assert_eq!(sample.error_message, "status 502");
    }

    #[test]
    fn error_message_cleared_on_success() {
        let sample = normalize(json!({"success": true, "errorMessage": "stale"})).unwrap();
        assert_eq!(sample.error_message, "");
    }

    #[test]
    fn null_values_fall_through_to_next_alias() {
        let sample = normalize(json!({"label": null, "sampler": "Search", "responseTime": null, "avg": 3})).unwrap();
        assert_eq!(sample.label, "Search");
        assert_eq!(sample.response_time, 3.0);
    }

    #[test]
    fn empty_label_uses_default() {
        assert_eq!(normalize(json!({"label": ""})).unwrap().label, "ALL");
    }

    #[test]
    fn rejects_non_objects() {
        for payload in [json!([1, 2]), json!("text"), json!(42), json!(null), json!({})] {
            assert!(matches!(normalize(payload), Err(IngestError::InvalidPayload(_))));
        }
        assert!(Normalizer::default().normalize_bytes(b"{not json", NOW).is_err());
    }

    #[test]
    fn rejects_bad_field_values() {
        assert!(normalize(json!({"responseTime": -1})).is_err());
        assert!(normalize(json!({"responseTime": "fast"})).is_err());
        assert!(normalize(json!({"activeThreads": -3})).is_err());
        assert!(normalize(json!({"success": "maybe"})).is_err());
    }

    #[test]
    fn client_timestamp_needs_opt_in() {
        let payload = json!({"label": "Login", "timestamp": 1_600_000_000});
        assert_eq!(normalize(payload.clone()).unwrap().timestamp, NOW);

        let trusting = Normalizer { accept_client_timestamp: true };
        assert_eq!(trusting.normalize(&payload, NOW).unwrap().timestamp, 1_600_000_000);
    }
}
