//! CSV renderings of the aggregate, errors and success tables.
//!
//! These only format rows the query engines already produced; nothing here
//! re-derives statistics.

use crate::metrics::{AggregateRow, ErrorRow, SuccessRow};

pub const AGGREGATE_HEADER: &[&str] = &["Label", "Count", "Avg", "Min", "Max", "90%", "95%", "99%", "Error %"];
pub const ERRORS_HEADER: &[&str] = &["Label", "Status Code", "Count", "Messages"];
pub const SUCCESS_HEADER: &[&str] = &["Label", "Count", "Avg", "Min", "Max"];

pub fn aggregate_csv(rows: &[AggregateRow]) -> String {
    render(
        AGGREGATE_HEADER,
        rows.iter().map(|r| {
            vec![
                r.label.clone(),
                r.count.to_string(),
                r.avg.to_string(),
                r.min.to_string(),
                r.max.to_string(),
                optional(r.p90),
                optional(r.p95),
                optional(r.p99),
                r.error_pct.to_string(),
            ]
        }),
    )
}

pub fn errors_csv(rows: &[ErrorRow]) -> String {
    render(
        ERRORS_HEADER,
        rows.iter().map(|r| {
            vec![
                r.label.clone(),
                r.status_code.clone(),
                r.count.to_string(),
                r.message.clone(),
            ]
        }),
    )
}

pub fn success_csv(rows: &[SuccessRow]) -> String {
    render(
        SUCCESS_HEADER,
        rows.iter().map(|r| {
            vec![
                r.label.clone(),
                r.count.to_string(),
                r.avg.to_string(),
                r.min.to_string(),
                r.max.to_string(),
            ]
        }),
    )
}

fn render(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut out = String::new();
    push_line(&mut out, header.iter().copied());
    for row in rows {
        push_line(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_escape(field));
    }
    out.push_str("\r\n");
}

/// Undefined percentiles become empty cells.
fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
