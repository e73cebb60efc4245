//! HTTP-level tests: the real router over an in-memory store, driven with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use loadscope::config::AppConfig;
use loadscope::metrics::{Sample, MAX_SERIES_SECS};
use loadscope::store::{MemoryStore, SampleStore};
use loadscope::{server, AppState};

const T: i64 = 1_700_000_000;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

fn test_app_with(config: AppConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), &config).with_clock(Arc::new(|| T));
    TestApp {
        router: server::create_router(Arc::new(state)),
        store,
    }
}

fn test_app() -> TestApp {
    test_app_with(AppConfig::default())
}

fn stored(timestamp: i64, label: &str, success: bool, threads: u64) -> Sample {
    Sample {
        timestamp,
        label: label.into(),
        response_time: 10.0,
        success,
        thread_count: threads,
        status_code: if success { "200" } else { "500" }.into(),
        error_message: if success { String::new() } else { "boom".into() },
    }
}

impl TestApp {
    async fn seed(&self, samples: impl IntoIterator<Item = Sample>) {
        for s in samples {
            self.store.append(s).await.unwrap();
        }
    }

    async fn post(&self, uri: &str, body: &str) -> Result<(StatusCode, Value)> {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_owned()))?,
            )
            .await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    async fn get_raw(&self, uri: &str) -> Result<axum::response::Response> {
        Ok(self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?)
    }

    async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        let response = self.get_raw(uri).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }
}

// ─── Ingest ──────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_then_aggregate_login() -> Result<()> {
    let app = test_app();
    for rt in [100, 200, 300] {
        let (status, body) = app
            .post("/metrics", &json!({"label": "Login", "responseTime": rt, "success": true}).to_string())
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    let (status, rows) = app.get("/api/aggregate").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        rows,
        json!([{
            "label": "Login",
            "count": 3,
            "success_count": 3,
            "error_count": 0,
            "avg": 200.0,
            "min": 100.0,
            "max": 300.0,
            "p90": 280.0,
            "p95": 290.0,
            "p99": 298.0,
            "error_pct": 0.0,
        }])
    );
    Ok(())
}

#[tokio::test]
async fn ingest_stamps_arrival_time() -> Result<()> {
    let app = test_app();
    app.post("/metrics", r#"{"sampler": "Search", "timestamp": 5}"#).await?;

    let all = app.store.query(Default::default(), None).await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].timestamp, T);
    assert_eq!(all[0].label, "Search");
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_write_nothing() -> Result<()> {
    let app = test_app();
    for body in ["[1,2,3]", "not json", "{}", r#"{"responseTime": -4}"#] {
        let (status, err) = app.post("/metrics", body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(err["status"], 400);
    }
    assert!(app.store.is_empty());
    Ok(())
}

#[tokio::test]
async fn retried_ingest_is_counted_twice() -> Result<()> {
    let app = test_app();
    let payload = r#"{"label": "Pay", "avg": 42}"#;
    app.post("/metrics", payload).await?;
    app.post("/metrics", payload).await?;

    let (_, rows) = app.get("/api/aggregate?label=Pay").await?;
    assert_eq!(rows[0]["count"], 2);
    Ok(())
}

// ─── Aggregate filters ───────────────────────────────────────────

#[tokio::test]
async fn aggregate_respects_range_and_label() -> Result<()> {
    let app = test_app();
    app.seed([
        stored(T - 10, "Login", true, 1),
        stored(T - 5, "Login", false, 1),
        stored(T - 5, "Pay", true, 1),
        stored(T, "Pay", true, 1),
    ])
    .await;

    let (_, rows) = app.get(&format!("/api/aggregate?start={}&end={}", T - 5, T - 5)).await?;
    let labels: Vec<_> = rows.as_array().unwrap().iter().map(|r| r["label"].clone()).collect();
    assert_eq!(labels, vec![json!("Login"), json!("Pay")]);
    assert_eq!(rows[0]["error_pct"], 100.0);

    let (_, rows) = app.get("/api/aggregate?label=Pay&start=&end=").await?;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["count"], 2);

    // last 5 seconds ending at the pinned clock
    let (_, rows) = app.get("/api/aggregate?duration=5").await?;
    let counts: Vec<_> = rows.as_array().unwrap().iter().map(|r| r["count"].clone()).collect();
    assert_eq!(counts, vec![json!(2), json!(1)]);
    Ok(())
}

#[tokio::test]
async fn empty_store_queries() -> Result<()> {
    let app = test_app();

    let (status, rows) = app.get("/api/aggregate").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows, json!([]));

    let (_, series) = app.get(&format!("/api/tps?window=6&end={}", T + 5)).await?;
    assert_eq!(series["timestamps"], json!([T, T + 1, T + 2, T + 3, T + 4, T + 5]));
    assert_eq!(series["values"], json!([0, 0, 0, 0, 0, 0]));
    Ok(())
}

#[tokio::test]
async fn malformed_query_is_bad_request() -> Result<()> {
    let app = test_app();
    let (status, body) = app.get("/api/aggregate?start=yesterday").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    Ok(())
}

// ─── Series ──────────────────────────────────────────────────────

#[tokio::test]
async fn throughput_gap_is_zero_filled() -> Result<()> {
    let app = test_app();
    app.seed([stored(T, "Pay", true, 1), stored(T + 2, "Pay", true, 1)]).await;

    let (_, series) = app.get(&format!("/api/tps?window=3&end={}", T + 2)).await?;
    assert_eq!(series["values"], json!([1, 0, 1]));
    Ok(())
}

#[tokio::test]
async fn default_window_ends_now() -> Result<()> {
    let app = test_app();
    app.seed([stored(T, "Pay", true, 4)]).await;

    let (_, series) = app.get("/api/threads").await?;
    let values = series["values"].as_array().unwrap();
    assert_eq!(values.len(), 60);
    assert_eq!(series["timestamps"][0], T - 59);
    assert_eq!(values[59], 4.0);
    Ok(())
}

#[tokio::test]
async fn error_rate_per_second_with_label() -> Result<()> {
    let app = test_app();
    app.seed([
        stored(T, "Pay", true, 1),
        stored(T, "Pay", false, 1),
        stored(T, "Login", false, 1),
    ])
    .await;

    let (_, series) = app.get(&format!("/api/errorpct?start={T}&end={T}&label=Pay")).await?;
    assert_eq!(series["values"], json!([50.0]));

    let (_, series) = app.get(&format!("/api/errorpct?start={T}&end={T}")).await?;
    assert_eq!(series["values"], json!([66.67]));
    Ok(())
}

#[tokio::test]
async fn inverted_window_gives_empty_series() -> Result<()> {
    let app = test_app();
    let (status, series) = app.get(&format!("/api/errorpct?start={}&end={T}", T + 1)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(series, json!({"timestamps": [], "values": []}));
    Ok(())
}

#[tokio::test]
async fn oversized_window_is_rejected_when_capped() -> Result<()> {
    let mut config = AppConfig::default();
    config.query.max_window_secs = Some(300);
    let app = test_app_with(config);

    let (status, body) = app.get("/api/tps?window=301").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("300"));

    let (status, _) = app.get("/api/tps?window=300").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn huge_window_is_rejected_without_a_configured_cap() -> Result<()> {
    let app = test_app();

    let (status, body) = app.get("/api/tps?window=100000000000000").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = app
        .get(&format!("/api/errorpct?start={}&end={}", i64::MIN, i64::MAX))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get(&format!("/api/threads?window={MAX_SERIES_SECS}")).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn series_end_at_the_upper_limit_does_not_overflow() -> Result<()> {
    let app = test_app();
    let (status, series) = app
        .get(&format!("/api/tps?window=0&end={}", i64::MAX))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(series["timestamps"], json!([i64::MAX]));
    Ok(())
}

#[tokio::test]
async fn error_rate_treats_zero_window_as_absent() -> Result<()> {
    let app = test_app();
    app.seed([stored(T - 1, "Pay", false, 1), stored(T - 1, "Pay", true, 1)])
        .await;

    let (status, series) = app.get("/api/errorpct?window=0").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(series["timestamps"].as_array().map(Vec::len), Some(60));
    assert_eq!(series["values"][58], json!(50.0));

    let (_, series) = app
        .get(&format!("/api/errorpct?window=0&start={}&end={T}", T - 1))
        .await?;
    assert_eq!(series["timestamps"], json!([T - 1, T]));
    Ok(())
}

// ─── Breakdowns, labels, exports ─────────────────────────────────

#[tokio::test]
async fn errors_and_success_tables() -> Result<()> {
    let app = test_app();
    app.seed([
        stored(T, "Pay", false, 1),
        stored(T, "Pay", false, 1),
        stored(T, "Login", true, 1),
    ])
    .await;

    let (_, errors) = app.get("/api/errors").await?;
    assert_eq!(
        errors,
        json!([{"label": "Pay", "status_code": "500", "count": 2, "message": "boom"}])
    );

    let (_, success) = app.get(&format!("/api/success?end={}", T - 1)).await?;
    assert_eq!(success, json!([]));

    let (_, labels) = app.get("/api/labels").await?;
    assert_eq!(labels, json!(["Login", "Pay"]));
    Ok(())
}

#[tokio::test]
async fn aggregate_csv_download() -> Result<()> {
    let app = test_app();
    app.seed([stored(T, "Login", true, 1)]).await;

    let response = app.get_raw("/download/aggregate.csv?label=&start=&end=").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=aggregate.csv"
    );
    assert!(response.headers().contains_key("x-response-time-us"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(
        std::str::from_utf8(&bytes)?,
        "Label,Count,Avg,Min,Max,90%,95%,99%,Error %\r\nLogin,1,10,10,10,10,10,10,0\r\n"
    );
    Ok(())
}

#[tokio::test]
async fn health_probe() -> Result<()> {
    let (status, body) = test_app().get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}
