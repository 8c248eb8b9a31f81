//! Integration tests for `Checker` against a mocked commerce API.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Unit lists are written to temp files the
//! same way operators maintain them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use sladash_core::{Availability, PayloadShape, ServiceabilityStatus, UNKNOWN};
use sladash_prober::{
    CheckRequest, Checker, CheckerConfig, DiscardSink, FixedFallback, PipelineError,
    PersistenceStatus, ProbeClient, ReportDetail, SimplifiedFailure, SimplifiedServiceability,
    UnitSources,
};

/// Writes `content` to a per-test temp file and returns its path.
fn temp_list(test: &str, name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sladash-{test}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write unit list");
    path
}

fn sources(test: &str) -> UnitSources {
    UnitSources {
        locations_path: temp_list(
            test,
            "locations.csv",
            "name,latitude,longitude\nIndiranagar,12.5,77.5\nWhitefield,13.25,77.75\nJayanagar,12.75,77.25\n",
        ),
        stores_path: temp_list(
            test,
            "stores.csv",
            "store_id,latitude,longitude,name\n1001,12.5,77.5,MG Road\n",
        ),
        items_path: temp_list(test, "items.csv", "item_id,item_name\nA1,Milk\nB2,Bread\n"),
    }
}

/// 200 ms client timeout, no cooldown, deterministic fallback.
fn checker(server: &MockServer, sources: UnitSources) -> Checker {
    let client =
        ProbeClient::new(&server.uri(), 200, "sladash-test/0.1").expect("valid test client");
    Checker::new(
        client,
        Arc::new(FixedFallback::default()),
        CheckerConfig {
            batch_size: 50,
            api_timeout_ms: 200,
            cooldown_ms: 0,
        },
        sources,
    )
}

fn full_detail_request() -> CheckRequest {
    CheckRequest {
        test_mode: true,
        return_full_data: true,
        ..CheckRequest::new("test")
    }
}

/// Matches requests whose coordinates header carries the given latitude.
struct LatitudeHeader(f64);

impl Match for LatitudeHeader {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("x-sladash-location")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
            .and_then(|v| v["lat"].as_f64())
            .is_some_and(|lat| (lat - self.0).abs() < 1e-9)
    }
}

fn serviceable_body(store_id: &str, sla: &str) -> serde_json::Value {
    json!({
        "store": { "id": store_id, "description": "Hub", "locality": "Bengaluru" },
        "serviceability": { "status": "SERVICEABLE", "sla": sla }
    })
}

// ---------------------------------------------------------------------------
// Serviceability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timed_out_location_is_reported_with_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .and(LatitudeHeader(13.25))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serviceable_body("2002", "12 MINS"))
                .set_delay(Duration::from_secs(2)),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serviceable_body("1001", "15 MINS")))
        .mount(&server)
        .await;

    let report = checker(&server, sources("timeout"))
        .run_serviceability(&full_detail_request(), &DiscardSink)
        .await
        .expect("check should complete despite a timeout");

    assert!(report.success);
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.persistence, PersistenceStatus::Skipped);

    let ReportDetail::Full { successful, failed } = &report.results else {
        panic!("expected full detail");
    };
    assert!(successful.iter().all(|r| r.store_id == "1001"));
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].unit.name, "Whitefield");
    assert!(failed[0].error.contains("timed out"), "error: {}", failed[0].error);
    assert_eq!(failed[0].fallback.shape, PayloadShape::Synthesized);
    assert_ne!(failed[0].fallback.store_id, UNKNOWN);
    assert_ne!(failed[0].fallback.sla_minutes_label, UNKNOWN);
}

#[tokio::test]
async fn non_success_status_counts_as_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = checker(&server, sources("status"))
        .run_serviceability(&full_detail_request(), &DiscardSink)
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 3);
    assert_eq!(report.summary.successful, 0);
    assert!(report.success, "probe failures never flip success");
}

#[tokio::test]
async fn simplified_report_lists_failures_with_fallbacks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let request = CheckRequest {
        test_mode: true,
        ..CheckRequest::new("test")
    };
    let report = checker(&server, sources("simplified"))
        .run_serviceability(&request, &DiscardSink)
        .await
        .unwrap();

    let ReportDetail::Simplified { successful, failed } = &report.results else {
        panic!("expected simplified detail");
    };
    assert!(successful.is_empty());
    let failures: &[SimplifiedFailure<SimplifiedServiceability>] = failed;
    assert_eq!(failures.len(), 3);
    assert!(failures[0].error.contains("502"), "error: {}", failures[0].error);
    assert_eq!(failures[0].fallback.sla_minutes_label, "30 MINS");
}

#[tokio::test]
async fn non_json_success_body_is_malformed_not_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let report = checker(&server, sources("html"))
        .run_serviceability(&full_detail_request(), &DiscardSink)
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.successful, 3);
    assert_eq!(report.summary.unrecognized, 3);

    let ReportDetail::Full { successful, .. } = &report.results else {
        panic!("expected full detail");
    };
    assert!(successful
        .iter()
        .all(|r| r.shape == PayloadShape::Malformed && r.store_id == UNKNOWN));
}

#[tokio::test]
async fn unrecognized_payload_is_success_with_sentinels() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "layout": [] })))
        .mount(&server)
        .await;

    let report = checker(&server, sources("drift"))
        .run_serviceability(&full_detail_request(), &DiscardSink)
        .await
        .unwrap();

    assert_eq!(report.summary.successful, 3);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.unrecognized, 3);

    let ReportDetail::Full { successful, .. } = &report.results else {
        panic!("expected full detail");
    };
    assert!(successful
        .iter()
        .all(|r| r.store_id == UNKNOWN && r.serviceability == ServiceabilityStatus::Unknown));
}

#[tokio::test]
async fn explicit_locations_narrow_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/serviceability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serviceable_body("1001", "15 MINS")))
        .expect(1)
        .mount(&server)
        .await;

    let request = CheckRequest {
        explicit_unit_ids: Some(vec!["jayanagar".to_string()]),
        ..full_detail_request()
    };
    let report = checker(&server, sources("explicit"))
        .run_serviceability(&request, &DiscardSink)
        .await
        .unwrap();

    assert_eq!(report.summary.total, 1);
}

#[tokio::test]
async fn missing_unit_list_aborts_the_run() {
    let server = MockServer::start().await;
    let mut sources = sources("missing");
    sources.locations_path = PathBuf::from("/nonexistent/sladash/locations.csv");

    let err = checker(&server, sources)
        .run_serviceability(&full_detail_request(), &DiscardSink)
        .await
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::UnitLoad(_)),
        "expected UnitLoad, got: {err:?}"
    );
}

#[tokio::test]
async fn zero_batch_size_is_rejected() {
    let server = MockServer::start().await;
    let request = CheckRequest {
        batch_size: Some(0),
        ..full_detail_request()
    };

    let err = checker(&server, sources("zero"))
        .run_serviceability(&request, &DiscardSink)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidRequest(_)));
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn availability_probes_every_store_item_pair() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stores/1001/items/A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "item": {
                "name": "Amul Taaza",
                "brand": "Amul",
                "category": "Dairy",
                "variations": [{ "inStock": true }]
            },
            "store": { "description": "MG Road Hub", "locality": "Ashok Nagar" }
        })))
        .mount(&server)
        .await;

    // Drifted payload: the `item` block is gone.
    Mock::given(method("GET"))
        .and(path("/api/v1/stores/1001/items/B2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "store": { "description": "MG Road Hub", "locality": "Ashok Nagar" }
        })))
        .mount(&server)
        .await;

    let report = checker(&server, sources("availability"))
        .run_availability(&full_detail_request(), &DiscardSink)
        .await
        .unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.failed, 0);

    let ReportDetail::Full { successful, .. } = &report.results else {
        panic!("expected full detail");
    };
    let milk = successful.iter().find(|r| r.item_id == "A1").unwrap();
    assert_eq!(milk.available, Availability::Available);
    assert_eq!(milk.item_internal_name, "Milk");

    let bread = successful.iter().find(|r| r.item_id == "B2").unwrap();
    assert_eq!(bread.available, Availability::Unknown);
    assert_eq!(bread.item_name, UNKNOWN);
    assert_eq!(bread.store_locality, "Ashok Nagar");
}

#[tokio::test]
async fn availability_item_subset_is_applied_before_batching() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/stores/1001/items/B2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let request = CheckRequest {
        explicit_unit_ids: Some(vec!["B2".to_string()]),
        ..full_detail_request()
    };
    let report = checker(&server, sources("subset"))
        .run_availability(&request, &DiscardSink)
        .await
        .unwrap();

    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.failed, 1);

    let ReportDetail::Full { failed, .. } = &report.results else {
        panic!("expected full detail");
    };
    assert_eq!(failed[0].unit.item_id, "B2");
    assert_ne!(failed[0].fallback.available, Availability::Unknown);
}
