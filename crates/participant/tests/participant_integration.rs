//! Integration tests for the participant callback surface.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use participant::{DecisionPolicy, FixedDecision, RecordingGatewayClient};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup(policy: impl DecisionPolicy + 'static) -> (axum::Router, RecordingGatewayClient) {
    let gateway = RecordingGatewayClient::new();
    let state =
        participant::create_state(gateway.clone(), Box::new(policy), "svc-a", "participant-test");
    (participant::create_app(state, get_metrics_handle()), gateway)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_callback_forwards_commit_decision() {
    let (app, gateway) = setup(FixedDecision(true));

    let response = app
        .oneshot(get("/callback?correlation_id=C1&execution_id=exec-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let decisions = gateway.decisions();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].correlation_id.as_str(), "C1");
    assert_eq!(decisions[0].execution_id.as_str(), "exec-1");
    assert_eq!(decisions[0].origin_service, "svc-a");
    assert!(decisions[0].commit);
}

#[tokio::test]
async fn test_callback_forwards_cancel_decision() {
    let (app, gateway) = setup(FixedDecision(false));

    let response = app
        .oneshot(get("/callback?correlation_id=C1&execution_id=exec-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!gateway.decisions()[0].commit);
}

#[tokio::test]
async fn test_missing_parameters_are_rejected() {
    let (app, gateway) = setup(FixedDecision(true));

    for uri in [
        "/callback?execution_id=exec-1",
        "/callback?correlation_id=C1",
        "/callback?correlation_id=&execution_id=exec-1",
        "/callback",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
    assert!(gateway.decisions().is_empty());
}

#[tokio::test]
async fn test_gateway_failure_is_server_error() {
    let (app, gateway) = setup(FixedDecision(true));
    gateway.set_fail(true);

    let response = app
        .oneshot(get("/callback?correlation_id=C1&execution_id=exec-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_repeated_callbacks_are_not_deduplicated() {
    let (app, gateway) = setup(FixedDecision(true));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/callback?correlation_id=C1&execution_id=exec-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(gateway.decisions().len(), 2);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (app, _) = setup(FixedDecision(true));

    let health = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body = axum::body::to_bytes(health.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));

    let metrics = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);
    assert!(
        metrics.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}
