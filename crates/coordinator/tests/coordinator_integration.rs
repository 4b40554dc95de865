//! Integration tests for the coordinator loops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use broker::{Broker, Channel, EXECUTION_ID_ATTRIBUTE, InMemoryBroker, Message, ReaderConfig};
use common::{CompletionEvent, Decision, StageLogger, WorkRequest};
use coordinator::{
    Coordinator, CoordinatorError, HttpCallbackClient, RecordingCallbackClient, WorkflowState,
};

fn setup() -> (
    Arc<Coordinator<InMemoryBroker, RecordingCallbackClient>>,
    InMemoryBroker,
    RecordingCallbackClient,
) {
    let broker = InMemoryBroker::new();
    let callbacks = RecordingCallbackClient::new();
    let coordinator = Arc::new(Coordinator::new(
        broker.clone(),
        callbacks.clone(),
        StageLogger::new("coordinator-test"),
    ));
    (coordinator, broker, callbacks)
}

fn control_envelope(callback: &str) -> Message {
    let request = WorkRequest::new("exec-1".into(), "42", "svc-a", callback)
        .with_correlation_id("C1".into());
    Message::json(Channel::Control, "C1", &request)
        .unwrap()
        .with_attribute(EXECUTION_ID_ATTRIBUTE, "exec-1")
}

fn decision_message(commit: bool) -> Message {
    decision_for("C1", "exec-1", commit)
}

fn decision_for(correlation_id: &str, execution_id: &str, commit: bool) -> Message {
    let decision = Decision {
        correlation_id: correlation_id.into(),
        execution_id: execution_id.into(),
        origin_service: "svc-a".to_string(),
        commit,
    };
    Message::json(decision.channel(), "K2", &decision)
        .unwrap()
        .with_attribute(EXECUTION_ID_ATTRIBUTE, execution_id)
}

fn fast() -> ReaderConfig {
    ReaderConfig {
        retry_delay: Duration::from_millis(10),
        ..ReaderConfig::default()
    }
}

async fn wait_for_events(broker: &InMemoryBroker) -> Vec<Message> {
    for _ in 0..200 {
        let events = broker.published(Channel::Event).await;
        if !events.is_empty() {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Vec::new()
}

#[tokio::test]
async fn test_control_envelope_calls_participant_back() {
    let (coordinator, broker, callbacks) = setup();

    let state = coordinator
        .handle_control(control_envelope("http://svc-a/callback"))
        .await;

    assert_eq!(state, WorkflowState::CallbackInFlight);
    let calls = callbacks.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].callback, "http://svc-a/callback");
    assert_eq!(calls[0].correlation_id.as_str(), "C1");
    assert_eq!(calls[0].execution_id.as_str(), "exec-1");
    assert_eq!(broker.message_count().await, 0);
}

#[tokio::test]
async fn test_failed_callback_publishes_nothing() {
    let (coordinator, broker, callbacks) = setup();
    callbacks.set_unreachable(true);

    let state = coordinator
        .handle_control(control_envelope("http://svc-a/callback"))
        .await;

    assert_eq!(state, WorkflowState::Failed);
    assert_eq!(callbacks.calls().len(), 1);
    assert_eq!(broker.message_count().await, 0);
}

#[tokio::test]
async fn test_non_success_callback_fails_workflow() {
    let (coordinator, _, callbacks) = setup();
    callbacks.set_status(500);

    let state = coordinator
        .handle_control(control_envelope("http://svc-a/callback"))
        .await;

    assert_eq!(state, WorkflowState::Failed);
}

#[tokio::test]
async fn test_attribute_overrides_body_execution_id() {
    let (coordinator, _, callbacks) = setup();
    let envelope = control_envelope("http://svc-a/callback")
        .with_attribute(EXECUTION_ID_ATTRIBUTE, "exec-from-header");

    coordinator.handle_control(envelope).await;

    assert_eq!(
        callbacks.calls()[0].execution_id.as_str(),
        "exec-from-header"
    );
}

#[tokio::test]
async fn test_malformed_control_envelope_is_discarded() {
    let (coordinator, broker, callbacks) = setup();

    let state = coordinator
        .handle_control(Message::new(Channel::Control, "C1", b"not json".to_vec()))
        .await;

    assert_eq!(state, WorkflowState::Failed);
    assert!(callbacks.calls().is_empty());
    assert_eq!(broker.message_count().await, 0);
}

#[tokio::test]
async fn test_commit_decision_publishes_completion_event() {
    let (coordinator, broker, _) = setup();

    let event = coordinator
        .handle_commit(decision_message(true))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(event.correlation_id.as_str(), "C1");
    assert_eq!(event.execution_id.as_str(), "exec-1");
    assert_eq!(event.service_name, "svc-a");

    let events = broker.published(Channel::Event).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, "C1");
    assert_eq!(events[0].attribute(EXECUTION_ID_ATTRIBUTE), Some("exec-1"));
    let published: CompletionEvent = events[0].decode().unwrap();
    assert_eq!(published, event);
}

#[tokio::test]
async fn test_cancel_decision_produces_no_event() {
    let (coordinator, broker, _) = setup();

    let event = coordinator
        .handle_commit(decision_message(false))
        .await
        .unwrap();

    assert!(event.is_none());
    assert!(broker.published(Channel::Event).await.is_empty());
}

#[tokio::test]
async fn test_event_publish_failure_is_reported() {
    let (coordinator, broker, _) = setup();
    broker.set_fail_on_publish(true);

    let result = coordinator.handle_commit(decision_message(true)).await;

    assert!(matches!(result, Err(CoordinatorError::Broker(_))));
    assert_eq!(broker.message_count().await, 0);
}

#[tokio::test]
async fn test_run_consumes_both_channels() {
    let (coordinator, broker, callbacks) = setup();
    broker
        .publish(control_envelope("http://svc-a/callback"))
        .await
        .unwrap();
    broker.publish(decision_message(true)).await.unwrap();

    let handle = tokio::spawn(Arc::clone(&coordinator).run(fast()));

    let events = wait_for_events(&broker).await;
    assert_eq!(events.len(), 1);
    assert_eq!(callbacks.calls().len(), 1);
    handle.abort();
}

#[tokio::test]
async fn test_run_never_turns_a_cancel_into_an_event() {
    let (coordinator, broker, _) = setup();
    broker
        .publish(decision_for("C-cancel", "exec-cancel", false))
        .await
        .unwrap();
    broker
        .publish(decision_for("C-commit", "exec-commit", true))
        .await
        .unwrap();
    assert_eq!(broker.published(Channel::Cancel).await.len(), 1);

    let handle = tokio::spawn(Arc::clone(&coordinator).run(fast()));

    let events = wait_for_events(&broker).await;
    // Give a stray cancel time to surface before checking the count.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let events_after = broker.published(Channel::Event).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events_after.len(), 1);
    assert_eq!(events_after[0].key, "C-commit");
    assert_eq!(
        events_after[0].attribute(EXECUTION_ID_ATTRIBUTE),
        Some("exec-commit")
    );
    handle.abort();
}

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<HashMap<String, String>>>>);

async fn callback_handler(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    seen.0.lock().unwrap().push(params);
    StatusCode::OK
}

#[tokio::test]
async fn test_http_callback_reaches_participant() {
    let seen = Seen::default();
    let app = Router::new()
        .route("/callback", get(callback_handler))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let broker = InMemoryBroker::new();
    let coordinator = Coordinator::new(
        broker.clone(),
        HttpCallbackClient::new(),
        StageLogger::new("coordinator-test"),
    );

    let state = coordinator
        .handle_control(control_envelope(&format!("http://{addr}/callback")))
        .await;

    assert_eq!(state, WorkflowState::CallbackInFlight);
    let seen = seen.0.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["correlation_id"], "C1");
    assert_eq!(seen[0]["execution_id"], "exec-1");
    server.abort();
}
