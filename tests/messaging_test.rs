mod common;

use common::tenant;
use retail_billing::messaging::{
    DeliveryResult, DialingPlan, ManualTransport, RejectReason, SendError, SessionManager, SessionState,
    TransportEvent,
};
use retail_billing::model::{Document, TenantId};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn manager(send_timeout: Duration) -> (SessionManager, ManualTransport) {
    let transport = ManualTransport::new();
    let sessions = SessionManager::new(Arc::new(transport.clone()), DialingPlan::default(), send_timeout);
    (sessions, transport)
}

fn receipt() -> Arc<Document> {
    Arc::new(Document {
        file_name: "invoice_1.txt".into(),
        content_type: "text/plain".into(),
        bytes: b"TOTAL 10.00".to_vec(),
    })
}

async fn wait_state(sessions: &SessionManager, tenant: &TenantId, state: SessionState) {
    let mut status = sessions.watch(tenant).expect("No session");
    tokio::time::timeout(WAIT, status.wait_for(|s| s.state == state))
        .await
        .expect("Timed out waiting for state")
        .expect("Session dropped");
}

/// Starts a session and drives it to `CONNECTED`.
async fn connected(sessions: &SessionManager, transport: &ManualTransport, tenant: &TenantId) {
    sessions.ensure_session(tenant);
    assert!(transport.wait_started(tenant, 1, WAIT).await);
    assert!(transport.connect(tenant));
    assert!(sessions.wait_until_ready(tenant, WAIT).await);
}

#[tokio::test]
async fn test_unknown_tenant_is_uninitialized() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");

    assert_eq!(sessions.status(&shop).state, SessionState::Uninitialized);
    assert!(sessions.watch(&shop).is_none());
    assert!(!sessions.wait_until_ready(&shop, Duration::from_millis(10)).await);
    assert_eq!(transport.start_count(&shop), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_starts_transport_once() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let sessions = sessions.clone();
        let shop = shop.clone();
        tasks.push(tokio::spawn(async move { sessions.ensure_session(&shop).state }));
    }
    for task in tasks {
        let state = task.await.unwrap();
        assert!(state.is_live(), "unexpected state {state}");
    }

    assert!(transport.wait_started(&shop, 1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.start_count(&shop), 1);
}

#[tokio::test]
async fn test_pairing_challenge_is_published_and_not_restarted() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");

    assert_eq!(sessions.ensure_session(&shop).state, SessionState::Initializing);
    assert!(transport.wait_started(&shop, 1, WAIT).await);

    transport.emit(&shop, TransportEvent::PairingChallenge("code-1".into()));
    wait_state(&sessions, &shop, SessionState::PairingReady).await;

    let status = sessions.ensure_session(&shop);
    assert_eq!(status.state, SessionState::PairingReady);
    assert_eq!(status.pairing_challenge.as_deref(), Some("code-1"));

    // A refreshed challenge replaces the old one in place.
    transport.emit(&shop, TransportEvent::PairingChallenge("code-2".into()));
    let mut status = sessions.watch(&shop).unwrap();
    tokio::time::timeout(WAIT, status.wait_for(|s| s.pairing_challenge.as_deref() == Some("code-2")))
        .await
        .unwrap()
        .unwrap();

    transport.emit(&shop, TransportEvent::Authenticated);
    wait_state(&sessions, &shop, SessionState::Paired).await;
    assert!(sessions.status(&shop).pairing_challenge.is_none());

    transport.emit(&shop, TransportEvent::Ready);
    wait_state(&sessions, &shop, SessionState::Connected).await;
    assert_eq!(transport.start_count(&shop), 1);
}

#[tokio::test]
async fn test_deliver_before_ready_never_reaches_transport() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");

    let result = sessions.deliver(&shop, "9876543210", receipt(), "hi").await;
    assert_eq!(result, DeliveryResult::Rejected(RejectReason::SessionNotReady));

    sessions.ensure_session(&shop);
    assert!(transport.wait_started(&shop, 1, WAIT).await);
    transport.emit(&shop, TransportEvent::PairingChallenge("code".into()));
    wait_state(&sessions, &shop, SessionState::PairingReady).await;

    let result = sessions.deliver(&shop, "9876543210", receipt(), "hi").await;
    assert_eq!(result, DeliveryResult::Rejected(RejectReason::SessionNotReady));
    assert_eq!(transport.send_attempts(), 0);
}

#[tokio::test]
async fn test_deliver_normalizes_recipient() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");
    connected(&sessions, &transport, &shop).await;

    let result = sessions.deliver(&shop, "+91 98765-43210", receipt(), "Thanks").await;
    assert_eq!(result, DeliveryResult::Delivered);
    let result = sessions.deliver(&shop, "98765 43210", receipt(), "Thanks").await;
    assert_eq!(result, DeliveryResult::Delivered);

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|s| s.to.digits() == "919876543210"));
    assert_eq!(sent[0].to.chat_id(), "919876543210@c.us");
    assert_eq!(sent[0].file_name, "invoice_1.txt");
    assert_eq!(sent[0].caption, "Thanks");
    assert_eq!(sent[0].tenant, shop);
}

#[tokio::test]
async fn test_invalid_recipient_is_rejected_without_sending() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");
    connected(&sessions, &transport, &shop).await;

    let result = sessions.deliver(&shop, "n/a", receipt(), "Thanks").await;
    assert!(matches!(result, DeliveryResult::Rejected(RejectReason::InvalidRecipient(_))));
    assert_eq!(transport.send_attempts(), 0);
}

#[tokio::test]
async fn test_sessions_are_isolated_per_tenant() {
    let (sessions, transport) = manager(WAIT);
    let shop_a = tenant("shop-a");
    let shop_b = tenant("shop-b");
    connected(&sessions, &transport, &shop_a).await;
    sessions.ensure_session(&shop_b);
    assert!(transport.wait_started(&shop_b, 1, WAIT).await);

    assert!(sessions.status(&shop_a).is_ready());
    assert_eq!(sessions.status(&shop_b).state, SessionState::Initializing);
    let result = sessions.deliver(&shop_b, "9876543210", receipt(), "hi").await;
    assert_eq!(result, DeliveryResult::Rejected(RejectReason::SessionNotReady));
}

#[tokio::test]
async fn test_teardown_then_ensure_starts_fresh() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");
    connected(&sessions, &transport, &shop).await;

    assert!(sessions.teardown(&shop).await);
    assert_eq!(sessions.status(&shop).state, SessionState::Disconnected);
    assert_eq!(transport.close_count(&shop), 1);

    let status = sessions.ensure_session(&shop);
    assert_eq!(status.state, SessionState::Initializing);
    assert!(transport.wait_started(&shop, 2, WAIT).await);
    assert!(transport.connect(&shop));
    assert!(sessions.wait_until_ready(&shop, WAIT).await);
}

#[tokio::test]
async fn test_session_lost_during_send_disconnects() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");
    connected(&sessions, &transport, &shop).await;

    transport.fail_next_send(SendError::SessionLost("logged out".into()));
    let result = sessions.deliver(&shop, "9876543210", receipt(), "hi").await;
    assert!(matches!(result, DeliveryResult::Rejected(RejectReason::Transport(_))));

    wait_state(&sessions, &shop, SessionState::Disconnected).await;
    assert_eq!(transport.close_count(&shop), 1);
    assert!(sessions.status(&shop).pairing_challenge.is_none());
}

#[tokio::test]
async fn test_transient_failure_keeps_session_connected() {
    let (sessions, transport) = manager(WAIT);
    let shop = tenant("shop-a");
    connected(&sessions, &transport, &shop).await;

    transport.fail_next_send(SendError::Transient("rate limited".into()));
    let result = sessions.deliver(&shop, "9876543210", receipt(), "hi").await;
    assert_eq!(
        result,
        DeliveryResult::Rejected(RejectReason::Transport("rate limited".into()))
    );
    assert!(sessions.status(&shop).is_ready());

    let result = sessions.deliver(&shop, "9876543210", receipt(), "hi").await;
    assert_eq!(result, DeliveryResult::Delivered);
}

#[tokio::test]
async fn test_slow_send_times_out() {
    let (sessions, transport) = manager(Duration::from_millis(50));
    let shop = tenant("shop-a");
    connected(&sessions, &transport, &shop).await;

    transport.delay_sends(Duration::from_millis(500));
    let result = sessions.deliver(&shop, "9876543210", receipt(), "hi").await;
    match result {
        DeliveryResult::Rejected(RejectReason::Transport(reason)) => assert!(reason.contains("timed out")),
        other => panic!("Expected timeout, got {other:?}"),
    }
    assert!(transport.sent().is_empty());
    assert!(sessions.status(&shop).is_ready());
}

#[tokio::test]
async fn test_auth_failure_and_refused_start_disconnect() {
    let (sessions, transport) = manager(WAIT);
    let shop_a = tenant("shop-a");
    let shop_b = tenant("shop-b");

    sessions.ensure_session(&shop_a);
    assert!(transport.wait_started(&shop_a, 1, WAIT).await);
    transport.emit(&shop_a, TransportEvent::AuthFailure("bad credentials".into()));
    assert!(!sessions.wait_until_ready(&shop_a, WAIT).await);
    assert_eq!(sessions.status(&shop_a).state, SessionState::Disconnected);

    transport.refuse_starts(true);
    sessions.ensure_session(&shop_b);
    assert!(transport.wait_started(&shop_b, 1, WAIT).await);
    wait_state(&sessions, &shop_b, SessionState::Disconnected).await;
}

#[tokio::test]
async fn test_shutdown_closes_every_session() {
    let (sessions, transport) = manager(WAIT);
    let shop_a = tenant("shop-a");
    let shop_b = tenant("shop-b");
    connected(&sessions, &transport, &shop_a).await;
    connected(&sessions, &transport, &shop_b).await;

    sessions.shutdown(WAIT).await;

    assert_eq!(transport.close_count(&shop_a), 1);
    assert_eq!(transport.close_count(&shop_b), 1);
    // No new sessions after shutdown.
    assert!(!sessions.ensure_session(&tenant("shop-c")).state.is_live());
    assert_eq!(transport.start_count(&tenant("shop-c")), 0);
}
