//! # Command Flow Tests
//!
//! Single-session round trips: caller-chosen correlation ids, the typed
//! operation surface, out-of-order and stray responses, and resilience of
//! the event pump against malformed notifications.

use dgt_link::{
    ClientConfig, ClockCommand, CorrelationId, GatewayApi, GatewayClient, LinkError,
    MockTransport, RunParams, SetTimeParams,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn connected() -> (Arc<MockTransport>, GatewayClient<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let client = GatewayClient::new(ClientConfig::for_testing(), Arc::clone(&transport));
    (transport, client)
}

#[tokio::test]
async fn test_display_text_with_caller_chosen_id() {
    let (transport, client) = connected();
    transport.set_auto_respond(true);
    client.connect().await.unwrap();

    let outcome = client
        .send_command_with_id(
            CorrelationId::from("abc123"),
            ClockCommand::DisplayText,
            Some(json!({"text": " Connected", "beep": 2, "leftDots": 0, "rightDots": 0})),
        )
        .await
        .unwrap();

    assert!(outcome.success);
    // The echoed result carries the params back under the same id.
    assert_eq!(outcome.result["text"], " Connected");
    assert_eq!(outcome.result["beep"], 2);

    let sent = transport.written_commands();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id.as_str(), "abc123");
    assert_eq!(sent[0].command, "displayText");
}

#[tokio::test]
async fn test_typed_surface_maps_to_wire_commands() {
    let (transport, client) = connected();
    transport.set_auto_respond(true);
    client.connect().await.unwrap();

    client
        .set_time(SetTimeParams {
            left_mode: 1,
            left_hours: 1,
            left_minutes: 30,
            left_seconds: 0,
            right_mode: 1,
            right_hours: 1,
            right_minutes: 30,
            right_seconds: 0,
        })
        .await
        .unwrap();
    client
        .run_timers(RunParams {
            left_mode: 1,
            right_mode: 2,
        })
        .await
        .unwrap();
    client.stop_timers().await.unwrap();
    client.end_display().await.unwrap();

    let names: Vec<String> = transport
        .written_commands()
        .into_iter()
        .map(|request| request.command)
        .collect();
    assert_eq!(names, ["setTime", "run", "stop", "endDisplay"]);

    let snap = client.stats();
    assert_eq!(snap.commands_sent, 4);
    assert_eq!(snap.responses_received, 4);
}

#[tokio::test]
async fn test_stray_response_does_not_disturb_pending_request() {
    let (transport, client) = connected();
    client.connect().await.unwrap();

    let transport_ref = Arc::clone(&transport);
    let responder = tokio::spawn(async move {
        let request = loop {
            if let Some(request) = transport_ref.written_commands().first().cloned() {
                break request;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        };
        // A response for an id nobody registered is dropped.
        transport_ref
            .notify_json(json!({
                "type": "command_response",
                "id": "ghost00",
                "status": "success",
                "result": {}
            }))
            .await;
        transport_ref
            .notify_json(json!({
                "type": "command_response",
                "id": request.id,
                "status": "success",
                "result": {"ok": true}
            }))
            .await;
    });

    let outcome = client.stop_timers().await.unwrap();
    responder.await.unwrap();
    assert!(outcome.success);
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_late_response_after_timeout_is_ignored() {
    let (transport, client) = connected();
    client.connect().await.unwrap();

    let err = client.stop_timers().await.unwrap_err();
    assert!(matches!(err, LinkError::Timeout { .. }));
    assert_eq!(client.pending_requests(), 0);

    // Deliver the response the device would have sent, far too late.
    let request = transport.written_commands()[0].clone();
    transport
        .notify_json(json!({
            "type": "command_response",
            "id": request.id,
            "status": "success",
            "result": {}
        }))
        .await;

    // The session stays healthy for the next command.
    transport.set_auto_respond(true);
    let outcome = client.end_display().await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn test_malformed_notifications_do_not_kill_the_pump() {
    let (transport, client) = connected();
    client.connect().await.unwrap();

    transport.notify(b"not json at all".to_vec()).await;
    transport.notify(vec![0xff, 0xfe, 0x00]).await;
    transport.notify_json(json!([1, 2, 3])).await;

    transport.set_auto_respond(true);
    let outcome = client.stop_timers().await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn test_concurrent_commands_resolve_out_of_order() {
    let (transport, client) = connected();
    let client = Arc::new(client);
    client.connect().await.unwrap();

    let transport_ref = Arc::clone(&transport);
    let responder = tokio::spawn(async move {
        let requests = loop {
            let written = transport_ref.written_commands();
            if written.len() == 3 {
                break written;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        };
        // Resolve in reverse arrival order.
        for request in requests.into_iter().rev() {
            transport_ref
                .notify_json(json!({
                    "type": "command_response",
                    "id": request.id,
                    "status": "success",
                    "result": request.params.unwrap_or_else(|| json!({})),
                }))
                .await;
        }
    });

    let mut waiters = Vec::new();
    for seq in 0..3u64 {
        let client = Arc::clone(&client);
        waiters.push(tokio::spawn(async move {
            let outcome = client
                .send_command(ClockCommand::GetTime, Some(json!({"seq": seq})))
                .await
                .unwrap();
            assert_eq!(outcome.result["seq"], seq);
        }));
    }
    for waiter in waiters {
        waiter.await.unwrap();
    }
    responder.await.unwrap();
    assert_eq!(client.pending_requests(), 0);
}
