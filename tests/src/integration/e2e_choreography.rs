//! # End-to-End Session Choreography
//!
//! Whole-session life cycles: handshake through teardown, reconnection,
//! observer wiring, a disconnect that strands pending requests, and a
//! high-volume burst resolved in random order.

use dgt_link::{
    ClientConfig, ClockCommand, EventKind, GatewayApi, GatewayClient, LinkError, MockTransport,
};
use rand::seq::SliceRandom;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_full_session_life_cycle() {
    let transport = Arc::new(MockTransport::new());
    transport.set_auto_respond(true);
    let mut config = ClientConfig::for_testing();
    config.confirm_on_ready = true;
    let client = GatewayClient::new(config, Arc::clone(&transport));

    // Handshake reaches Ready and the confirmation text goes out.
    client.connect().await.unwrap();
    assert!(client.is_ready());
    let sent = transport.written_commands();
    assert_eq!(sent[0].command, "displayText");

    // Typed observers see pushed events.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    client.on_event(EventKind::TimeUpdate, move |envelope| {
        let time: dgt_link::TimeUpdate = envelope.parse_data();
        let _ = tx.send(time);
    });
    transport
        .notify_json(json!({
            "type": "timeUpdate",
            "data": {
                "leftHours": 0, "leftMinutes": 4, "leftSeconds": 59,
                "rightHours": 0, "rightMinutes": 5, "rightSeconds": 0
            }
        }))
        .await;
    let update = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(update.left_minutes, 4);
    assert_eq!(update.left_seconds, 59);

    // Commands work, then teardown, then a fresh handshake works again.
    client.stop_timers().await.unwrap();
    client.disconnect().await;
    assert!(!client.is_ready());

    client.connect().await.unwrap();
    assert!(client.is_ready());
    client.end_display().await.unwrap();
}

#[tokio::test]
async fn test_handshake_timeout_then_successful_retry() {
    let transport = Arc::new(MockTransport::new());
    transport.set_ready_on_subscribe(false);
    let client = GatewayClient::new(ClientConfig::for_testing(), Arc::clone(&transport));

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, LinkError::HandshakeFailed(_)));
    assert!(!client.is_ready());

    transport.set_ready_on_subscribe(true);
    client.connect().await.unwrap();
    assert!(client.is_ready());
}

#[tokio::test]
async fn test_disconnect_strands_pending_requests() {
    let transport = Arc::new(MockTransport::new());
    let mut config = ClientConfig::for_testing();
    config.response_timeout = Duration::from_secs(30);
    let client = Arc::new(GatewayClient::new(config, Arc::clone(&transport)));
    client.connect().await.unwrap();

    // Three requests in flight, nothing answering them.
    let mut waiters = Vec::new();
    for _ in 0..3 {
        let client = Arc::clone(&client);
        waiters.push(tokio::spawn(async move {
            client.send_command(ClockCommand::GetTime, None).await
        }));
    }
    while client.pending_requests() < 3 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    client.disconnect().await;

    for waiter in waiters {
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(LinkError::Disconnected)));
    }
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ten_thousand_concurrent_commands_resolve_in_random_order() {
    const COUNT: u64 = 10_000;

    let transport = Arc::new(MockTransport::new());
    let mut config = ClientConfig::for_testing();
    config.response_timeout = Duration::from_secs(60);
    let client = Arc::new(GatewayClient::new(config, Arc::clone(&transport)));
    client.connect().await.unwrap();

    // Every caller tags its request so the answer can be checked end to end.
    let mut waiters = Vec::with_capacity(COUNT as usize);
    for seq in 0..COUNT {
        let client = Arc::clone(&client);
        waiters.push(tokio::spawn(async move {
            let outcome = client
                .send_command(ClockCommand::GetTime, Some(json!({"seq": seq})))
                .await
                .unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.result["seq"], seq);
        }));
    }

    // Wait for the full burst to hit the wire, then answer in a shuffled
    // order so arrival order and resolution order share nothing.
    let responder = {
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let mut requests = loop {
                let written = transport.written_commands();
                if written.len() as u64 == COUNT {
                    break written;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            };
            requests.shuffle(&mut rand::thread_rng());
            for request in requests {
                transport
                    .notify_json(json!({
                        "type": "command_response",
                        "id": request.id,
                        "status": "success",
                        "result": request.params.unwrap_or_else(|| json!({})),
                    }))
                    .await;
            }
        })
    };

    for waiter in waiters {
        waiter.await.unwrap();
    }
    responder.await.unwrap();

    assert_eq!(client.pending_requests(), 0);
    let snap = client.stats();
    assert_eq!(snap.commands_sent, COUNT);
    assert_eq!(snap.responses_received, COUNT);
}
