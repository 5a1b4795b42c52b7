//! End-to-end coverage for sending a message, the live delivery receipt it
//! triggers over the websocket, and the bulk-read transition.

mod common;

use rt_protocol::Event;
use rt_test_utils::{TestDb, WsTestClient};
use serde_json::json;

#[tokio::test]
async fn send_message_delivers_live_and_marks_read_in_bulk() {
    let db = TestDb::start().await;
    common::insert_user(&db.pool, 1, "alice").await;
    common::insert_user(&db.pool, 2, "bob").await;
    let server = common::spawn(db.pool.clone()).await;
    let client = reqwest::Client::new();

    let conversation: serde_json::Value = client
        .post(format!("{}/api/v1/conversations", server.base_url))
        .bearer_auth(common::bearer(1))
        .json(&json!({ "other_user_id": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conversation_id = conversation["id"].as_i64().unwrap();

    // Both connect before the send so the delivery receipt round trip can
    // happen synchronously inside `engine::messages::send`.
    let mut alice_ws = WsTestClient::connect(&server.ws_url, &common::bearer(1)).await;
    let mut bob_ws = WsTestClient::connect(&server.ws_url, &common::bearer(2)).await;
    // Bob connecting announces him online to Alice; drain that before the send.
    assert!(matches!(
        alice_ws.recv_event().await,
        Some(Event::UserOnline(p)) if p.user_id == 2
    ));

    let sent: serde_json::Value = client
        .post(format!("{}/api/v1/messages", server.base_url))
        .bearer_auth(common::bearer(1))
        .json(&json!({
            "conversation_id": conversation_id,
            "message_type": "text",
            "encrypted_content": "cGllY2Utb2YtY2lwaGVydGV4dA==",
            "sender_encrypted_content": "c2VuZGVycy1vd24tY29weQ==",
            "encryption_version": "v1",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let message_id = sent["id"].as_i64().unwrap();

    match bob_ws.recv_event().await {
        Some(Event::NewMessage(record)) => assert_eq!(record.id, message_id),
        other => panic!("bob expected new_message, got {other:?}"),
    }
    match alice_ws.recv_event().await {
        Some(Event::MessageDelivered(p)) => assert_eq!(p.message_id, message_id),
        other => panic!("alice expected message_delivered, got {other:?}"),
    }

    let history: serde_json::Value = client
        .get(format!(
            "{}/api/v1/conversations/{conversation_id}/messages",
            server.base_url
        ))
        .bearer_auth(common::bearer(2))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let marked: serde_json::Value = client
        .post(format!(
            "{}/api/v1/conversations/{conversation_id}/read",
            server.base_url
        ))
        .bearer_auth(common::bearer(2))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(marked["marked_read"], 1);

    match alice_ws.recv_event().await {
        Some(Event::MessageRead(p)) => assert_eq!(p.message_id, message_id),
        other => panic!("alice expected message_read, got {other:?}"),
    }
    match alice_ws.recv_event().await {
        Some(Event::ConversationRead(p)) => assert_eq!(p.conversation_id, conversation_id),
        other => panic!("alice expected conversation_read, got {other:?}"),
    }
}
