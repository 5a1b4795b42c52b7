//! Blocking enforcement: a blocked sender's messages are rejected outright.

mod common;

use rt_test_utils::TestDb;
use serde_json::json;

#[tokio::test]
async fn blocked_sender_cannot_send_messages() {
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

    // Bob blocks Alice.
    let block_resp = client
        .post(format!("{}/api/v1/users/block", server.base_url))
        .bearer_auth(common::bearer(2))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(block_resp.status(), 204);

    let send_resp = client
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
        .unwrap();
    assert_eq!(send_resp.status(), 403);

    let blocked: serde_json::Value = client
        .get(format!("{}/api/v1/users/blocked", server.base_url))
        .bearer_auth(common::bearer(2))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blocked.as_array().unwrap().len(), 1);
    assert_eq!(blocked[0]["username"], "alice");

    // Unblocking restores send access.
    let unblock_resp = client
        .delete(format!("{}/api/v1/users/block/alice", server.base_url))
        .bearer_auth(common::bearer(2))
        .send()
        .await
        .unwrap();
    assert_eq!(unblock_resp.status(), 204);

    let send_resp2 = client
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
        .unwrap();
    assert_eq!(send_resp2.status(), 201);
}
