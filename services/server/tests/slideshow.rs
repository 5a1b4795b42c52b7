//! Single-controller slideshow coordination: start, controller-only
//! navigation, control transfer, and stop — all fanned out over the hub.

mod common;

use rt_protocol::Event;
use rt_test_utils::{TestDb, WsTestClient};
use serde_json::json;

async fn insert_media(pool: &sqlx::PgPool, id: i64, owner_id: i64) {
    sqlx::query(
        "INSERT INTO media_files (id, owner_id, content_type, size_bytes, storage_path) VALUES ($1, $2, 'image/png', 10, $3)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(format!("/tmp/media-{id}.png"))
    .execute(pool)
    .await
    .expect("insert test media file");
}

#[tokio::test]
async fn personal_slideshow_controller_flow() {
    let db = TestDb::start().await;
    common::insert_user(&db.pool, 1, "alice").await;
    common::insert_user(&db.pool, 2, "bob").await;
    insert_media(&db.pool, 10, 1).await;
    insert_media(&db.pool, 11, 1).await;
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

    let mut alice_ws = WsTestClient::connect(&server.ws_url, &common::bearer(1)).await;
    let mut bob_ws = WsTestClient::connect(&server.ws_url, &common::bearer(2)).await;
    let _ = alice_ws.recv_event().await; // bob's user_online

    let session: serde_json::Value = client
        .post(format!(
            "{}/api/v1/conversations/{conversation_id}/slideshow",
            server.base_url
        ))
        .bearer_auth(common::bearer(1))
        .json(&json!({
            "slideshow_type": "personal",
            "media_file_ids": [10, 11],
            "captions": [null, "second photo"],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["id"].as_i64().unwrap();
    assert_eq!(session["controller_user_id"], 1);
    assert_eq!(session["total_items"], 2);

    match bob_ws.recv_event().await {
        Some(Event::SlideshowStarted(s)) => assert_eq!(s.id, session_id),
        other => panic!("bob expected slideshow_started, got {other:?}"),
    }

    // A second concurrent session on the same conversation is rejected.
    let conflict = client
        .post(format!(
            "{}/api/v1/conversations/{conversation_id}/slideshow",
            server.base_url
        ))
        .bearer_auth(common::bearer(1))
        .json(&json!({ "slideshow_type": "personal", "media_file_ids": [10] }))
        .send()
        .await
        .unwrap();
    assert_eq!(conflict.status(), 409);

    // Bob is not the controller; navigating is forbidden.
    let forbidden = client
        .post(format!(
            "{}/api/v1/slideshows/{session_id}/navigate",
            server.base_url
        ))
        .bearer_auth(common::bearer(2))
        .json(&json!({ "index": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let navigated = client
        .post(format!(
            "{}/api/v1/slideshows/{session_id}/navigate",
            server.base_url
        ))
        .bearer_auth(common::bearer(1))
        .json(&json!({ "index": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(navigated.status(), 200);
    match bob_ws.recv_event().await {
        Some(Event::SlideshowNavigate(p)) => assert_eq!(p.current_index, 1),
        other => panic!("bob expected slideshow_navigate, got {other:?}"),
    }

    let transferred = client
        .post(format!(
            "{}/api/v1/slideshows/{session_id}/transfer-control",
            server.base_url
        ))
        .bearer_auth(common::bearer(1))
        .send()
        .await
        .unwrap();
    assert_eq!(transferred.status(), 200);
    match bob_ws.recv_event().await {
        Some(Event::SlideshowControlTransferred(p)) => assert_eq!(p.new_controller_id, 2),
        other => panic!("bob expected slideshow_control_transferred, got {other:?}"),
    }

    // Alice is no longer the controller, so she can no longer navigate.
    let alice_forbidden = client
        .post(format!(
            "{}/api/v1/slideshows/{session_id}/navigate",
            server.base_url
        ))
        .bearer_auth(common::bearer(1))
        .json(&json!({ "index": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(alice_forbidden.status(), 403);

    let stopped = client
        .delete(format!("{}/api/v1/slideshows/{session_id}", server.base_url))
        .bearer_auth(common::bearer(2))
        .send()
        .await
        .unwrap();
    assert_eq!(stopped.status(), 204);
    match alice_ws.recv_event().await {
        Some(Event::SlideshowStopped(p)) => assert_eq!(p.session_id, session_id),
        other => panic!("alice expected slideshow_stopped, got {other:?}"),
    }

    let not_found = client
        .get(format!(
            "{}/api/v1/conversations/{conversation_id}/slideshow",
            server.base_url
        ))
        .bearer_auth(common::bearer(1))
        .send()
        .await
        .unwrap();
    assert_eq!(not_found.status(), 404);
}
