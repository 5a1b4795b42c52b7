//! Notification pipeline coverage: milestone idempotency under duplicate
//! vote events, and the velocity detector's batch-vs-immediate split.

mod common;

use std::time::Duration;

use chrono::Utc;
use server::notifications::events::{NotificationEvent, VoteRegistered};
use server::repo;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn duplicate_milestone_votes_notify_exactly_once() {
    let db = rt_test_utils::TestDb::start().await;
    common::insert_user(&db.pool, 1, "alice").await;
    let server = common::spawn(db.pool.clone()).await;

    let vote = VoteRegistered {
        content_type: rt_protocol::ContentType::Post,
        content_id: 42,
        author_id: 1,
        current_upvotes: 10,
    };
    // Two independent crossings of the same threshold, as duplicate or
    // concurrently-delivered vote events could produce.
    server.state.notification_events.send(NotificationEvent::Vote(vote.clone())).unwrap();
    server.state.notification_events.send(NotificationEvent::Vote(vote)).unwrap();
    settle().await;

    let stored = repo::notifications::list_for_user(&server.pool, 1, 50).await.unwrap();
    let milestones: Vec<_> = stored
        .iter()
        .filter(|n| n.notification_type == rt_protocol::NotificationType::PostMilestone)
        .collect();
    assert_eq!(milestones.len(), 1);
    assert_eq!(milestones[0].milestone_count, Some(10));
}

#[tokio::test]
async fn gradual_velocity_is_batched_not_fired_immediately() {
    let db = rt_test_utils::TestDb::start().await;
    common::insert_user(&db.pool, 1, "alice").await;
    let server = common::spawn(db.pool.clone()).await;

    // 15 votes scattered over the last 3 hours (vph = 5.0, clears the
    // no-baseline threshold), and 3 votes in the immediately preceding hour
    // bucket so the growth ratio (5.0 < 2 * 3) does not read as exponential.
    for i in 0..15 {
        sqlx::query(
            "INSERT INTO vote_activity (content_type, content_id, author_id, voter_id, hour_bucket, created_at)
             VALUES ('post', 7, 1, 1, date_trunc('hour', now()), now() - make_interval(mins => $1))",
        )
        .bind((i * 5) as f64)
        .execute(&server.pool)
        .await
        .unwrap();
    }
    for _ in 0..3 {
        sqlx::query(
            "INSERT INTO vote_activity (content_type, content_id, author_id, voter_id, hour_bucket, created_at)
             VALUES ('post', 7, 1, 1, date_trunc('hour', now()) - interval '1 hour', now() - interval '90 minutes')",
        )
        .execute(&server.pool)
        .await
        .unwrap();
    }

    server
        .state
        .notification_events
        .send(NotificationEvent::Vote(VoteRegistered {
            content_type: rt_protocol::ContentType::Post,
            content_id: 7,
            author_id: 1,
            current_upvotes: 3, // below the lowest milestone, isolating the velocity path
        }))
        .unwrap();
    settle().await;

    let stored = repo::notifications::list_for_user(&server.pool, 1, 50).await.unwrap();
    assert!(
        stored.iter().all(|n| n.notification_type != rt_protocol::NotificationType::PostVelocity),
        "velocity notification should not fire immediately for gradual growth"
    );

    let due = repo::notification_batches::find_due(&server.pool, Utc::now() + chrono::Duration::minutes(16))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].user_id, 1);
    assert_eq!(due[0].content_id, 7);
}

#[tokio::test]
async fn exponential_growth_fires_immediately_and_cancels_any_pending_batch() {
    let db = rt_test_utils::TestDb::start().await;
    common::insert_user(&db.pool, 1, "alice").await;
    let server = common::spawn(db.pool.clone()).await;

    // A pending batch already scheduled from an earlier, gradual event.
    repo::notification_batches::schedule_or_get_pending(
        &server.pool,
        1,
        rt_protocol::ContentType::Post,
        99,
        rt_protocol::NotificationType::PostVelocity,
        Utc::now() + chrono::Duration::minutes(15),
    )
    .await
    .unwrap();

    // No votes in the prior hour bucket at all: any current activity reads
    // as unbounded growth relative to it.
    for i in 0..15 {
        sqlx::query(
            "INSERT INTO vote_activity (content_type, content_id, author_id, voter_id, hour_bucket, created_at)
             VALUES ('post', 99, 1, 1, date_trunc('hour', now()), now() - make_interval(mins => $1))",
        )
        .bind((i * 5) as f64)
        .execute(&server.pool)
        .await
        .unwrap();
    }

    server
        .state
        .notification_events
        .send(NotificationEvent::Vote(VoteRegistered {
            content_type: rt_protocol::ContentType::Post,
            content_id: 99,
            author_id: 1,
            current_upvotes: 3,
        }))
        .unwrap();
    settle().await;

    let stored = repo::notifications::list_for_user(&server.pool, 1, 50).await.unwrap();
    assert!(stored
        .iter()
        .any(|n| n.notification_type == rt_protocol::NotificationType::PostVelocity));

    let due = repo::notification_batches::find_due(&server.pool, Utc::now() + chrono::Duration::minutes(16))
        .await
        .unwrap();
    assert!(
        due.iter().all(|b| b.content_id != 99),
        "the superseded pending batch should have been cancelled"
    );
}
