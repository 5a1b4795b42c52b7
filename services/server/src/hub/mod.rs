pub mod ws;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rt_protocol::{Event, PresencePayload};
use tokio::sync::{broadcast, RwLock};

/// Bounded per-session outbound queue capacity. Overflow policy is
/// drop-oldest: `broadcast::Sender::send` overwrites the oldest unread slot
/// once the ring buffer is full rather than blocking the hub, and a lagging
/// receiver simply observes a gap.
const SESSION_QUEUE_CAPACITY: usize = 128;

struct SessionHandle {
    session_id: u64,
    tx: broadcast::Sender<Event>,
}

/// The process-local registry of live WebSocket sessions and their event
/// fan-out. One mutation per operation: register, unregister, and delivery
/// all take a single short-lived lock on the session map.
pub struct DeliveryHub {
    sessions: RwLock<HashMap<i64, Vec<SessionHandle>>>,
    next_session_id: AtomicU64,
}

impl Default for DeliveryHub {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryHub {
    pub fn new() -> Self {
        DeliveryHub {
            sessions: RwLock::new(HashMap::new()),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Registers a new session for `user_id`, returning its id and the
    /// receiver half the session's writer task should drain. Emits
    /// `user_online` to every other connected user iff this is the user's
    /// first live session.
    pub async fn register(&self, user_id: i64) -> (u64, broadcast::Receiver<Event>) {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = broadcast::channel(SESSION_QUEUE_CAPACITY);

        let was_offline = {
            let mut sessions = self.sessions.write().await;
            let entry = sessions.entry(user_id).or_default();
            let was_offline = entry.is_empty();
            entry.push(SessionHandle { session_id, tx });
            was_offline
        };

        if was_offline {
            self.broadcast_presence_except(user_id, true).await;
        }

        (session_id, rx)
    }

    /// Removes a session. Emits `user_offline` to every other connected
    /// user iff this was the user's last live session.
    pub async fn unregister(&self, user_id: i64, session_id: u64) {
        let now_offline = {
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(&user_id) {
                Some(list) => {
                    list.retain(|s| s.session_id != session_id);
                    let empty = list.is_empty();
                    if empty {
                        sessions.remove(&user_id);
                    }
                    empty
                }
                None => false,
            }
        };

        if now_offline {
            self.broadcast_presence_except(user_id, false).await;
        }
    }

    /// Enqueues `event` on every live session for `user_id`. A session whose
    /// queue is full silently drops the oldest unread event for that
    /// session only — delivery to other sessions/users is unaffected.
    pub async fn deliver_to(&self, user_id: i64, event: Event) {
        let sessions = self.sessions.read().await;
        if let Some(list) = sessions.get(&user_id) {
            for session in list {
                // Err here means the session's writer task has already
                // exited; its own cleanup path will call `unregister`.
                let _ = session.tx.send(event.clone());
            }
        }
    }

    pub async fn deliver_to_many(&self, user_ids: &[i64], event: Event) {
        for user_id in user_ids {
            self.deliver_to(*user_id, event.clone()).await;
        }
    }

    pub async fn is_online(&self, user_id: i64) -> bool {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .is_some_and(|list| !list.is_empty())
    }

    /// Batched presence lookup; callers are expected to cap `user_ids`
    /// themselves (default ceiling 100).
    pub async fn online_many(&self, user_ids: &[i64]) -> HashMap<i64, bool> {
        let sessions = self.sessions.read().await;
        user_ids
            .iter()
            .map(|&id| (id, sessions.get(&id).is_some_and(|l| !l.is_empty())))
            .collect()
    }

    async fn broadcast_presence_except(&self, user_id: i64, online: bool) {
        let others: Vec<i64> = {
            let sessions = self.sessions.read().await;
            sessions.keys().filter(|&&id| id != user_id).copied().collect()
        };
        let payload = PresencePayload { user_id };
        let event = if online {
            Event::UserOnline(payload)
        } else {
            Event::UserOffline(payload)
        };
        self.deliver_to_many(&others, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_emits_online_only_for_first_session() {
        let hub = DeliveryHub::new();
        let (_sid_a1, _rx_a1) = hub.register(1).await;
        let (_sid_b1, mut rx_b) = hub.register(2).await;

        // user 1's first session should have notified user 2.
        let evt = rx_b.recv().await.unwrap();
        assert!(matches!(evt, Event::UserOnline(p) if p.user_id == 1));

        // A second session for user 1 should not re-announce online.
        let (_sid_a2, _rx_a2) = hub.register(1).await;
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_emits_offline_only_on_last_session() {
        let hub = DeliveryHub::new();
        let (sid_a1, _rx_a1) = hub.register(1).await;
        let (sid_a2, _rx_a2) = hub.register(1).await;
        let (_sid_b, mut rx_b) = hub.register(2).await;
        // drain the online event from registering user 1.
        let _ = rx_b.recv().await;

        hub.unregister(1, sid_a1).await;
        assert!(rx_b.try_recv().is_err());
        assert!(hub.is_online(1).await);

        hub.unregister(1, sid_a2).await;
        let evt = rx_b.recv().await.unwrap();
        assert!(matches!(evt, Event::UserOffline(p) if p.user_id == 1));
        assert!(!hub.is_online(1).await);
    }

    #[tokio::test]
    async fn deliver_to_fans_out_to_every_session_of_a_user() {
        let hub = DeliveryHub::new();
        let (_s1, mut rx1) = hub.register(1).await;
        let (_s2, mut rx2) = hub.register(1).await;

        hub.deliver_to(1, Event::UserOffline(PresencePayload { user_id: 99 }))
            .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn online_many_reports_only_connected_users() {
        let hub = DeliveryHub::new();
        let (_s1, _rx1) = hub.register(1).await;

        let result = hub.online_many(&[1, 2]).await;
        assert_eq!(result.get(&1), Some(&true));
        assert_eq!(result.get(&2), Some(&false));
    }
}
