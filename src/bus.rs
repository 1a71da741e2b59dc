//! Inter-tab synchronization: a named broadcast topic per room carrying
//! full-state snapshots and hard-reset notices. Last writer wins; receivers
//! validate everything the same way the store does, because a peer tab is
//! untrusted input like any other.

use crate::store::decode_snapshot;
use crate::types::{GameState, RoomId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Enough backlog for a burst of rapid dispatches from one tab.
const TOPIC_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum BusMessage {
    /// Full-state snapshot, carried raw so receivers re-validate it.
    Snapshot { room_id: RoomId, state: Value },
    /// A room was hard-reset; receivers drop local state for that room.
    HardReset { room_id: RoomId, at: String },
}

pub struct SyncBus {
    topics: Mutex<HashMap<RoomId, broadcast::Sender<BusMessage>>>,
}

impl SyncBus {
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a room's topic, creating it on first use.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<BusMessage> {
        self.sender(room_id).subscribe()
    }

    /// Publish the current state of a room to its topic.
    pub fn publish_snapshot(&self, state: &GameState) {
        let value = match serde_json::to_value(state) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(room = %state.room_id, error = %e, "snapshot serialization failed");
                return;
            }
        };
        // Ignore send errors (no receivers connected is fine)
        let _ = self.sender(&state.room_id).send(BusMessage::Snapshot {
            room_id: state.room_id.clone(),
            state: value,
        });
    }

    pub fn publish_reset(&self, room_id: &str) {
        let _ = self.sender(room_id).send(BusMessage::HardReset {
            room_id: room_id.to_string(),
            at: chrono::Utc::now().to_rfc3339(),
        });
    }

    fn sender(&self, room_id: &str) -> broadcast::Sender<BusMessage> {
        let mut topics = self.topics.lock().expect("bus lock poisoned");
        topics
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter an incoming message for one room: snapshots for other rooms or
/// ones that fail structural validation are dropped.
pub fn accept_snapshot(msg: &BusMessage, room_id: &str) -> Option<GameState> {
    match msg {
        BusMessage::Snapshot {
            room_id: msg_room,
            state,
        } => {
            if msg_room != room_id {
                return None;
            }
            let decoded = decode_snapshot(state.clone());
            if decoded.is_none() {
                tracing::warn!(room = %room_id, "dropped malformed snapshot from bus");
            }
            decoded
        }
        BusMessage::HardReset { .. } => None,
    }
}

/// True when the message is a hard-reset notice for this room.
pub fn is_reset_for(msg: &BusMessage, room_id: &str) -> bool {
    matches!(msg, BusMessage::HardReset { room_id: r, .. } if r == room_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    #[tokio::test]
    async fn test_snapshot_reaches_subscriber() {
        let bus = SyncBus::new();
        let mut rx = bus.subscribe("room_a");

        let state = GameState::new("room_a");
        bus.publish_snapshot(&state);

        let msg = rx.recv().await.unwrap();
        let received = accept_snapshot(&msg, "room_a").unwrap();
        assert_eq!(received, state);
        assert_eq!(received.phase, Phase::Setup);
    }

    #[tokio::test]
    async fn test_foreign_room_snapshot_is_dropped() {
        let bus = SyncBus::new();
        let mut rx = bus.subscribe("room_a");

        // Same topic, mismatched embedded room id: must be discarded.
        let msg = BusMessage::Snapshot {
            room_id: "room_b".to_string(),
            state: serde_json::to_value(GameState::new("room_b")).unwrap(),
        };
        let _ = bus.sender("room_a").send(msg);

        let msg = rx.recv().await.unwrap();
        assert!(accept_snapshot(&msg, "room_a").is_none());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_dropped() {
        let msg = BusMessage::Snapshot {
            room_id: "room_a".to_string(),
            state: serde_json::json!({"schema_version": 42}),
        };
        assert!(accept_snapshot(&msg, "room_a").is_none());
    }

    #[tokio::test]
    async fn test_reset_notice() {
        let bus = SyncBus::new();
        let mut rx = bus.subscribe("room_a");
        bus.publish_reset("room_a");

        let msg = rx.recv().await.unwrap();
        assert!(is_reset_for(&msg, "room_a"));
        assert!(!is_reset_for(&msg, "room_b"));
        assert!(accept_snapshot(&msg, "room_a").is_none());
    }

    #[tokio::test]
    async fn test_topics_are_isolated_per_room() {
        let bus = SyncBus::new();
        let mut rx_a = bus.subscribe("room_a");
        let mut rx_b = bus.subscribe("room_b");

        bus.publish_snapshot(&GameState::new("room_b"));

        let msg = rx_b.recv().await.unwrap();
        assert!(accept_snapshot(&msg, "room_b").is_some());
        assert!(
            rx_a.try_recv().is_err(),
            "room_a must not see room_b traffic"
        );
    }

    #[tokio::test]
    async fn test_last_writer_wins_ordering() {
        let bus = SyncBus::new();
        let mut rx = bus.subscribe("room_a");

        let mut first = GameState::new("room_a");
        first.next_display_id = 2;
        let mut second = GameState::new("room_a");
        second.next_display_id = 7;
        bus.publish_snapshot(&first);
        bus.publish_snapshot(&second);

        // Receivers apply snapshots in order; the last one applied wins.
        let mut latest = None;
        while let Ok(msg) = rx.try_recv() {
            if let Some(state) = accept_snapshot(&msg, "room_a") {
                latest = Some(state);
            }
        }
        assert_eq!(latest.unwrap().next_display_id, 7);
    }
}
