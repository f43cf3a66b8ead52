//! Cache Event Module
//!
//! Fire-and-forget notifications for observability collaborators. Emission
//! never blocks and never fails the cache operation that produced it; events
//! for lagging or absent subscribers are simply dropped.

use tokio::sync::broadcast;

use crate::cache::Tier;

/// Capacity of the notification channel before slow subscribers lag.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// == Cache Event ==
/// Named notification emitted by the tier manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A get was served, with the tier that held the key
    Hit { key: String, tier: Tier },
    /// A get found the key in no tier
    Miss { key: String },
    /// All tiers were emptied
    Cleared,
    /// A key was explicitly deleted
    Deleted { key: String },
}

// == Event Bus ==
/// Broadcast fan-out for cache events.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    /// Creates a bus with no subscribers yet.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Emits an event to all current subscribers.
    pub fn emit(&self, event: CacheEvent) {
        // Send errors only mean nobody is listening
        let _ = self.sender.send(event);
    }

    /// Registers a new subscriber receiving events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.emit(CacheEvent::Cleared);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(CacheEvent::Miss {
            key: "key1".to_string(),
        });
        bus.emit(CacheEvent::Deleted {
            key: "key1".to_string(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            CacheEvent::Miss {
                key: "key1".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            CacheEvent::Deleted {
                key: "key1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();

        bus.emit(CacheEvent::Cleared);
        let mut rx = bus.subscribe();
        bus.emit(CacheEvent::Miss {
            key: "k".to_string(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            CacheEvent::Miss {
                key: "k".to_string()
            }
        );
    }
}
