//! Event types for the navigator event system
//!
//! Provides the shared event definitions and the EventBus used by the fitment
//! tree and the expansion controller to reach the surrounding application.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::navigation::{NodeKey, PartSelection, UnresolvedEntity, VehicleScope};

/// Navigator event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to a view layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NavigatorEvent {
    /// A concrete leaf category was selected for a vehicle
    ///
    /// Triggers:
    /// - Parts query: load parts for the category/engine pair
    /// - View: update the breadcrumb
    PartTypeSelected {
        /// Fully-resolved selection
        selection: PartSelection,
        /// When the selection was made
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An engine node was expanded
    ///
    /// Triggers:
    /// - App: set ambient vehicle context for category-scoped search
    VehicleExpanded {
        /// Vehicle the engine belongs to, engine fields populated
        scope: VehicleScope,
        /// When the engine was expanded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A tree node was expanded (fetch of its children issued)
    NodeExpanded {
        key: NodeKey,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A tree node was collapsed
    NodeCollapsed {
        key: NodeKey,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Child fetch for an expanded node failed; the node stays expanded and empty
    NodeLoadFailed {
        key: NodeKey,
        /// Provider error message
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A search-driven category expansion could not resolve every entity
    ///
    /// NOTE: No PartTypeSelected follows; the tree keeps the expanded ancestors.
    ResolutionFailed {
        /// Identifiers missing from the provider's answers
        unresolved: Vec<UnresolvedEntity>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl NavigatorEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            NavigatorEvent::PartTypeSelected { .. } => "PartTypeSelected",
            NavigatorEvent::VehicleExpanded { .. } => "VehicleExpanded",
            NavigatorEvent::NodeExpanded { .. } => "NodeExpanded",
            NavigatorEvent::NodeCollapsed { .. } => "NodeCollapsed",
            NavigatorEvent::NodeLoadFailed { .. } => "NodeLoadFailed",
            NavigatorEvent::ResolutionFailed { .. } => "ResolutionFailed",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for navigator events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use partnav_common::events::{EventBus, NavigatorEvent};
/// use partnav_common::NodeKey;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(NavigatorEvent::NodeExpanded {
///     key: NodeKey::Year { year: 2010 },
///     timestamp: chrono::Utc::now(),
/// });
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.event_type(), "NodeExpanded");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<NavigatorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<NavigatorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: NavigatorEvent,
    ) -> Result<usize, broadcast::error::SendError<NavigatorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: NavigatorEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        let result = bus.emit(NavigatorEvent::NodeCollapsed {
            key: NodeKey::Engine { engine_id: 1 },
            timestamp: chrono::Utc::now(),
        });
        assert!(result.is_err());

        // Lossy emit never fails
        bus.emit_lossy(NavigatorEvent::NodeCollapsed {
            key: NodeKey::Engine { engine_id: 1 },
            timestamp: chrono::Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(NavigatorEvent::NodeExpanded {
            key: NodeKey::Year { year: 2010 },
            timestamp: chrono::Utc::now(),
        });
        bus.emit_lossy(NavigatorEvent::ResolutionFailed {
            unresolved: vec![UnresolvedEntity::Category(99)],
            timestamp: chrono::Utc::now(),
        });

        assert_eq!(rx.recv().await.unwrap().event_type(), "NodeExpanded");
        match rx.recv().await.unwrap() {
            NavigatorEvent::ResolutionFailed { unresolved, .. } => {
                assert_eq!(unresolved, vec![UnresolvedEntity::Category(99)]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = NavigatorEvent::NodeLoadFailed {
            key: NodeKey::Make { year: 2010, make_id: 5 },
            message: "timeout".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NodeLoadFailed");
        assert_eq!(json["key"]["level"], "make");
        assert_eq!(json["key"]["make_id"], 5);
    }
}
