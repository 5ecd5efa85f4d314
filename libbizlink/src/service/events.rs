//! State change notifications
//!
//! An in-process event bus that tells observers which slice of the
//! application state changed after each dispatched action.
//!
//! # Non-Blocking Behavior
//!
//! If no subscribers exist, events are dropped immediately. Subscribers can
//! lag without blocking the dispatcher.
//!
//! # Example
//!
//! ```no_run
//! use libbizlink::service::events::{Event, EventBus, Slice};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::StateChanged(Slice::Session));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Event bus for distributing state change events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the specified per-subscriber capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: Event) {
        // send() only fails when nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Top-level slices of the application state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slice {
    Session,
    Company,
    Announcements,
    Projects,
    News,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// A dispatched action changed the given slice
    StateChanged(Slice),

    /// The root snapshot could not be written; in-memory state is still
    /// authoritative
    SnapshotFailed { error: String },
}
