//! Event system for workout and timer activity
//!
//! This module provides an in-process event bus so front ends can react to
//! what the services do (a new PR, the rest timer finishing) without the
//! services knowing who is listening.
//!
//! The bus uses `tokio::sync::broadcast` for multi-subscriber support. If no
//! subscribers exist, events are dropped immediately. Subscribers can lag
//! without blocking emitters.
//!
//! # Example
//!
//! ```no_run
//! use libironnotes::service::events::{EventBus, Event};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::TimerStarted { duration_secs: 90 });
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

/// Event bus for distributing service events
///
/// Cloning the bus shares the underlying channel.
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
    ///
    /// Never blocks. Lagging subscribers lose the oldest events first.
    pub fn emit(&self, event: Event) {
        // send() returns Err if no receivers exist, which is fine
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Events emitted by services and the rest timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: String,
        /// Exercises copied from the previous session
        cloned_exercises: usize,
    },

    SessionFinished {
        session_id: String,
        duration_secs: i64,
    },

    SetLogged {
        set_id: String,
        exercise_name: String,
        weight: f64,
        reps: u32,
    },

    /// A set became the PR holder for its exercise
    PersonalRecord {
        set_id: String,
        exercise_name: String,
        estimated_1rm: f64,
    },

    /// A same-session set lost the PR flag to a better one
    PersonalRecordReplaced {
        previous_set_id: String,
        set_id: String,
        exercise_name: String,
    },

    TimerStarted {
        duration_secs: u32,
    },

    TimerPaused {
        remaining_secs: u32,
    },

    TimerResumed {
        remaining_secs: u32,
    },

    TimerAdjusted {
        remaining_secs: u32,
        total_secs: u32,
    },

    TimerStopped,

    /// The rest interval is over
    TimerExpired {
        total_secs: u32,
    },
}
