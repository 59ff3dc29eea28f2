//! Event types and the EventBus
//!
//! Lifecycle events are broadcast via the EventBus; emission is lossy
//! because playback is best-effort background activity and having no
//! subscriber is normal. Session events arrive on a separate broadcast
//! channel supplied by the host glue.

use crate::types::LocationKey;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// How a playback job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    /// Natural end: a non-repeating sequence exhausted its sounds, or
    /// a stream drained to its end
    Completed,
    /// Cancellation observed (explicit stop, bulk stop, or replacement)
    Stopped,
    /// Backend error or panic terminated the job early
    Failed,
}

/// Jukebox lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JukeboxEvent {
    /// A sequence job was installed at a location
    SequenceQueued {
        key: LocationKey,
        job_id: Uuid,
        sound_count: usize,
        shuffle: bool,
        repeat: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A stream job was installed at a location
    StreamQueued {
        key: LocationKey,
        job_id: Uuid,
        sound: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A job handed one sound to the backend
    SoundStarted {
        key: LocationKey,
        job_id: Uuid,
        sound: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A job terminated and its key is free again
    JobFinished {
        key: LocationKey,
        job_id: Uuid,
        outcome: JobOutcome,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl JukeboxEvent {
    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            JukeboxEvent::SequenceQueued { .. } => "SequenceQueued",
            JukeboxEvent::StreamQueued { .. } => "StreamQueued",
            JukeboxEvent::SoundStarted { .. } => "SoundStarted",
            JukeboxEvent::JobFinished { .. } => "JobFinished",
        }
    }
}

/// Session membership events from the host glue
///
/// The only one the registry cares about is a participant leaving,
/// which triggers a bulk stop of all playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A participant disconnected from the session
    ParticipantLeft { participant_id: Uuid },
}

/// Broadcast bus for jukebox lifecycle events
///
/// A thin wrapper over tokio::broadcast. Emission never waits on a
/// subscriber: a job mid-playback publishes and moves on, and a
/// receiver that falls behind loses old events rather than slowing
/// the registry down. Any number of observers may subscribe and
/// unsubscribe (by dropping the receiver) at any time.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JukeboxEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Old events are dropped once `capacity` unread events buffer up
    /// for a subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JukeboxEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscriber is
    /// listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: JukeboxEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<JukeboxEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// The normal emission path for the registry: playback proceeds
    /// identically with zero subscribers.
    pub fn emit_lossy(&self, event: JukeboxEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
