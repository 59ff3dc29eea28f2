//! # Jukebox Common Library
//!
//! Shared code for the jukebox crates including:
//! - Location keys and sound descriptors
//! - Event types (JukeboxEvent enum) and the EventBus
//! - Session events (participant join/leave)
//! - Error taxonomy
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::JukeboxConfig;
pub use error::{Error, Result};
pub use events::{EventBus, JobOutcome, JukeboxEvent, SessionEvent};
pub use types::{LocationKey, Sound};
