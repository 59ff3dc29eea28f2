//! # Jukebox Engine
//!
//! Location-keyed playback job registry: starts, tracks, and cancels
//! long-running audio playback tasks, one per location, and keeps the
//! key-to-job table consistent under concurrent queue/stop requests
//! and bulk teardown.
//!
//! # Architecture
//!
//! - **PlaybackBackend** (trait): the external collaborator that
//!   actually produces audio. Its `play`/`play_stream` calls run for
//!   the length of a song and are interrupted cooperatively.
//! - **PlaybackRegistry**: the process-wide key-to-job table. Owns job
//!   creation, spawns background tasks, owns cancellation (individual
//!   or bulk).
//! - **Job body** (internal): plays a sequence (optionally shuffled,
//!   optionally repeating) or a single stream, observing its
//!   cancellation token between every sound and racing it against
//!   every in-flight backend call.
//! - **Session watcher**: subscribes to session events and stops all
//!   playback when a participant leaves.

pub mod backend;
pub mod job;
pub mod registry;
pub mod session;

pub use backend::PlaybackBackend;
pub use job::{PlaybackMode, RunState};
pub use registry::PlaybackRegistry;
pub use session::watch_sessions;
