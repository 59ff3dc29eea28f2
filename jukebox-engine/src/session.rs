//! Session watcher
//!
//! Bridges session membership events to the registry: a participant
//! leaving stops all playback. This is the only automatic bulk stop;
//! there is no per-job timeout.

use crate::backend::PlaybackBackend;
use crate::registry::PlaybackRegistry;
use jukebox_common::SessionEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn a task that stops all playback whenever a participant leaves
///
/// Runs until the session event channel closes. A lagged receiver is
/// logged and the watcher keeps going; a missed leave event at worst
/// leaves playback running until the next one.
pub fn watch_sessions<B: PlaybackBackend>(
    registry: Arc<PlaybackRegistry<B>>,
    mut sessions: broadcast::Receiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match sessions.recv().await {
                Ok(SessionEvent::ParticipantLeft { participant_id }) => {
                    info!(participant_id = %participant_id, "participant left, stopping all playback");
                    registry.stop_all().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("session event channel closed, watcher exiting");
                    break;
                }
            }
        }
    })
}
