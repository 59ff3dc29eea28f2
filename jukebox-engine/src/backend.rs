//! Playback backend trait
//!
//! The boundary to whatever actually makes noise. The registry is
//! generic over this trait; production glue implements it against the
//! host engine's sound system, tests implement it with a recorder.

use jukebox_common::{LocationKey, Result, Sound};
use std::future::Future;

/// External sound playback collaborator
///
/// `play` and `play_stream` resolve when the sound finishes naturally;
/// they are long-running and the registry races them against a
/// cancellation token, so implementations must be cancel-safe (dropping
/// the future abandons the call). `stop_at` silences a location
/// regardless of which job started the audio, and is what makes an
/// abandoned `play` fall silent rather than ring on.
///
/// Futures are required to be `Send` because job bodies run on spawned
/// tasks.
pub trait PlaybackBackend: Send + Sync + 'static {
    /// Play one sound at a location to completion
    fn play(&self, key: LocationKey, sound: &Sound) -> impl Future<Output = Result<()>> + Send;

    /// Open a streaming sound at a location and drain it to its end
    fn play_stream(
        &self,
        key: LocationKey,
        sound: &Sound,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Silence any currently sounding audio at a location
    fn stop_at(&self, key: LocationKey) -> impl Future<Output = Result<()>> + Send;
}
