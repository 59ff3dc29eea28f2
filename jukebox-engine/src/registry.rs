//! Playback job registry
//!
//! The process-wide key-to-job table. At most one job occupies a key
//! at any instant; that invariant is never relaxed. Operations on one
//! key are linearized by a registry-wide admission lock, each fully
//! settling (old job cancelled, silenced, joined, removed) before the
//! next applies. The table itself is a separate brief-critical-section
//! lock so a terminating job's self-deregistration never contends with
//! a held admission lock.

use crate::backend::PlaybackBackend;
use crate::job::{self, JobContext, JobHandle, JobTable, PlaybackMode, RunState, RunStateCell};
use jukebox_common::{
    Error, EventBus, JukeboxConfig, JukeboxEvent, LocationKey, Result, Sound,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Registry of active playback jobs, generic over the sound backend
///
/// Public operations never block the caller for the duration of
/// playback; they block only briefly, to mutate the table and to hand
/// off cancellation to a departing job.
pub struct PlaybackRegistry<B: PlaybackBackend> {
    backend: Arc<B>,

    /// Key-to-job table; insert, replace, and remove are each one
    /// atomic critical section
    jobs: JobTable,

    /// Serializes admission and removal so same-key operations apply
    /// in arrival order. Never held across a table-lock acquisition
    /// inside job tasks (they only touch `jobs`), so no deadlock.
    op_lock: Mutex<()>,

    config: JukeboxConfig,
    events: EventBus,
}

impl<B: PlaybackBackend> PlaybackRegistry<B> {
    /// Create a registry over the given backend
    pub fn new(backend: B, config: JukeboxConfig) -> Self {
        let events = EventBus::new(config.event_channel_capacity);
        Self {
            backend: Arc::new(backend),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            op_lock: Mutex::new(()),
            config,
            events,
        }
    }

    /// Queue a sequence of sounds at a location
    ///
    /// An empty sequence is a no-op. A sequence longer than the
    /// configured cap, or containing an invalid sound, is rejected
    /// without touching the table. If the location is already
    /// occupied, the existing job is cancelled, silenced, and removed
    /// before the new one is installed (replace, never merge).
    pub async fn queue_sequence(
        &self,
        key: LocationKey,
        sounds: Vec<Sound>,
        shuffle: bool,
        repeat: bool,
    ) -> Result<()> {
        if sounds.is_empty() {
            debug!(key = %key, "empty sequence, nothing queued");
            return Ok(());
        }
        if sounds.len() > self.config.max_sequence_len {
            return Err(Error::InvalidRequest(format!(
                "sequence of {} sounds exceeds cap of {}",
                sounds.len(),
                self.config.max_sequence_len
            )));
        }
        for sound in &sounds {
            sound.validate()?;
        }

        let _op = self.op_lock.lock().await;
        let replaced = self.settle(key).await;
        let sound_count = sounds.len();
        let job_id = Uuid::new_v4();
        info!(
            key = %key, job_id = %job_id, sounds = sound_count,
            shuffle, repeat, replaced, "sequence queued"
        );
        // Emitted before the spawn so subscribers see the queue event
        // ahead of the job's own SoundStarted
        self.events.emit_lossy(JukeboxEvent::SequenceQueued {
            key,
            job_id,
            sound_count,
            shuffle,
            repeat,
            timestamp: chrono::Utc::now(),
        });
        self.install(
            key,
            job_id,
            PlaybackMode::Sequence {
                sounds,
                shuffle,
                repeat,
            },
        )
        .await;
        Ok(())
    }

    /// Queue a streaming sound at a location
    ///
    /// If the location is already occupied by any job, this is a
    /// no-op and the existing playback is left undisturbed: a dedup
    /// guard against duplicate stream-start requests racing each
    /// other.
    pub async fn queue_stream(&self, key: LocationKey, sound: Sound) -> Result<()> {
        sound.validate_stream()?;

        let _op = self.op_lock.lock().await;
        if self.jobs.lock().await.contains_key(&key) {
            debug!(key = %key, "location occupied, stream request ignored");
            return Ok(());
        }
        let name = sound.name.clone();
        let job_id = Uuid::new_v4();
        info!(key = %key, job_id = %job_id, sound = %name, "stream queued");
        self.events.emit_lossy(JukeboxEvent::StreamQueued {
            key,
            job_id,
            sound: name,
            timestamp: chrono::Utc::now(),
        });
        self.install(key, job_id, PlaybackMode::Stream { sound }).await;
        Ok(())
    }

    /// Stop playback at a location
    ///
    /// No-op if the location is unoccupied. Otherwise the entry is
    /// removed, the job's cancellation token is set, the backend is
    /// told to silence the location, and the task is joined; once this
    /// returns, no further backend calls for the key occur from the
    /// stopped job.
    pub async fn stop_at(&self, key: LocationKey) {
        let _op = self.op_lock.lock().await;
        if self.settle(key).await {
            info!(key = %key, "playback stopped");
        } else {
            debug!(key = %key, "stop requested for unoccupied location");
        }
    }

    /// Stop all playback
    ///
    /// Takes a stable snapshot of occupied keys and stops each. Jobs
    /// queued after the snapshot is taken are not guaranteed to be
    /// stopped by this call.
    pub async fn stop_all(&self) {
        let _op = self.op_lock.lock().await;
        let keys: Vec<LocationKey> = self.jobs.lock().await.keys().copied().collect();
        if keys.is_empty() {
            return;
        }
        info!(count = keys.len(), "stopping all playback");
        for key in keys {
            self.settle(key).await;
        }
    }

    /// Whether a job currently occupies the key
    pub async fn is_occupied(&self, key: LocationKey) -> bool {
        self.jobs.lock().await.contains_key(&key)
    }

    /// Snapshot of currently occupied keys
    pub async fn active_keys(&self) -> Vec<LocationKey> {
        self.jobs.lock().await.keys().copied().collect()
    }

    /// Number of live jobs
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Whether no jobs are live
    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Run state of the job at a key, if one is live
    pub async fn run_state(&self, key: LocationKey) -> Option<RunState> {
        self.jobs
            .lock()
            .await
            .get(&key)
            .map(|handle| handle.run_state.get())
    }

    /// Lifecycle event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The playback backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Active configuration
    pub fn config(&self) -> &JukeboxConfig {
        &self.config
    }

    /// Spawn a job task and install its handle under `key`
    ///
    /// Caller holds the admission lock and has settled the key. The
    /// table lock is taken before spawning so the new task's eventual
    /// self-deregistration cannot run ahead of its own insertion.
    async fn install(&self, key: LocationKey, job_id: Uuid, mode: PlaybackMode) {
        let cancel = CancellationToken::new();
        let run_state = Arc::new(RunStateCell::new());
        let ctx = JobContext {
            key,
            job_id,
            cancel: cancel.clone(),
            run_state: Arc::clone(&run_state),
        };
        let backend = Arc::clone(&self.backend);
        let jobs = Arc::clone(&self.jobs);
        let events = self.events.clone();

        let mut table = self.jobs.lock().await;
        let task = tokio::spawn(job::run(backend, mode, ctx, events, jobs));
        table.insert(
            key,
            JobHandle {
                job_id,
                cancel,
                run_state,
                task,
            },
        );
    }

    /// Cancel, silence, and join the job at `key`, removing its entry
    ///
    /// Caller holds the admission lock. Returns false if the key was
    /// unoccupied. The entry is removed before anything is awaited, so
    /// no caller can observe the key as free while the departing task
    /// might still emit playback calls: the token is already set and
    /// the backend already silenced by the time the admission lock is
    /// released.
    async fn settle(&self, key: LocationKey) -> bool {
        let old = self.jobs.lock().await.remove(&key);
        let Some(old) = old else {
            return false;
        };

        old.run_state.advance(RunState::CancelRequested);
        old.cancel.cancel();
        if let Err(e) = self.backend.stop_at(key).await {
            warn!(key = %key, error = %e, "backend stop_at failed");
        }
        if let Err(e) = old.task.await {
            warn!(key = %key, job_id = %old.job_id, error = %e, "job task did not join cleanly");
        }
        true
    }
}
