//! Job lifecycle and the background task body
//!
//! A job is one active playback task: a (possibly shuffled, possibly
//! repeating) sequence of sounds, or a single stream. The body checks
//! its cancellation token before every sound and races it against
//! every in-flight backend call, so a stop request never waits for a
//! song to finish on its own.

use crate::backend::PlaybackBackend;
use futures::FutureExt;
use jukebox_common::{EventBus, JobOutcome, JukeboxEvent, LocationKey, Sound};
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use uuid::Uuid;

/// What a job plays
#[derive(Debug, Clone)]
pub enum PlaybackMode {
    /// An ordered list of sounds, optionally reshuffled per pass,
    /// optionally looping until stopped
    Sequence {
        sounds: Vec<Sound>,
        shuffle: bool,
        repeat: bool,
    },
    /// A single streaming sound played until it ends or is stopped
    Stream { sound: Sound },
}

/// Run state of a job, monotonic: Running advances to CancelRequested
/// advances to Terminated, never backwards, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Running = 0,
    CancelRequested = 1,
    Terminated = 2,
}

/// Lock-free cell holding a RunState
///
/// `advance` uses fetch_max so concurrent writers (the stopping caller
/// and the terminating task) can never move the state backwards.
pub(crate) struct RunStateCell(AtomicU8);

impl RunStateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(RunState::Running as u8))
    }

    pub fn get(&self) -> RunState {
        match self.0.load(Ordering::Acquire) {
            0 => RunState::Running,
            1 => RunState::CancelRequested,
            _ => RunState::Terminated,
        }
    }

    pub fn advance(&self, next: RunState) {
        self.0.fetch_max(next as u8, Ordering::AcqRel);
    }
}

/// Registry-side handle to a live job
pub(crate) struct JobHandle {
    pub job_id: Uuid,
    pub cancel: CancellationToken,
    pub run_state: Arc<RunStateCell>,
    pub task: JoinHandle<()>,
}

/// The key-to-job table. Brief critical sections only: nothing awaits
/// while holding this lock.
pub(crate) type JobTable = Arc<Mutex<HashMap<LocationKey, JobHandle>>>;

/// Identity and cancellation signal carried by a running job body
pub(crate) struct JobContext {
    pub key: LocationKey,
    pub job_id: Uuid,
    pub cancel: CancellationToken,
    pub run_state: Arc<RunStateCell>,
}

/// Outcome of one backend call raced against cancellation
enum StepResult {
    Done,
    Cancelled,
    Failed,
}

/// Background task entry point
///
/// Runs the mode to completion, marks the job Terminated, then
/// deregisters itself by compare-and-remove: the entry is removed only
/// if it still carries this job's id, so racing an external stop on
/// the same key leaves exactly one remover effective and the other a
/// silent no-op.
pub(crate) async fn run<B: PlaybackBackend>(
    backend: Arc<B>,
    mode: PlaybackMode,
    ctx: JobContext,
    events: EventBus,
    jobs: JobTable,
) {
    let outcome = match &mode {
        PlaybackMode::Sequence {
            sounds,
            shuffle,
            repeat,
        } => run_sequence(&*backend, &ctx, &events, sounds, *shuffle, *repeat).await,
        PlaybackMode::Stream { sound } => run_stream(&*backend, &ctx, &events, sound).await,
    };

    ctx.run_state.advance(RunState::Terminated);

    let removed = {
        let mut jobs = jobs.lock().await;
        match jobs.get(&ctx.key) {
            Some(current) if current.job_id == ctx.job_id => {
                jobs.remove(&ctx.key);
                true
            }
            _ => false,
        }
    };
    if removed {
        debug!(key = %ctx.key, job_id = %ctx.job_id, ?outcome, "job deregistered itself");
    } else {
        debug!(key = %ctx.key, job_id = %ctx.job_id, ?outcome, "job already removed externally");
    }

    events.emit_lossy(JukeboxEvent::JobFinished {
        key: ctx.key,
        job_id: ctx.job_id,
        outcome,
        timestamp: chrono::Utc::now(),
    });
}

async fn run_sequence<B: PlaybackBackend>(
    backend: &B,
    ctx: &JobContext,
    events: &EventBus,
    sounds: &[Sound],
    shuffle: bool,
    repeat: bool,
) -> JobOutcome {
    loop {
        // Fresh permutation per pass when shuffling. The RNG lives in
        // a non-await scope: thread_rng is not Send.
        let order: Vec<usize> = {
            let mut order: Vec<usize> = (0..sounds.len()).collect();
            if shuffle {
                order.shuffle(&mut rand::thread_rng());
            }
            order
        };

        for index in order {
            if ctx.cancel.is_cancelled() {
                return JobOutcome::Stopped;
            }
            let sound = &sounds[index];
            debug!(key = %ctx.key, job_id = %ctx.job_id, sound = %sound, "playing sound");
            events.emit_lossy(JukeboxEvent::SoundStarted {
                key: ctx.key,
                job_id: ctx.job_id,
                sound: sound.name.clone(),
                timestamp: chrono::Utc::now(),
            });
            match play_step(ctx, backend.play(ctx.key, sound)).await {
                StepResult::Done => {}
                StepResult::Cancelled => return JobOutcome::Stopped,
                StepResult::Failed => return JobOutcome::Failed,
            }
        }

        if !repeat {
            return JobOutcome::Completed;
        }
    }
}

async fn run_stream<B: PlaybackBackend>(
    backend: &B,
    ctx: &JobContext,
    events: &EventBus,
    sound: &Sound,
) -> JobOutcome {
    if ctx.cancel.is_cancelled() {
        return JobOutcome::Stopped;
    }
    debug!(key = %ctx.key, job_id = %ctx.job_id, sound = %sound, "opening stream");
    events.emit_lossy(JukeboxEvent::SoundStarted {
        key: ctx.key,
        job_id: ctx.job_id,
        sound: sound.name.clone(),
        timestamp: chrono::Utc::now(),
    });
    match play_step(ctx, backend.play_stream(ctx.key, sound)).await {
        StepResult::Done => JobOutcome::Completed,
        StepResult::Cancelled => JobOutcome::Stopped,
        StepResult::Failed => JobOutcome::Failed,
    }
}

/// Race one backend call against the job's cancellation token
///
/// Cancellation wins ties (biased select) so a stop request observed
/// mid-call abandons the call instead of letting it run out. Backend
/// panics are contained here; they terminate the job like a failure
/// and never unwind into the registry.
async fn play_step<F>(ctx: &JobContext, call: F) -> StepResult
where
    F: Future<Output = jukebox_common::Result<()>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => StepResult::Cancelled,
        result = AssertUnwindSafe(call).catch_unwind() => match result {
            Ok(Ok(())) => StepResult::Done,
            Ok(Err(e)) => {
                error!(key = %ctx.key, job_id = %ctx.job_id, error = %e, "backend playback failed");
                StepResult::Failed
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(key = %ctx.key, job_id = %ctx.job_id, panic = %message, "backend panicked");
                StepResult::Failed
            }
        },
    }
}
