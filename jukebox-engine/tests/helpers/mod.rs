#![allow(dead_code)]
//! Test helpers for registry integration tests
//!
//! Provides a recording playback backend with configurable per-sound
//! duration, failure injection, and panic injection, plus small
//! polling utilities for awaiting registry state.

use jukebox_common::{Error, LocationKey, Result, Sound};
use jukebox_engine::{PlaybackBackend, PlaybackRegistry};
use std::sync::Mutex;
use std::time::Duration;

/// One observed backend invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Play { key: LocationKey, sound: String },
    PlayStream { key: LocationKey, sound: String },
    StopAt { key: LocationKey },
}

/// Backend that records every call and simulates playback with sleeps
pub struct RecordingBackend {
    calls: Mutex<Vec<BackendCall>>,
    /// Simulated duration of one sound (and of one whole stream)
    play_duration: Duration,
    /// Sound name whose playback returns a backend error
    fail_on: Option<String>,
    /// Sound name whose playback panics
    panic_on: Option<String>,
}

impl RecordingBackend {
    pub fn new(play_duration: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            play_duration,
            fail_on: None,
            panic_on: None,
        }
    }

    pub fn failing_on(play_duration: Duration, name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::new(play_duration)
        }
    }

    pub fn panicking_on(play_duration: Duration, name: &str) -> Self {
        Self {
            panic_on: Some(name.to_string()),
            ..Self::new(play_duration)
        }
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of sounds handed to `play` for a key, in order
    pub fn plays_for(&self, key: LocationKey) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Play { key: k, sound } if k == key => Some(sound),
                _ => None,
            })
            .collect()
    }

    /// Names of sounds handed to `play_stream` for a key, in order
    pub fn streams_for(&self, key: LocationKey) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::PlayStream { key: k, sound } if k == key => Some(sound),
                _ => None,
            })
            .collect()
    }

    /// Number of `stop_at` calls observed for a key
    pub fn stops_for(&self, key: LocationKey) -> usize {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, BackendCall::StopAt { key: k } if *k == key))
            .count()
    }

    /// Total number of playback calls (play + play_stream) observed
    pub fn playback_call_count(&self) -> usize {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, BackendCall::StopAt { .. }))
            .count()
    }
}

impl PlaybackBackend for RecordingBackend {
    async fn play(&self, key: LocationKey, sound: &Sound) -> Result<()> {
        self.record(BackendCall::Play {
            key,
            sound: sound.name.clone(),
        });
        if self.panic_on.as_deref() == Some(sound.name.as_str()) {
            panic!("decoder exploded on {}", sound.name);
        }
        tokio::time::sleep(self.play_duration).await;
        if self.fail_on.as_deref() == Some(sound.name.as_str()) {
            return Err(Error::Backend(format!("cannot decode {}", sound.name)));
        }
        Ok(())
    }

    async fn play_stream(&self, key: LocationKey, sound: &Sound) -> Result<()> {
        self.record(BackendCall::PlayStream {
            key,
            sound: sound.name.clone(),
        });
        tokio::time::sleep(self.play_duration).await;
        Ok(())
    }

    async fn stop_at(&self, key: LocationKey) -> Result<()> {
        self.record(BackendCall::StopAt { key });
        Ok(())
    }
}

/// Poll a condition until it holds, panicking after `deadline`
pub async fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(deadline, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not met within {:?}", deadline);
}

/// Wait until a key is no longer occupied
pub async fn wait_for_free<B: PlaybackBackend>(
    registry: &PlaybackRegistry<B>,
    key: LocationKey,
    deadline: Duration,
) {
    let waited = tokio::time::timeout(deadline, async {
        while registry.is_occupied(key).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "key {} still occupied after {:?}", key, deadline);
}

pub fn sound(name: &str) -> Sound {
    Sound::new(name, "tester", 3, format!("records/{}.ogg", name))
}

pub fn key(n: i32) -> LocationKey {
    LocationKey::new(n, 64, -n, 0)
}

/// Install a test subscriber for tracing output; safe to call from
/// every test
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
