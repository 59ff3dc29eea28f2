//! Integration tests for the session watcher

mod helpers;

use helpers::*;
use jukebox_common::{JukeboxConfig, SessionEvent};
use jukebox_engine::{watch_sessions, PlaybackRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

const DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn participant_leaving_stops_all_playback() {
    init_tracing();
    let registry = Arc::new(PlaybackRegistry::new(
        RecordingBackend::new(Duration::from_secs(30)),
        JukeboxConfig::default(),
    ));
    let (tx, rx) = broadcast::channel(8);
    let watcher = watch_sessions(Arc::clone(&registry), rx);

    let (k1, k2) = (key(1), key(2));
    registry
        .queue_sequence(k1, vec![sound("a")], false, true)
        .await
        .unwrap();
    registry.queue_stream(k2, sound("b")).await.unwrap();
    assert_eq!(registry.len().await, 2);

    tx.send(SessionEvent::ParticipantLeft {
        participant_id: Uuid::new_v4(),
    })
    .unwrap();

    let empty = tokio::time::timeout(DEADLINE, async {
        while !registry.is_empty().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(empty.is_ok(), "registry not drained after participant left");
    assert_eq!(registry.backend().stops_for(k1), 1);
    assert_eq!(registry.backend().stops_for(k2), 1);

    drop(tx);
    tokio::time::timeout(DEADLINE, watcher)
        .await
        .expect("watcher did not exit after channel close")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_exits_when_channel_closes() {
    init_tracing();
    let registry = Arc::new(PlaybackRegistry::new(
        RecordingBackend::new(Duration::from_millis(10)),
        JukeboxConfig::default(),
    ));
    let (tx, rx) = broadcast::channel(8);
    let watcher = watch_sessions(registry, rx);
    drop(tx);
    tokio::time::timeout(DEADLINE, watcher)
        .await
        .expect("watcher did not exit after channel close")
        .unwrap();
}
