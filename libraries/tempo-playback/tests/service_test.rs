//! Player service tests
//!
//! Drive the service through its handle while the test completes loads on
//! the engine's event channel.

mod common;

use common::{init_tracing, playing, playlist, EngineScript, ScriptedEngine};
use std::time::Duration;
use tempo_playback::{
    Outcome, PlaybackError, PlayerConfig, PlayerEvent, PlayerHandle, PlayerService, RawStatus,
};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn spawn(engine: ScriptedEngine) -> (PlayerHandle, tokio::task::JoinHandle<()>) {
    init_tracing();
    let config = PlayerConfig {
        shuffle_seed: Some(3),
        ..PlayerConfig::default()
    };
    PlayerService::spawn(engine, config)
}

/// Wait until the engine has accepted `count` loads
async fn wait_for_loads(script: &EngineScript, count: usize) {
    timeout(WAIT, async {
        while script.load_count() < count {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("engine never received the load");
}

/// Start `ids[0]` and complete its load
async fn start(player: &PlayerHandle, script: &EngineScript, ids: &[&str]) {
    let tracks = playlist(ids);
    let request = {
        let player = player.clone();
        tokio::spawn(async move { player.play_from_playlist(tracks[0].clone(), tracks, 0).await })
    };

    wait_for_loads(script, script.load_count() + 1).await;
    script.complete_last();

    let outcome = request.await.unwrap().unwrap();
    assert!(matches!(outcome, Outcome::Playing(ref t) if t.id == ids[0]));
}

#[tokio::test]
async fn play_resolves_when_load_completes() {
    let (engine, script) = ScriptedEngine::new();
    let (player, _task) = spawn(engine);
    let mut events = player.subscribe();

    start(&player, &script, &["a", "b"]).await;

    let mut state = player.watch();
    let snapshot = timeout(WAIT, state.wait_for(|s| s.playing))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(snapshot.current_index, Some(0));
    assert_eq!(snapshot.queue.len(), 2);

    let mut saw_track_change = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, PlayerEvent::TrackChanged { ref track_id, .. } if track_id == "a") {
            saw_track_change = true;
        }
    }
    assert!(saw_track_change);
}

#[tokio::test]
async fn superseded_requests_resolve_as_superseded() {
    let (engine, script) = ScriptedEngine::new();
    let (player, _task) = spawn(engine);
    start(&player, &script, &["a", "b", "c"]).await;

    let first = {
        let player = player.clone();
        tokio::spawn(async move { player.next().await })
    };
    wait_for_loads(&script, 2).await;

    let second = {
        let player = player.clone();
        tokio::spawn(async move { player.next().await })
    };
    wait_for_loads(&script, 3).await;

    assert_eq!(first.await.unwrap().unwrap(), Outcome::Superseded);

    script.complete_last();
    let outcome = second.await.unwrap().unwrap();
    assert!(matches!(outcome, Outcome::Playing(ref t) if t.id == "c"));
}

#[tokio::test]
async fn immediate_commands_reply_directly() {
    let (engine, script) = ScriptedEngine::new();
    let (player, _task) = spawn(engine);
    start(&player, &script, &["a", "b", "c"]).await;

    assert_eq!(player.toggle_play_pause().await.unwrap(), Outcome::Applied);
    assert!(player.toggle_shuffle().await.unwrap());
    assert_eq!(
        player.cycle_repeat_mode().await.unwrap(),
        tempo_playback::RepeatMode::Track
    );
    assert_eq!(player.seek(10_000).await.unwrap(), Outcome::Applied);

    let mut state = player.watch();
    let snapshot = timeout(WAIT, state.wait_for(|s| s.shuffle && !s.playing))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(snapshot.queue[0].id, "a");
    assert_eq!(snapshot.position_ms, 10_000);
}

#[tokio::test]
async fn pushed_statuses_reach_the_snapshot() {
    let (engine, script) = ScriptedEngine::new();
    let (player, _task) = spawn(engine);
    start(&player, &script, &["a"]).await;

    let id = script.last_load().unwrap().id;
    script.push(playing(id, 65_000.0, 200_000.0));

    let mut state = player.watch();
    let snapshot = timeout(WAIT, state.wait_for(|s| s.position_ms == 65_000))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(snapshot.duration_ms, 200_000);
}

#[tokio::test(start_paused = true)]
async fn polling_engine_is_polled() {
    let (engine, script) = ScriptedEngine::polling_seconds();
    let (player, _task) = spawn(engine);
    start(&player, &script, &["a"]).await;

    script.set_poll(RawStatus {
        load: Some(script.last_load().unwrap().id),
        playing: true,
        position: 30.0,
        duration: Some(200.0),
        ..RawStatus::default()
    });

    let mut state = player.watch();
    let snapshot = timeout(WAIT, state.wait_for(|s| s.position_ms == 30_000))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(snapshot.duration_ms, 200_000);
}

#[tokio::test]
async fn failed_load_is_reported_to_caller() {
    let (engine, script) = ScriptedEngine::new();
    let (player, _task) = spawn(engine);
    start(&player, &script, &["a", "b"]).await;

    let request = {
        let player = player.clone();
        tokio::spawn(async move { player.next().await })
    };
    wait_for_loads(&script, 2).await;
    let id = script.last_load().unwrap().id;
    script.push(common::load_failed(id));

    let result = request.await.unwrap();
    assert!(matches!(result, Err(PlaybackError::EngineLoad { .. })));
    assert_eq!(player.snapshot().current_index, Some(0));
}

#[tokio::test]
async fn shutdown_closes_the_service() {
    let (engine, script) = ScriptedEngine::new();
    let (player, task) = spawn(engine);
    start(&player, &script, &["a"]).await;

    player.shutdown().await.unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();

    assert!(matches!(
        player.next().await,
        Err(PlaybackError::ServiceClosed)
    ));
    assert_eq!(script.calls().last(), Some(&common::Call::Stop));
}

#[tokio::test]
async fn dropping_every_handle_stops_the_service() {
    let (engine, _script) = ScriptedEngine::new();
    let (player, task) = spawn(engine);

    drop(player);
    timeout(WAIT, task).await.unwrap().unwrap();
}
