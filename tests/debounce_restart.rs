//! Controller behaviour under virtual time, with the supervisor replaced by
//! a bare channel so restart dispatch timing can be observed directly.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use watchrun::config::{
    CONFIG_FILE_NAME, DEFAULT_DEBOUNCE_DELAY_MS, LOG_FILE_NAME, STATE_DIR_NAME,
};
use watchrun::console::ConsoleCommand;
use watchrun::engine::{ControlEvent, Controller};
use watchrun::exec::{RestartCause, SupervisorCommand};
use watchrun::watch::{ChangeKind, ChangeRecord};

struct Harness {
    dir: TempDir,
    events_tx: mpsc::Sender<ControlEvent>,
    supervisor_rx: mpsc::Receiver<SupervisorCommand>,
}

impl Harness {
    async fn send(&self, event: ControlEvent) {
        self.events_tx.send(event).await.expect("controller alive");
    }

    async fn recv_within(&mut self, ms: u64) -> Option<SupervisorCommand> {
        timeout(Duration::from_millis(ms), self.supervisor_rx.recv())
            .await
            .ok()
            .flatten()
    }

    async fn assert_quiet_for(&mut self, ms: u64) {
        if let Some(cmd) = self.recv_within(ms).await {
            panic!("unexpected supervisor command: {cmd:?}");
        }
    }

    async fn expect_restart(&mut self, within_ms: u64) -> RestartCause {
        match self.recv_within(within_ms).await {
            Some(SupervisorCommand::Restart { cause }) => cause,
            other => panic!("expected a restart, got {other:?}"),
        }
    }

    fn mirror_path(&self) -> PathBuf {
        self.dir.path().join(STATE_DIR_NAME).join(LOG_FILE_NAME)
    }
}

fn write_config(root: &std::path::Path, value: &serde_json::Value) {
    let state_dir = root.join(STATE_DIR_NAME);
    std::fs::create_dir_all(&state_dir).expect("state dir");
    std::fs::write(state_dir.join(CONFIG_FILE_NAME), value.to_string()).expect("config write");
}

fn write_raw_config(root: &std::path::Path, contents: &str) {
    let state_dir = root.join(STATE_DIR_NAME);
    std::fs::write(state_dir.join(CONFIG_FILE_NAME), contents).expect("config write");
}

fn change(path: &str) -> ChangeRecord {
    ChangeRecord {
        relative_path: path.to_string(),
        kind: ChangeKind::Change,
        observed_at: chrono::Local::now(),
    }
}

/// Build a controller over a temp project, run it, and consume the initial
/// start command. No real watchers are attached; events are injected.
async fn start(config: serde_json::Value) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    write_config(dir.path(), &config);

    let (events_tx, events_rx) = mpsc::channel(64);
    let (supervisor_tx, supervisor_rx) = mpsc::channel(16);

    let controller = Controller::new(
        PathBuf::from("server.sh"),
        dir.path().to_path_buf(),
        events_tx.clone(),
        events_rx,
        supervisor_tx,
    )
    .expect("controller");
    tokio::spawn(controller.run());

    let mut harness = Harness {
        dir,
        events_tx,
        supervisor_rx,
    };
    match harness.recv_within(1_000).await {
        Some(SupervisorCommand::Restart {
            cause: RestartCause::Initial,
        }) => {}
        other => panic!("expected the initial start, got {other:?}"),
    }
    harness
}

#[tokio::test(start_paused = true)]
async fn burst_coalesces_into_single_restart_from_last_event() {
    let mut h = start(json!({ "debounceDelayMs": 200 })).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.send(ControlEvent::PathChanged(change("b.js"))).await;

    // Quiet until 200ms after the *last* event, i.e. t ≈ 250.
    h.assert_quiet_for(190).await;
    match h.expect_restart(20).await {
        RestartCause::FileChange(record) => assert_eq!(record.relative_path, "b.js"),
        other => panic!("expected a file-change restart, got {other:?}"),
    }

    // Exactly one restart per burst.
    h.assert_quiet_for(400).await;
}

#[tokio::test(start_paused = true)]
async fn rearming_extends_the_quiet_period() {
    let mut h = start(json!({ "debounceDelayMs": 200 })).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    h.send(ControlEvent::PathChanged(change("b.js"))).await;

    // A fixed window would have fired at t = 200; the sliding window
    // pushes the deadline to t = 350.
    h.assert_quiet_for(190).await;
    h.expect_restart(20).await;
}

#[tokio::test(start_paused = true)]
async fn restart_delay_is_a_fixed_one_shot_after_the_debounce() {
    let mut h = start(json!({ "debounceDelayMs": 100, "restartDelayMs": 200 })).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;

    // Debounce fires at 100, the extra delay runs until 300.
    h.assert_quiet_for(290).await;
    h.expect_restart(20).await;
}

#[tokio::test(start_paused = true)]
async fn manual_restart_cancels_the_pending_timer() {
    let mut h = start(json!({ "debounceDelayMs": 5000 })).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.send(ControlEvent::Console(ConsoleCommand::Restart)).await;

    assert_eq!(h.expect_restart(50).await, RestartCause::Manual);

    // The armed window must not fire a second restart.
    h.assert_quiet_for(6_000).await;
}

#[tokio::test(start_paused = true)]
async fn stop_with_an_armed_timer_spawns_nothing_else() {
    let mut h = start(json!({ "debounceDelayMs": 200 })).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.send(ControlEvent::Console(ConsoleCommand::Stop)).await;

    match h.recv_within(100).await {
        Some(SupervisorCommand::Terminate) => {}
        other => panic!("expected terminate on stop, got {other:?}"),
    }
    // Channel closes without any further restart.
    assert!(h.recv_within(1_000).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn crash_reports_once_and_keeps_watching() {
    let mut h = start(json!({ "debounceDelayMs": 200, "saveLogs": true })).await;

    h.send(ControlEvent::ChildStarted { pid: 42 }).await;
    h.send(ControlEvent::ChildExited {
        pid: 42,
        code: Some(1),
    })
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let log = std::fs::read_to_string(h.mirror_path()).expect("log mirror");
    assert_eq!(
        log.lines().filter(|l| l.contains("crashed")).count(),
        1,
        "exactly one error line per crash"
    );

    // Still armed: the next change restarts as usual.
    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    h.expect_restart(300).await;
}

#[tokio::test(start_paused = true)]
async fn config_reload_hot_swaps_the_debounce_delay() {
    let mut h = start(json!({ "debounceDelayMs": 200 })).await;

    write_config(h.dir.path(), &json!({ "debounceDelayMs": 50 }));
    h.send(ControlEvent::ConfigFileChanged).await;
    tokio::time::sleep(Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS + 50)).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    h.assert_quiet_for(45).await;
    h.expect_restart(10).await;
}

#[tokio::test(start_paused = true)]
async fn invalid_config_reload_keeps_previous_settings() {
    let mut h = start(json!({ "debounceDelayMs": 200 })).await;

    write_raw_config(h.dir.path(), "{ definitely not json");
    h.send(ControlEvent::ConfigFileChanged).await;
    tokio::time::sleep(Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS + 50)).await;

    // Delays are untouched: still the original 200ms window.
    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    h.assert_quiet_for(190).await;
    h.expect_restart(20).await;
}

#[tokio::test(start_paused = true)]
async fn config_reload_cancels_an_armed_restart_window() {
    let mut h = start(json!({ "debounceDelayMs": 2000 })).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    write_config(h.dir.path(), &json!({ "debounceDelayMs": 2000 }));
    h.send(ControlEvent::ConfigFileChanged).await;

    // The reload lands at the default config debounce (~500ms) and kills
    // the pending window; nothing may fire afterwards.
    h.assert_quiet_for(2_500).await;
}

#[tokio::test(start_paused = true)]
async fn manual_silent_override_survives_a_reload() {
    let mut h = start(json!({ "debounceDelayMs": 100, "saveLogs": true })).await;

    h.send(ControlEvent::Console(ConsoleCommand::Silent(Some(true))))
        .await;
    write_config(
        h.dir.path(),
        &json!({ "debounceDelayMs": 100, "saveLogs": true, "silentLogs": false }),
    );
    h.send(ControlEvent::ConfigFileChanged).await;
    tokio::time::sleep(Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS + 50)).await;

    h.send(ControlEvent::PathChanged(change("a.js"))).await;
    h.expect_restart(150).await;

    let log = std::fs::read_to_string(h.mirror_path()).expect("log mirror");
    assert!(log.contains("silent mode on"));
    assert!(
        !log.contains("restarting due to changes"),
        "info lines must stay silenced after the reload"
    );
}
