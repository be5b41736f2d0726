// src/engine/controller.rs

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::{
    ConfigDocument, ConfigStore, DEFAULT_DEBOUNCE_DELAY_MS, EffectiveConfig, StatePaths, WATCH_ALL,
    WatchSpec,
};
use crate::console::ConsoleCommand;
use crate::engine::debounce::{self, DebounceGate};
use crate::errors::Result;
use crate::exec::{RestartCause, SupervisorCommand};
use crate::output::Reporter;
use crate::watch::patterns::PathFilter;
use crate::watch::{ChangeRecord, WatcherHandle, spawn_config_watcher, spawn_project_watcher};

/// Unified event stream consumed by the [`Controller`].
///
/// Watchers, timers, the console reader, the signal handler, and the child
/// supervisor all feed this one channel; handler bodies run to completion
/// on the controller task, so no locking is needed anywhere.
#[derive(Debug)]
pub enum ControlEvent {
    /// An accepted project file change.
    PathChanged(ChangeRecord),
    /// Quiet-period expiry of the restart debounce timer.
    RestartDebounceElapsed { generation: u64 },
    /// Expiry of the fixed post-debounce restart delay.
    RestartDelayElapsed { generation: u64 },
    /// Raw change under the state directory's config file.
    ConfigFileChanged,
    /// Quiet-period expiry of the config reload timer.
    ConfigDebounceElapsed { generation: u64 },
    ChildStarted { pid: u32 },
    /// The child exited on its own; `code` is absent for signal deaths.
    ChildExited { pid: u32, code: Option<i32> },
    ChildSpawnFailed { error: String },
    Console(ConsoleCommand),
    ShutdownRequested,
}

/// The single owning instance behind `start_watcher`.
///
/// Holds every piece of mutable state (effective config, last change
/// record, debounce gates, current child PID, watcher handles) and drives
/// the supervisor over a command channel. There is no ambient global beyond
/// this controller's lifetime.
pub struct Controller {
    entry: PathBuf,
    project_root: PathBuf,
    paths: StatePaths,
    store: ConfigStore,
    config: EffectiveConfig,
    reporter: Reporter,

    /// Console-toggled silent mode; wins over the persisted value on every
    /// config rebuild until the process exits.
    silent_override: Option<bool>,
    last_change: Option<ChangeRecord>,
    restart_gate: DebounceGate,
    config_gate: DebounceGate,
    current_pid: Option<u32>,

    project_watcher: Option<WatcherHandle>,
    config_watcher: Option<WatcherHandle>,

    events_tx: mpsc::Sender<ControlEvent>,
    events_rx: mpsc::Receiver<ControlEvent>,
    supervisor_tx: mpsc::Sender<SupervisorCommand>,
}

impl Controller {
    /// Build the controller: ensure the state directory exists, seed a
    /// default config file on first run, and resolve the effective
    /// configuration.
    ///
    /// Watchers are attached separately with [`Controller::start_watchers`]
    /// so the engine can also run against injected events in tests.
    pub fn new(
        entry: PathBuf,
        project_root: PathBuf,
        events_tx: mpsc::Sender<ControlEvent>,
        events_rx: mpsc::Receiver<ControlEvent>,
        supervisor_tx: mpsc::Sender<SupervisorCommand>,
    ) -> Result<Self> {
        let paths = StatePaths::new(&project_root);
        fs::create_dir_all(&paths.state_dir)
            .with_context(|| format!("creating state directory {:?}", paths.state_dir))?;

        let store = ConfigStore::new(paths.config_file.clone());
        let doc = store.load();
        if doc.is_none() && !paths.config_file.exists() {
            // Seed the defaults so the file can be edited live.
            store.write(&ConfigDocument::defaults())?;
        }
        let config = EffectiveConfig::resolve(doc.as_ref(), None, &paths);

        let mut reporter = Reporter::new();
        reporter.set_silent(config.silent_logs);
        reporter.set_mirror(config.log_file_path.clone());

        Ok(Self {
            entry,
            project_root,
            paths,
            store,
            config,
            reporter,
            silent_override: None,
            last_change: None,
            restart_gate: DebounceGate::new(),
            config_gate: DebounceGate::new(),
            current_pid: None,
            project_watcher: None,
            config_watcher: None,
            events_tx,
            events_rx,
            supervisor_tx,
        })
    }

    /// Attach the project and config watcher subscriptions.
    pub fn start_watchers(&mut self) -> Result<()> {
        let filter = PathFilter::new(&self.config.watch, &self.config.ignore);
        self.project_watcher = Some(spawn_project_watcher(
            &self.project_root,
            filter,
            self.events_tx.clone(),
        )?);
        self.config_watcher = Some(spawn_config_watcher(
            &self.paths.state_dir,
            self.events_tx.clone(),
        )?);
        Ok(())
    }

    /// Main event loop. Returns after `stop` or a shutdown signal, with
    /// both watchers closed and the child terminated.
    pub async fn run(mut self) -> Result<()> {
        self.reporter
            .info(&format!("watchrun {}", env!("CARGO_PKG_VERSION")));
        self.reporter
            .info(&format!("watching {}", self.project_root.display()));
        self.reporter.info("enter `help` for console commands");
        self.reporter.separator();
        self.reporter
            .info(&format!("starting `{}`", self.entry.display()));
        self.supervisor_tx
            .send(SupervisorCommand::Restart {
                cause: RestartCause::Initial,
            })
            .await
            .context("dispatching initial start to supervisor")?;

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "controller received event");

            let keep_running = match event {
                ControlEvent::PathChanged(record) => self.handle_path_changed(record),
                ControlEvent::RestartDebounceElapsed { generation } => {
                    self.handle_restart_debounce_elapsed(generation).await
                }
                ControlEvent::RestartDelayElapsed { generation } => {
                    self.finish_restart_cycle(generation).await;
                    true
                }
                ControlEvent::ConfigFileChanged => self.handle_config_file_changed(),
                ControlEvent::ConfigDebounceElapsed { generation } => {
                    self.handle_config_debounce_elapsed(generation)
                }
                ControlEvent::ChildStarted { pid } => {
                    self.current_pid = Some(pid);
                    self.reporter.success(&format!("process started (pid {pid})"));
                    true
                }
                ControlEvent::ChildExited { pid, code } => self.handle_child_exited(pid, code),
                ControlEvent::ChildSpawnFailed { error } => {
                    self.reporter
                        .error(&format!("failed to start `{}`: {error}", self.entry.display()));
                    true
                }
                ControlEvent::Console(cmd) => self.handle_console(cmd).await,
                ControlEvent::ShutdownRequested => false,
            };

            if !keep_running {
                break;
            }
        }

        self.shutdown().await;
        Ok(())
    }

    fn handle_path_changed(&mut self, record: ChangeRecord) -> bool {
        self.last_change = Some(record);
        let (generation, fresh) = self.restart_gate.arm();
        if fresh {
            self.reporter.info("restarting due to changes...");
        }
        debounce::schedule(
            Duration::from_millis(self.config.debounce_delay_ms),
            self.events_tx.clone(),
            move || ControlEvent::RestartDebounceElapsed { generation },
        );
        true
    }

    async fn handle_restart_debounce_elapsed(&mut self, generation: u64) -> bool {
        if !self.restart_gate.try_fire(generation) {
            // Stale expiry from a re-armed or cancelled window.
            return true;
        }
        let delay = self.config.restart_delay_ms;
        if delay > 0 {
            // Strict one-shot: not subject to further coalescing, and a
            // config reload in flight will not cancel it.
            debounce::schedule(
                Duration::from_millis(delay),
                self.events_tx.clone(),
                move || ControlEvent::RestartDelayElapsed { generation },
            );
            return true;
        }
        self.finish_restart_cycle(generation).await;
        true
    }

    async fn finish_restart_cycle(&mut self, generation: u64) {
        if !self.restart_gate.complete(generation) {
            return; // superseded by `rs` or a newer window
        }
        let cause = match &self.last_change {
            Some(record) => RestartCause::FileChange(record.clone()),
            None => RestartCause::Manual,
        };
        self.restart_child(cause).await;
    }

    fn handle_config_file_changed(&mut self) -> bool {
        let (generation, fresh) = self.config_gate.arm();
        if fresh {
            debug!("config file changed; scheduling reload");
        }
        // The default delay, not the effective one: the reload itself is
        // what would tell us the new value.
        debounce::schedule(
            Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS),
            self.events_tx.clone(),
            move || ControlEvent::ConfigDebounceElapsed { generation },
        );
        true
    }

    fn handle_config_debounce_elapsed(&mut self, generation: u64) -> bool {
        if !self.config_gate.try_fire(generation) {
            return true;
        }
        self.config_gate.complete(generation);
        self.reload_config();
        true
    }

    fn reload_config(&mut self) {
        let Some(doc) = self.store.load() else {
            self.reporter
                .warn("could not read config; keeping previous settings");
            return;
        };
        let config = EffectiveConfig::resolve(Some(&doc), self.silent_override, &self.paths);
        self.apply_config(config);
        self.reporter.success("config reloaded");
    }

    fn apply_config(&mut self, config: EffectiveConfig) {
        // An armed restart window dies with the old settings; a fired
        // one-shot continues to completion.
        self.restart_gate.cancel_pending();
        self.config = config;
        self.reporter.set_silent(self.config.silent_logs);
        self.reporter.set_mirror(self.config.log_file_path.clone());
        self.rebuild_project_watcher();
    }

    /// Close and re-create the project watcher with fresh matchers.
    ///
    /// Best-effort: a change landing inside the swap window may be missed.
    fn rebuild_project_watcher(&mut self) {
        if self.project_watcher.is_none() {
            return;
        }
        self.project_watcher = None;
        let filter = PathFilter::new(&self.config.watch, &self.config.ignore);
        match spawn_project_watcher(&self.project_root, filter, self.events_tx.clone()) {
            Ok(handle) => self.project_watcher = Some(handle),
            Err(err) => {
                self.reporter
                    .error(&format!("failed to restart file watcher: {err}"));
            }
        }
    }

    fn handle_child_exited(&mut self, pid: u32, code: Option<i32>) -> bool {
        if self.current_pid == Some(pid) {
            self.current_pid = None;
        }
        match code {
            Some(0) => {
                self.reporter
                    .info("clean exit - waiting for changes before restart");
            }
            Some(code) => {
                self.reporter.error(&format!(
                    "process crashed with exit code {code} - waiting for changes before restart"
                ));
            }
            // Signal death: that is our own kill during a restart.
            None => debug!(pid, "process terminated by signal"),
        }
        true
    }

    async fn handle_console(&mut self, cmd: ConsoleCommand) -> bool {
        match cmd {
            ConsoleCommand::Clear => self.reporter.clear_screen(),
            ConsoleCommand::Help => self.print_help(),
            ConsoleCommand::Status => self.print_status(),
            ConsoleCommand::LastChange => match &self.last_change {
                Some(record) => {
                    let line = record.to_string();
                    self.reporter.plain(&line);
                }
                None => self.reporter.plain("no changes observed yet"),
            },
            ConsoleCommand::Silent(value) => {
                let target = value.unwrap_or(!self.reporter.is_silent());
                self.silent_override = Some(target);
                self.config.silent_logs = target;
                self.reporter.set_silent(target);
                self.reporter.plain(if target {
                    "silent mode on"
                } else {
                    "silent mode off"
                });
            }
            ConsoleCommand::Restart => {
                self.restart_gate.cancel_all();
                self.reporter.info("manual restart");
                self.restart_child(RestartCause::Manual).await;
            }
            ConsoleCommand::Stop => return false,
            ConsoleCommand::Unknown(line) => {
                self.reporter.error(&format!("unrecognized command: {line}"));
            }
        }
        true
    }

    async fn restart_child(&mut self, cause: RestartCause) {
        if let Err(err) = self
            .supervisor_tx
            .send(SupervisorCommand::Restart { cause })
            .await
        {
            warn!("failed to dispatch restart to supervisor: {err}");
        }
    }

    fn print_help(&mut self) {
        self.reporter.plain("commands:");
        self.reporter.plain("  clear, cls        clear the display");
        self.reporter.plain("  help, h, ?        show this list");
        self.reporter.plain("  status, stats     show supervisor state");
        self.reporter
            .plain("  last-change, lc   show the most recent file event");
        self.reporter
            .plain("  silent [on|off]   toggle or force silent log mode");
        self.reporter.plain("  rs                restart the process now");
        self.reporter.plain("  stop, x           stop watching and exit");
    }

    fn print_status(&mut self) {
        let pid = self
            .current_pid
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let watch = match &self.config.watch {
            WatchSpec::All => WATCH_ALL.to_string(),
            WatchSpec::Patterns(patterns) => patterns.join(", "),
        };
        let log_file = self
            .config
            .log_file_path
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        self.reporter.plain(&format!("pid:           {pid}"));
        self.reporter.plain(&format!("watch:         {watch}"));
        self.reporter
            .plain(&format!("ignore:        {}", self.config.ignore.join(", ")));
        self.reporter.plain(&format!(
            "debounce:      {} ms",
            self.config.debounce_delay_ms
        ));
        self.reporter.plain(&format!(
            "restart delay: {} ms",
            self.config.restart_delay_ms
        ));
        self.reporter
            .plain(&format!("silent logs:   {}", self.config.silent_logs));
        self.reporter
            .plain(&format!("save logs:     {}", self.config.save_logs));
        self.reporter.plain(&format!("log file:      {log_file}"));
    }

    async fn shutdown(&mut self) {
        debug!("closing watchers and terminating child");
        self.project_watcher = None;
        self.config_watcher = None;
        if let Err(err) = self.supervisor_tx.send(SupervisorCommand::Terminate).await {
            warn!("failed to dispatch terminate to supervisor: {err}");
        }
        self.reporter.info("stopped");
    }
}
