// src/exec/supervisor.rs

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::ControlEvent;
use crate::watch::ChangeRecord;

/// Why a restart was requested. Carried for diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub enum RestartCause {
    Initial,
    FileChange(ChangeRecord),
    Manual,
}

/// Commands accepted by the supervisor task.
#[derive(Debug)]
pub enum SupervisorCommand {
    /// Terminate the current child, if any, then spawn a fresh one.
    Restart { cause: RestartCause },
    /// Terminate the current child without replacement.
    Terminate,
}

/// Spawn the background supervisor task.
///
/// At most one child is alive at a time; the previous instance is always
/// killed before a new one starts. Kills are fire-and-forget (`start_kill`,
/// the OS reclaims the process), so a killed child never produces an exit
/// event; only self-exits are reported, as [`ControlEvent::ChildExited`]
/// with the exit code when there was one.
pub fn spawn_supervisor(
    entry: PathBuf,
    events_tx: mpsc::Sender<ControlEvent>,
) -> mpsc::Sender<SupervisorCommand> {
    let (tx, mut rx) = mpsc::channel::<SupervisorCommand>(16);

    tokio::spawn(async move {
        let mut current: Option<(u32, Child)> = None;

        loop {
            tokio::select! {
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else {
                        // Engine gone; clean up and leave.
                        terminate_current(&mut current);
                        return;
                    };
                    match cmd {
                        SupervisorCommand::Restart { cause } => {
                            debug!(?cause, "restart requested");
                            terminate_current(&mut current);
                            match spawn_entry(&entry) {
                                Ok((pid, child)) => {
                                    current = Some((pid, child));
                                    if events_tx
                                        .send(ControlEvent::ChildStarted { pid })
                                        .await
                                        .is_err()
                                    {
                                        return;
                                    }
                                }
                                Err(err) => {
                                    let _ = events_tx
                                        .send(ControlEvent::ChildSpawnFailed {
                                            error: err.to_string(),
                                        })
                                        .await;
                                }
                            }
                        }
                        SupervisorCommand::Terminate => {
                            terminate_current(&mut current);
                        }
                    }
                },
                exit = wait_current(current.as_mut()), if current.is_some() => {
                    if let Some((pid, _)) = current.take() {
                        let code = exit.ok().and_then(|status| status.code());
                        debug!(pid, ?code, "child exited");
                        if events_tx
                            .send(ControlEvent::ChildExited { pid, code })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                },
            }
        }
    });

    tx
}

/// Kill the current child without waiting for confirmation.
fn terminate_current(current: &mut Option<(u32, Child)>) {
    if let Some((pid, mut child)) = current.take() {
        debug!(pid, "terminating child");
        // kill_on_drop covers the rest; tokio reaps in the background.
        let _ = child.start_kill();
    }
}

async fn wait_current(current: Option<&mut (u32, Child)>) -> std::io::Result<ExitStatus> {
    match current {
        Some((_, child)) => child.wait().await,
        // Guarded out by the select precondition.
        None => std::future::pending().await,
    }
}

/// Spawn the entry target through the platform shell, stdin discarded,
/// stdout/stderr passed through.
fn spawn_entry(entry: &Path) -> std::io::Result<(u32, Child)> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(entry);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(entry);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let child = cmd.spawn()?;
    let pid = child.id().unwrap_or(0);
    Ok((pid, child))
}
