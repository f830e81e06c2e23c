//! CommandRunner — исполнение операций реальными утилитами (btrfs, sync, sh).
//!
//! send | receive собирается из двух процессов через pipe, без shell: статус
//! считается успешным только если успешны оба конца.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use super::{Operation, Runner};
use crate::consts::{BTRFS_BIN, SHELL_BIN, SYNC_BIN};
use crate::error::{OpKind, SnapError};

#[derive(Debug, Clone)]
pub struct CommandRunner {
    btrfs: PathBuf,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self {
            btrfs: PathBuf::from(BTRFS_BIN),
        }
    }
}

impl CommandRunner {
    /// Другой исполняемый файл btrfs (полный путь или имя в PATH).
    pub fn with_btrfs(mut self, bin: impl Into<PathBuf>) -> Self {
        self.btrfs = bin.into();
        self
    }

    fn btrfs(&self) -> Command {
        Command::new(&self.btrfs)
    }
}

impl Runner for CommandRunner {
    fn run(&mut self, op: &Operation) -> Result<String> {
        let kind = op.kind();
        match op {
            Operation::Create { source, dest } => {
                let mut cmd = self.btrfs();
                cmd.args(["subvolume", "snapshot", "-r"]).arg(source).arg(dest);
                run_single(kind, cmd)
            }
            Operation::Delete { path } => {
                let mut cmd = self.btrfs();
                cmd.args(["subvolume", "delete"]).arg(path);
                run_single(kind, cmd)
            }
            Operation::SendFull { snapshot, dest_dir } => {
                self.send_receive(kind, None, snapshot, dest_dir)
            }
            Operation::SendIncremental {
                base,
                snapshot,
                dest_dir,
            } => self.send_receive(kind, Some(base.as_path()), snapshot, dest_dir),
            Operation::Sync => run_single(kind, Command::new(SYNC_BIN)),
            Operation::Hook { command } => {
                let mut cmd = Command::new(SHELL_BIN);
                cmd.arg("-c").arg(command);
                run_single(kind, cmd)
            }
        }
    }
}

fn run_single(kind: OpKind, mut cmd: Command) -> Result<String> {
    debug!("spawn: {:?}", cmd);
    let out = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(kind, &cmd, e))?;
    let text = combined_output(&out);
    if out.status.success() {
        Ok(text)
    } else {
        Err(SnapError::Operation {
            op: kind,
            detail: format!("{}", out.status),
            output: text,
        }
        .into())
    }
}

impl CommandRunner {
    fn send_receive(
        &self,
        kind: OpKind,
        base: Option<&Path>,
        snapshot: &Path,
        dest_dir: &Path,
    ) -> Result<String> {
        let mut send_cmd = self.btrfs();
        send_cmd.arg("send");
        if let Some(b) = base {
            send_cmd.arg("-p").arg(b);
        }
        send_cmd.arg(snapshot);
        debug!("spawn: {:?}", send_cmd);

        let mut send = send_cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(kind, &send_cmd, e))?;

        let Some(stream) = send.stdout.take() else {
            stop(&mut send);
            return Err(SnapError::Operation {
                op: kind,
                detail: "send stdout not captured".into(),
                output: String::new(),
            }
            .into());
        };

        // Command держит свой конец pipe до drop: пока он жив, send не получит
        // SIGPIPE после выхода receive и может зависнуть на записи.
        let recv = {
            let mut recv_cmd = self.btrfs();
            recv_cmd.arg("receive").arg(dest_dir);
            debug!("spawn: {:?}", recv_cmd);
            recv_cmd
                .stdin(Stdio::from(stream))
                .output()
                .map_err(|e| spawn_error(kind, &recv_cmd, e))
        };

        let recv = match recv {
            Ok(o) => o,
            Err(e) => {
                stop(&mut send);
                return Err(e.into());
            }
        };
        let text = combined_output(&recv);

        if !recv.status.success() {
            stop(&mut send);
            return Err(SnapError::Operation {
                op: kind,
                detail: format!("btrfs receive: {}", recv.status),
                output: text,
            }
            .into());
        }

        let send_status = send.wait().map_err(|e| SnapError::Operation {
            op: kind,
            detail: format!("wait for btrfs send: {e}"),
            output: String::new(),
        })?;
        if !send_status.success() {
            return Err(SnapError::Operation {
                op: kind,
                detail: format!("btrfs send: {send_status}"),
                output: text,
            }
            .into());
        }
        Ok(text)
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_error(kind: OpKind, cmd: &Command, e: std::io::Error) -> SnapError {
    SnapError::Operation {
        op: kind,
        detail: format!("spawn {:?}: {}", cmd.get_program(), e),
        output: String::new(),
    }
}

fn combined_output(out: &Output) -> String {
    let mut s = String::from_utf8_lossy(&out.stdout).into_owned();
    s.push_str(&String::from_utf8_lossy(&out.stderr));
    s
}
