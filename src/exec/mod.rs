//! exec — исполнитель внешних операций (create / delete / send / sync / hooks).
//!
//! Ядро знает только контракт «выполнить операцию → успех/ошибка». Сам вывод
//! команды ядро не анализирует, он только логируется.
//!
//! Режим исполнения (ExecutionMode) задаётся при создании Executor'а: dry-run
//! логирует командную строку и возвращает успех, не трогая файловую систему.
//! Фактическое исполнение делегируется Runner'у (seam для тестов).

use anyhow::Result;
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::{BTRFS_BIN, SHELL_BIN, SHELL_LOG_TARGET, SYNC_BIN};
use crate::error::{snap_error, OpKind, SnapError};

pub mod command;

pub use command::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Execute,
    DryRun,
}

impl ExecutionMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Execute
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == ExecutionMode::DryRun
    }
}

/// Одна внешняя операция.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Read-only снапшот `source` в `dest`.
    Create { source: PathBuf, dest: PathBuf },
    Delete { path: PathBuf },
    SendFull { snapshot: PathBuf, dest_dir: PathBuf },
    SendIncremental {
        base: PathBuf,
        snapshot: PathBuf,
        dest_dir: PathBuf,
    },
    Sync,
    /// Пользовательская shell-команда (pre/post hook).
    Hook { command: String },
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Create { .. } => OpKind::Create,
            Operation::Delete { .. } => OpKind::Delete,
            Operation::SendFull { .. } => OpKind::SendFull,
            Operation::SendIncremental { .. } => OpKind::SendIncremental,
            Operation::Sync => OpKind::Sync,
            Operation::Hook { .. } => OpKind::Hook,
        }
    }

    /// Командная строка в shell-нотации (для логов и dry-run).
    pub fn command_line(&self) -> String {
        match self {
            Operation::Create { source, dest } => format!(
                "{BTRFS_BIN} subvolume snapshot -r {} {}",
                quote_path(source),
                quote_path(dest)
            ),
            Operation::Delete { path } => {
                format!("{BTRFS_BIN} subvolume delete {}", quote_path(path))
            }
            Operation::SendFull { snapshot, dest_dir } => format!(
                "{BTRFS_BIN} send {} 2>/dev/null | {BTRFS_BIN} receive {}",
                quote_path(snapshot),
                quote_path(dest_dir)
            ),
            Operation::SendIncremental {
                base,
                snapshot,
                dest_dir,
            } => format!(
                "{BTRFS_BIN} send -p {} {} 2>/dev/null | {BTRFS_BIN} receive {}",
                quote_path(base),
                quote_path(snapshot),
                quote_path(dest_dir)
            ),
            Operation::Sync => SYNC_BIN.to_string(),
            Operation::Hook { command } => format!("{SHELL_BIN} -c {}", quote(command)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Исполнение операции. Ok — захваченный вывод; неуспех — SnapError::Operation в цепочке.
pub trait Runner {
    fn run(&mut self, op: &Operation) -> Result<String>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, op: &Operation) -> Result<String> {
        (**self).run(op)
    }
}

pub struct Executor<R: Runner = CommandRunner> {
    mode: ExecutionMode,
    runner: R,
}

impl Executor<CommandRunner> {
    /// Executor поверх реальных утилит (btrfs, sync, sh).
    pub fn system(mode: ExecutionMode) -> Self {
        Self::new(mode, CommandRunner::default())
    }
}

impl<R: Runner> Executor<R> {
    pub fn new(mode: ExecutionMode, runner: R) -> Self {
        Self { mode, runner }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn create(&mut self, source: &Path, dest: &Path) -> Result<String> {
        self.execute(Operation::Create {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
        })
    }

    pub fn delete_snapshot(&mut self, path: &Path) -> Result<String> {
        self.execute(Operation::Delete {
            path: path.to_path_buf(),
        })
    }

    pub fn send_full(&mut self, snapshot: &Path, dest_dir: &Path) -> Result<String> {
        self.execute(Operation::SendFull {
            snapshot: snapshot.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
        })
    }

    pub fn send_incremental(
        &mut self,
        base: &Path,
        snapshot: &Path,
        dest_dir: &Path,
    ) -> Result<String> {
        self.execute(Operation::SendIncremental {
            base: base.to_path_buf(),
            snapshot: snapshot.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
        })
    }

    pub fn sync(&mut self) -> Result<String> {
        self.execute(Operation::Sync)
    }

    pub fn hook(&mut self, command: &str) -> Result<String> {
        self.execute(Operation::Hook {
            command: command.to_string(),
        })
    }

    /// Залогировать и (если не dry-run) выполнить операцию.
    pub fn execute(&mut self, op: Operation) -> Result<String> {
        info!("{}", op.command_line());
        if self.mode.is_dry_run() {
            return Ok(String::new());
        }
        match self.runner.run(&op) {
            Ok(out) => {
                for line in out.lines() {
                    info!(target: SHELL_LOG_TARGET, "{line}");
                }
                Ok(out)
            }
            Err(e) => {
                if let Some(SnapError::Operation { output, .. }) = snap_error(&e) {
                    for line in output.lines() {
                        warn!(target: SHELL_LOG_TARGET, "{line}");
                    }
                }
                Err(e)
            }
        }
    }
}

/// Заключить строку в одинарные кавычки для sh.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn quote_path(p: &Path) -> String {
    quote(&p.to_string_lossy())
}
