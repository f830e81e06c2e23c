//! Общие хелперы интеграционных тестов.
//!
//! FsRunner имитирует btrfs обычными каталогами:
//! - create: mkdir dest (ошибка, если уже есть);
//! - delete: rm -r;
//! - send full / incremental: mkdir <dest_dir>/<base name>; incremental требует базу на обеих сторонах;
//! - sync / hook: no-op, только запись в журнал.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use btrsnap::{BackupConfig, OpKind, Operation, Runner, SnapError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("btrsnap-test-{prefix}-{pid}-{t}-{id}"))
}

pub const D1: &str = "2024-01-01_00-00-00";
pub const D2: &str = "2024-01-02_00-00-00";
pub const D3: &str = "2024-01-03_00-00-00";
pub const D4: &str = "2024-01-04_00-00-00";
pub const D5: &str = "2024-01-05_00-00-00";
pub const D6: &str = "2024-01-06_00-00-00";

pub fn snap(ts: &str) -> String {
    btrsnap::naming::encode("h", "l", ts)
}

/// Тестовое окружение: source, local и remote каталоги под одним корнем.
pub struct Env {
    pub root: PathBuf,
    pub source: PathBuf,
    pub local: PathBuf,
    pub remote: PathBuf,
}

impl Env {
    pub fn new(prefix: &str) -> Result<Self> {
        let root = unique_root(prefix);
        let source = root.join("source");
        let local = root.join("snapshots");
        let remote = root.join("backup");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&local)?;
        fs::create_dir_all(&remote)?;
        Ok(Self {
            root,
            source,
            local,
            remote,
        })
    }

    pub fn config(&self) -> BackupConfig {
        BackupConfig::default()
            .with_host_name("h")
            .with_backup_name("l")
            .with_backup_dir(&self.source)
            .with_snapshot_dir(&self.local)
            .with_remote_snapshot_dir(Some(&self.remote))
            .with_require_root(false)
    }

    pub fn seed_local(&self, stamps: &[&str]) -> Result<()> {
        seed(&self.local, stamps)
    }

    pub fn seed_remote(&self, stamps: &[&str]) -> Result<()> {
        seed(&self.remote, stamps)
    }

    pub fn local_names(&self) -> Vec<String> {
        listing(&self.local)
    }

    pub fn remote_names(&self) -> Vec<String> {
        listing(&self.remote)
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn seed(dir: &Path, stamps: &[&str]) -> Result<()> {
    for ts in stamps {
        fs::create_dir_all(dir.join(snap(ts)))?;
    }
    Ok(())
}

/// Отсортированный список имён в каталоге (пустой, если каталога нет).
pub fn listing(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = match fs::read_dir(dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    v.sort();
    v
}

#[derive(Default)]
struct State {
    ops: Vec<Operation>,
    /// Упасть на n-й (с нуля) операции данного вида.
    fail_at: Option<(OpKind, usize)>,
    seen: Vec<OpKind>,
}

/// Runner поверх обычных каталогов. Clone разделяет журнал операций.
#[derive(Clone, Default)]
pub struct FsRunner {
    state: Rc<RefCell<State>>,
}

impl FsRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(kind: OpKind, nth: usize) -> Self {
        let r = Self::default();
        r.state.borrow_mut().fail_at = Some((kind, nth));
        r
    }

    pub fn ops(&self) -> Vec<Operation> {
        self.state.borrow().ops.clone()
    }

    pub fn kinds(&self) -> Vec<OpKind> {
        self.state.borrow().ops.iter().map(|o| o.kind()).collect()
    }

    pub fn hooks(&self) -> Vec<String> {
        self.state
            .borrow()
            .ops
            .iter()
            .filter_map(|o| match o {
                Operation::Hook { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Runner for FsRunner {
    fn run(&mut self, op: &Operation) -> Result<String> {
        let mut st = self.state.borrow_mut();
        st.ops.push(op.clone());
        let kind = op.kind();
        let nth = st.seen.iter().filter(|k| **k == kind).count();
        st.seen.push(kind);
        if st.fail_at == Some((kind, nth)) {
            return Err(SnapError::Operation {
                op: kind,
                detail: "injected failure".into(),
                output: "ERROR: injected".into(),
            }
            .into());
        }
        drop(st);

        match op {
            Operation::Create { source, dest } => {
                if !source.is_dir() {
                    return Err(anyhow!("source {} missing", source.display()));
                }
                fs::create_dir(dest)?;
            }
            Operation::Delete { path } => fs::remove_dir_all(path)?,
            Operation::SendFull { snapshot, dest_dir } => {
                receive(snapshot, dest_dir)?;
            }
            Operation::SendIncremental {
                base,
                snapshot,
                dest_dir,
            } => {
                let base_name = base
                    .file_name()
                    .ok_or_else(|| anyhow!("bad base path"))?;
                if !base.is_dir() || !dest_dir.join(base_name).is_dir() {
                    return Err(anyhow!("parent {} not on both sides", base.display()));
                }
                receive(snapshot, dest_dir)?;
            }
            Operation::Sync | Operation::Hook { .. } => {}
        }
        Ok(String::new())
    }
}

fn receive(snapshot: &Path, dest_dir: &Path) -> Result<()> {
    if !snapshot.is_dir() {
        return Err(anyhow!("snapshot {} missing", snapshot.display()));
    }
    let name = snapshot
        .file_name()
        .ok_or_else(|| anyhow!("bad snapshot path"))?;
    fs::create_dir(dest_dir.join(name))?;
    Ok(())
}
