//! pipeline — один полный прогон бэкапа и прогон по секциям конфига.
//!
//! Порядок шагов (строго последовательно, первая ошибка прерывает прогон):
//!   preconditions → pre-hook → create → scan local → scan remote → plan →
//!   transfer → prune remote → prune local → sync → post-hook
//!
//! Состояние между запусками не хранится: каждый прогон заново сканирует каталоги,
//! поэтому после частичного сбоя достаточно запустить ещё раз.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use crate::config::BackupConfig;
use crate::error::SnapError;
use crate::exec::{ExecutionMode, Executor, Runner};
use crate::naming;
use crate::plan::{plan_transfer, RemoteSide, SkipReason, TransferPlan};
use crate::retention::{prune, select_for_deletion, RetentionPolicy};
use crate::snapset::{scan, Location, Snapshot, SnapshotSet};
use crate::util::{self, DirState};

/// Итог одного прогона.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub section: Option<String>,
    /// Текущий снапшот (созданный или самый новый существующий).
    pub snapshot: String,
    pub created: bool,
    pub plan: TransferPlan,
    pub deleted_local: Vec<String>,
    pub deleted_remote: Vec<String>,
    pub dry_run: bool,
}

/// Проверки до любых сканов и мутаций. Возвращает политики (local, remote).
pub fn check_preconditions(
    cfg: &BackupConfig,
    mode: ExecutionMode,
) -> Result<(RetentionPolicy, RetentionPolicy)> {
    if cfg.require_root && !mode.is_dry_run() && !util::is_root() {
        return Err(SnapError::precondition("cannot get root privileges").into());
    }
    if util::dir_state(&cfg.snapshot_dir) != DirState::Dir {
        return Err(SnapError::precondition(format!(
            "snapshot directory '{}' does not exist",
            cfg.snapshot_dir.display()
        ))
        .into());
    }
    if cfg.create && util::dir_state(&cfg.backup_dir) != DirState::Dir {
        return Err(SnapError::precondition(format!(
            "backup directory '{}' does not exist",
            cfg.backup_dir.display()
        ))
        .into());
    }
    Ok(cfg.retention()?)
}

/// Состояние remote-стороны: выключено / нет каталога / набор снапшотов.
pub fn remote_side(cfg: &BackupConfig) -> Result<RemoteSide> {
    if !cfg.transfer {
        info!("transfer disabled. local operation.");
        return Ok(RemoteSide::Unavailable(SkipReason::TransferDisabled));
    }
    let Some(dir) = cfg.remote_snapshot_dir.as_deref() else {
        info!("no remote snapshot directory configured. local operation.");
        return Ok(RemoteSide::Unavailable(SkipReason::RemoteUnavailable));
    };
    if util::dir_state(dir) != DirState::Dir {
        warn!(
            "remote snapshot directory '{}' not present. local operation.",
            dir.display()
        );
        return Ok(RemoteSide::Unavailable(SkipReason::RemoteUnavailable));
    }
    let set = scan(dir, &cfg.host_name, &cfg.backup_name, Location::Remote)?;
    Ok(RemoteSide::Available(set))
}

pub fn scan_local(cfg: &BackupConfig) -> Result<SnapshotSet> {
    scan(
        &cfg.snapshot_dir,
        &cfg.host_name,
        &cfg.backup_name,
        Location::Local,
    )
}

/// Полный прогон для одной конфигурации.
pub fn run_backup<R: Runner>(cfg: &BackupConfig, exec: &mut Executor<R>) -> Result<RunReport> {
    let (keep_local, keep_remote) = check_preconditions(cfg, exec.mode())?;
    info!("backup {}: start", cfg.display_name());

    if let Some(cmd) = cfg.pre_command.as_deref() {
        exec.hook(cmd).context("pre_command")?;
    }

    let stamp = naming::current_timestamp();
    let mut current = naming::encode(&cfg.host_name, &cfg.backup_name, &stamp);
    if cfg.create {
        exec.create(&cfg.backup_dir, &cfg.snapshot_dir.join(&current))
            .with_context(|| format!("create snapshot {}", current))?;
    }

    let mut local = scan_local(cfg)?;
    if cfg.create && exec.mode().is_dry_run() {
        // снапшот не создан: считаем по тому виду каталога, который дал бы реальный прогон
        local = local.with_entry(Snapshot::new(
            &cfg.host_name,
            &cfg.backup_name,
            &stamp,
            &cfg.snapshot_dir,
            Location::Local,
        ));
    }
    if !cfg.create {
        current = local
            .newest()
            .map(|s| s.base_name.clone())
            .ok_or_else(|| {
                SnapError::precondition(format!(
                    "creation disabled and no local snapshots for {}_{} in '{}'",
                    cfg.host_name,
                    cfg.backup_name,
                    cfg.snapshot_dir.display()
                ))
            })?;
    }

    let remote = remote_side(cfg)?;
    let plan = plan_transfer(&local, &remote, &current);

    let (deleted_remote, deleted_local) = match &remote {
        RemoteSide::Unavailable(_) => (Vec::new(), prune(&local, keep_local, exec)?),
        RemoteSide::Available(remote_set) => {
            let remote_dir = remote_set.dir();
            realize(&plan, &cfg.snapshot_dir, remote_dir, exec)?;

            // переданный снапшот тоже учитывается в ретеншне remote
            let remote_now = if plan.target().is_some() && !exec.mode().is_dry_run() {
                scan(remote_dir, &cfg.host_name, &cfg.backup_name, Location::Remote)?
            } else {
                after_transfer(&local, remote_set, &plan)
            };

            info!("cleaning up...");
            let dr = prune(&remote_now, keep_remote, exec)?;
            let dl = prune(&local, keep_local, exec)?;
            (dr, dl)
        }
    };

    exec.sync()?;

    if let Some(cmd) = cfg.post_command.as_deref() {
        exec.hook(&util::substitute_snapshot(cmd, &current))
            .context("post_command")?;
    }

    info!(
        "backup {}: done, snapshot={}, plan={}, deleted local={} remote={}",
        cfg.display_name(),
        current,
        plan,
        deleted_local.len(),
        deleted_remote.len()
    );

    Ok(RunReport {
        section: cfg.section.clone(),
        snapshot: current,
        created: cfg.create,
        plan,
        deleted_local,
        deleted_remote,
        dry_run: exec.mode().is_dry_run(),
    })
}

/// Ожидаемый remote после передачи по плану, без обращения к диску.
fn after_transfer(local: &SnapshotSet, remote: &SnapshotSet, plan: &TransferPlan) -> SnapshotSet {
    match plan.target().and_then(|t| local.get(t)) {
        Some(s) => remote.with_entry(s.relocated(remote.dir(), Location::Remote)),
        None => remote.clone(),
    }
}

fn realize<R: Runner>(
    plan: &TransferPlan,
    snapshot_dir: &Path,
    remote_dir: &Path,
    exec: &mut Executor<R>,
) -> Result<()> {
    match plan {
        TransferPlan::Skip { reason } => {
            if *reason == SkipReason::UpToDate {
                info!("most recent snapshot already present on remote");
            }
        }
        TransferPlan::Full { target } => {
            info!("no usable common snapshot on remote, sending full snapshot...");
            exec.send_full(&snapshot_dir.join(target), remote_dir)
                .with_context(|| format!("send full {}", target))?;
        }
        TransferPlan::Incremental { base, target } => {
            info!("sending incremental {} -> {}...", base, target);
            exec.send_incremental(
                &snapshot_dir.join(base),
                &snapshot_dir.join(target),
                remote_dir,
            )
            .with_context(|| format!("send incremental {} -> {}", base, target))?;
        }
    }
    Ok(())
}

/// Прогнать все конфигурации по порядку; первая ошибка прерывает оставшиеся.
/// Для каждой создаётся свой Executor (dry_run может отличаться по секциям).
pub fn run_sections<R, F>(runs: &[BackupConfig], mut runner_for: F) -> Result<Vec<RunReport>>
where
    R: Runner,
    F: FnMut(&BackupConfig) -> R,
{
    let mut reports = Vec::with_capacity(runs.len());
    for cfg in runs {
        if let Some(s) = cfg.section.as_deref() {
            info!("[{}]", s);
        }
        let mut exec = Executor::new(ExecutionMode::from_dry_run(cfg.dry_run), runner_for(cfg));
        let rep = run_backup(cfg, &mut exec)
            .with_context(|| format!("backup {}", cfg.display_name()))?;
        reports.push(rep);
    }
    Ok(reports)
}

// ---------------- read-only preview (plan / list) ----------------

/// Что сделал бы прогон без создания нового снапшота. Ничего не исполняет.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub section: Option<String>,
    pub local: SnapshotSet,
    /// None — remote выключен или недоступен.
    pub remote: Option<SnapshotSet>,
    /// None — нет локальных снапшотов.
    pub current: Option<String>,
    pub plan: Option<TransferPlan>,
    /// Кандидаты на удаление; remote — с учётом передачи по плану.
    pub would_delete_local: Vec<String>,
    pub would_delete_remote: Vec<String>,
}

pub fn preview(cfg: &BackupConfig) -> Result<Preview> {
    let (keep_local, keep_remote) = cfg.retention()?;
    let local = scan_local(cfg)?;
    let remote = remote_side(cfg)?;
    let current = local.newest().map(|s| s.base_name.clone());
    let plan = current
        .as_deref()
        .map(|c| plan_transfer(&local, &remote, c));

    let names = |set: &SnapshotSet, p: RetentionPolicy| -> Vec<String> {
        select_for_deletion(set, p)
            .iter()
            .map(|s| s.base_name.clone())
            .collect()
    };
    let would_delete_local = names(&local, keep_local);
    let would_delete_remote = match (remote.set(), &plan) {
        (Some(r), Some(p)) => names(&after_transfer(&local, r, p), keep_remote),
        (Some(r), None) => names(r, keep_remote),
        (None, _) => Vec::new(),
    };

    Ok(Preview {
        section: cfg.section.clone(),
        remote: remote.set().cloned(),
        local,
        current,
        plan,
        would_delete_local,
        would_delete_remote,
    })
}
