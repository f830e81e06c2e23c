//! Centralized configuration for one backup run.
//!
//! Goals:
//! - One immutable BackupConfig per run, built before the pipeline starts and passed by reference.
//! - Same keys everywhere: config file sections, BTRSNAP_<KEY> env vars, CLI flags.
//!
//! Precedence (lowest → highest):
//!   defaults < env < file shared keys < file section < CLI flags
//!
//! Sections do not leak into each other: every section starts again from
//! defaults + env + shared keys.
//!
//! Ошибки:
//! - неизвестный ключ — предупреждение, значение игнорируется;
//! - неразбираемое булево — предупреждение, false;
//! - неразбираемое число — фатальная SnapError::Config.

use anyhow::Result;
use log::warn;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::{
    DEFAULT_BACKUP_DIR, DEFAULT_BACKUP_NAME, DEFAULT_KEEP_REMOTE_SNAPSHOTS,
    DEFAULT_KEEP_SNAPSHOTS, DEFAULT_SNAPSHOT_DIR, ENV_PREFIX,
};
use crate::error::SnapError;
use crate::retention::RetentionPolicy;

pub mod file;

pub use file::ConfigFile;

/// Все ключи, понимаемые конфигом (файл, ENV).
pub const KNOWN_KEYS: &[&str] = &[
    "host_name",
    "backup_name",
    "backup_dir",
    "snapshot_dir",
    "remote_snapshot_dir",
    "keep_snapshots_num",
    "keep_remote_snapshots_num",
    "dry_run",
    "transfer",
    "create",
    "pre_command",
    "post_command",
    "require_root",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupConfig {
    /// Имя секции конфиг-файла (None — запуск без секций).
    pub section: Option<String>,

    /// Первая часть имени снапшота. Default: kernel hostname.
    pub host_name: String,

    /// Метка бэкапа (вторая часть имени). Default: "home".
    pub backup_name: String,

    /// Исходный subvolume. Default: /home/
    pub backup_dir: PathBuf,

    /// Локальный каталог снапшотов. Default: /.snapshots/
    pub snapshot_dir: PathBuf,

    /// Каталог на бэкап-диске. None — только локальная ротация.
    pub remote_snapshot_dir: Option<PathBuf>,

    pub keep_snapshots_num: u32,
    pub keep_remote_snapshots_num: u32,

    /// Только логировать команды.
    pub dry_run: bool,

    /// Отправлять снапшоты на remote.
    pub transfer: bool,

    /// Создавать новый снапшот (иначе работаем с самым новым существующим).
    pub create: bool,

    pub pre_command: Option<String>,

    /// `%SNAPSHOT%` заменяется именем текущего снапшота.
    pub post_command: Option<String>,

    /// Требовать euid 0 (вне dry-run).
    pub require_root: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            section: None,
            host_name: crate::util::host_name(),
            backup_name: DEFAULT_BACKUP_NAME.to_string(),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            remote_snapshot_dir: None,
            keep_snapshots_num: DEFAULT_KEEP_SNAPSHOTS,
            keep_remote_snapshots_num: DEFAULT_KEEP_REMOTE_SNAPSHOTS,
            dry_run: false,
            transfer: true,
            create: true,
            pre_command: None,
            post_command: None,
            require_root: true,
        }
    }
}

impl BackupConfig {
    /// Defaults + BTRSNAP_<KEY> overrides (например BTRSNAP_DRY_RUN=1).
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        for key in KNOWN_KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase());
            if let Ok(v) = std::env::var(&var) {
                cfg.apply_setting(key, &v)?;
            }
        }
        Ok(cfg)
    }

    /// Применить одну пару ключ/значение. Ok(false) — ключ неизвестен (с предупреждением).
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<bool, SnapError> {
        match key {
            "host_name" => self.host_name = value.trim().to_string(),
            "backup_name" => self.backup_name = value.trim().to_string(),
            "backup_dir" => self.backup_dir = PathBuf::from(value.trim()),
            "snapshot_dir" => self.snapshot_dir = PathBuf::from(value.trim()),
            "remote_snapshot_dir" => self.remote_snapshot_dir = non_empty(value).map(PathBuf::from),
            "keep_snapshots_num" => self.keep_snapshots_num = parse_count(key, value)?,
            "keep_remote_snapshots_num" => {
                self.keep_remote_snapshots_num = parse_count(key, value)?
            }
            "dry_run" => self.dry_run = parse_bool(key, value),
            "transfer" => self.transfer = parse_bool(key, value),
            "create" => self.create = parse_bool(key, value),
            "pre_command" => self.pre_command = non_empty(value),
            "post_command" => self.post_command = non_empty(value),
            "require_root" => self.require_root = parse_bool(key, value),
            _ => {
                warn!("config: key '{}' unknown, ignored", key);
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Keep-counts для local и remote. Ноль отвергается до любых сканов/мутаций.
    pub fn retention(&self) -> Result<(RetentionPolicy, RetentionPolicy), SnapError> {
        let local = RetentionPolicy::new(self.keep_snapshots_num).map_err(|_| {
            SnapError::precondition("snapshot num kept must be at least one (keep_snapshots_num)")
        })?;
        let remote = RetentionPolicy::new(self.keep_remote_snapshots_num).map_err(|_| {
            SnapError::precondition(
                "remote snapshot num kept must be at least one (keep_remote_snapshots_num)",
            )
        })?;
        Ok((local, remote))
    }

    /// Для логов: "[section] host_label" или "host_label".
    pub fn display_name(&self) -> String {
        match &self.section {
            Some(s) => format!("[{}] {}_{}", s, self.host_name, self.backup_name),
            None => format!("{}_{}", self.host_name, self.backup_name),
        }
    }

    // ----- builder-style setters -----

    pub fn with_section<S: Into<String>>(mut self, name: Option<S>) -> Self {
        self.section = name.map(Into::into);
        self
    }

    pub fn with_host_name<S: Into<String>>(mut self, host: S) -> Self {
        self.host_name = host.into();
        self
    }

    pub fn with_backup_name<S: Into<String>>(mut self, label: S) -> Self {
        self.backup_name = label.into();
        self
    }

    pub fn with_backup_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.backup_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_snapshot_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.snapshot_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_remote_snapshot_dir<P: AsRef<Path>>(mut self, dir: Option<P>) -> Self {
        self.remote_snapshot_dir = dir.map(|d| d.as_ref().to_path_buf());
        self
    }

    pub fn with_keep_snapshots(mut self, n: u32) -> Self {
        self.keep_snapshots_num = n;
        self
    }

    pub fn with_keep_remote_snapshots(mut self, n: u32) -> Self {
        self.keep_remote_snapshots_num = n;
        self
    }

    pub fn with_dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    pub fn with_transfer(mut self, on: bool) -> Self {
        self.transfer = on;
        self
    }

    pub fn with_create(mut self, on: bool) -> Self {
        self.create = on;
        self
    }

    pub fn with_pre_command<S: Into<String>>(mut self, cmd: Option<S>) -> Self {
        self.pre_command = cmd.map(Into::into);
        self
    }

    pub fn with_post_command<S: Into<String>>(mut self, cmd: Option<S>) -> Self {
        self.post_command = cmd.map(Into::into);
        self
    }

    pub fn with_require_root(mut self, on: bool) -> Self {
        self.require_root = on;
        self
    }
}

impl fmt::Display for BackupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackupConfig {{ \
             section: {}, \
             host_name: {}, \
             backup_name: {}, \
             backup_dir: {}, \
             snapshot_dir: {}, \
             remote_snapshot_dir: {}, \
             keep: {}/{}, \
             dry_run: {}, \
             transfer: {}, \
             create: {}, \
             pre_command: {}, \
             post_command: {} \
             }}",
            self.section.as_deref().unwrap_or("(none)"),
            self.host_name,
            self.backup_name,
            self.backup_dir.display(),
            self.snapshot_dir.display(),
            self.remote_snapshot_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
            self.keep_snapshots_num,
            self.keep_remote_snapshots_num,
            self.dry_run,
            self.transfer,
            self.create,
            self.pre_command.as_deref().unwrap_or("(none)"),
            self.post_command.as_deref().unwrap_or("(none)"),
        )
    }
}

/// Переопределения из CLI: применяются последними, поверх файла.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub host_name: Option<String>,
    pub backup_name: Option<String>,
    pub backup_dir: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
    pub remote_snapshot_dir: Option<PathBuf>,
    pub keep_snapshots_num: Option<u32>,
    pub keep_remote_snapshots_num: Option<u32>,
    pub dry_run: bool,
    pub no_transfer: bool,
    pub no_create: bool,
    pub pre_command: Option<String>,
    pub post_command: Option<String>,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut BackupConfig) {
        if let Some(v) = &self.host_name {
            cfg.host_name = v.clone();
        }
        if let Some(v) = &self.backup_name {
            cfg.backup_name = v.clone();
        }
        if let Some(v) = &self.backup_dir {
            cfg.backup_dir = v.clone();
        }
        if let Some(v) = &self.snapshot_dir {
            cfg.snapshot_dir = v.clone();
        }
        if let Some(v) = &self.remote_snapshot_dir {
            cfg.remote_snapshot_dir = Some(v.clone());
        }
        if let Some(n) = self.keep_snapshots_num {
            cfg.keep_snapshots_num = n;
        }
        if let Some(n) = self.keep_remote_snapshots_num {
            cfg.keep_remote_snapshots_num = n;
        }
        // флаги только включают «ограничения», но не снимают их
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.no_transfer {
            cfg.transfer = false;
        }
        if self.no_create {
            cfg.create = false;
        }
        if let Some(v) = &self.pre_command {
            cfg.pre_command = non_empty(v);
        }
        if let Some(v) = &self.post_command {
            cfg.post_command = non_empty(v);
        }
    }
}

/// Собрать список запусков: по одному на секцию файла (в порядке объявления) или один.
pub fn resolve_runs(
    base: &BackupConfig,
    file: Option<&ConfigFile>,
    overrides: &Overrides,
) -> Result<Vec<BackupConfig>> {
    let mut shared = base.clone();
    if let Some(f) = file {
        for (k, v) in &f.shared {
            shared.apply_setting(k, v)?;
        }
    }

    let sections = file.map(|f| f.sections.as_slice()).unwrap_or(&[]);
    if sections.is_empty() {
        let mut cfg = shared;
        overrides.apply(&mut cfg);
        return Ok(vec![cfg]);
    }

    let mut runs = Vec::with_capacity(sections.len());
    for sec in sections {
        let mut cfg = shared.clone();
        cfg.section = Some(sec.name.clone());
        for (k, v) in &sec.settings {
            cfg.apply_setting(k, v).map_err(|e| {
                SnapError::config(format!("section [{}]: {}", sec.name, e))
            })?;
        }
        overrides.apply(&mut cfg);
        runs.push(cfg);
    }
    Ok(runs)
}

/// true/True/1 и false/False/0; прочее — предупреждение и false.
pub fn parse_bool(key: &str, s: &str) -> bool {
    match s.trim() {
        "True" | "true" | "1" => true,
        "False" | "false" | "0" => false,
        other => {
            warn!("config: '{}' for '{}' not a boolean, using false", other, key);
            false
        }
    }
}

fn parse_count(key: &str, s: &str) -> Result<u32, SnapError> {
    s.trim()
        .parse::<u32>()
        .map_err(|e| SnapError::config(format!("'{}' for '{}' is not a count: {}", s.trim(), key, e)))
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
