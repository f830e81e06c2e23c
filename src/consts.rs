//! Общие константы: формат имён снапшотов, внешние утилиты, пути по умолчанию.

// -------- Naming --------
/// strftime-формат метки времени. Фиксированная ширина: строковая сортировка == хронологическая.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
/// Длина метки времени в символах (`YYYY-MM-DD_HH-MM-SS`).
pub const TIMESTAMP_LEN: usize = 19;
pub const NAME_SEPARATOR: char = '_';

// -------- Hooks --------
/// Токен в post_command, заменяемый именем текущего снапшота.
pub const SNAPSHOT_TOKEN: &str = "%SNAPSHOT%";

// -------- External tools --------
pub const BTRFS_BIN: &str = "btrfs";
pub const SYNC_BIN: &str = "sync";
pub const SHELL_BIN: &str = "sh";

// -------- Config --------
pub const DEFAULT_CONFIG_FILE: &str = "/etc/btrsnap.toml";
pub const ENV_PREFIX: &str = "BTRSNAP_";
pub const HOSTNAME_FILE: &str = "/proc/sys/kernel/hostname";

pub const DEFAULT_BACKUP_NAME: &str = "home";
pub const DEFAULT_BACKUP_DIR: &str = "/home/";
pub const DEFAULT_SNAPSHOT_DIR: &str = "/.snapshots/";
pub const DEFAULT_KEEP_SNAPSHOTS: u32 = 10;
pub const DEFAULT_KEEP_REMOTE_SNAPSHOTS: u32 = 10;

// -------- Logging --------
/// log target для вывода внешних команд.
pub const SHELL_LOG_TARGET: &str = "btrsnap::shell";
