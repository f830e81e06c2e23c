//! util — общие мелкие хелперы.
//!
//! Содержит:
//! - host_name(): имя хоста из ядра (по умолчанию для префикса снапшотов).
//! - is_root(): эффективный uid == 0.
//! - dir_state(): есть ли каталог (каталог / файл / нет доступа).
//! - substitute_snapshot(): подстановка %SNAPSHOT% в post-hook.

use std::path::Path;

use crate::consts::{HOSTNAME_FILE, SNAPSHOT_TOKEN};

/// Имя хоста; "localhost", если прочитать не удалось.
pub fn host_name() -> String {
    std::fs::read_to_string(HOSTNAME_FILE)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[inline]
pub fn is_root() -> bool {
    // SAFETY: geteuid() не имеет предусловий и не может завершиться ошибкой.
    unsafe { libc::geteuid() == 0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    Dir,
    NotDir,
    Missing,
}

pub fn dir_state(p: &Path) -> DirState {
    match std::fs::metadata(p) {
        Ok(m) if m.is_dir() => DirState::Dir,
        Ok(_) => DirState::NotDir,
        Err(_) => DirState::Missing,
    }
}

/// Заменить все вхождения %SNAPSHOT% на имя снапшота.
pub fn substitute_snapshot(command: &str, snapshot_name: &str) -> String {
    command.replace(SNAPSHOT_TOKEN, snapshot_name)
}
