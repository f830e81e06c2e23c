//! Конфиг-файл (TOML).
//!
//! Формат:
//!   # общие ключи (до первой секции) — действуют во всех секциях
//!   host_name = "cygnus"
//!   remote_snapshot_dir = "/mnt/backup-hdd/snapshots/"
//!
//!   [home]
//!   backup_name = "home"
//!   backup_dir = "/home/"
//!   keep_remote_snapshots_num = 3
//!
//!   [root]
//!   backup_name = "root"
//!   backup_dir = "/"
//!   transfer = false
//!
//! Каждая секция — отдельный полный прогон, в порядке объявления.
//! Значения: строки, целые или булевы; всё приводится к строке и разбирается
//! общим BackupConfig::apply_setting.

use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

use crate::error::SnapError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub settings: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Ключи вне секций.
    pub shared: Vec<(String, String)>,
    /// Секции в порядке объявления.
    pub sections: Vec<Section>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| SnapError::config(e.to_string()))?;

        let mut out = ConfigFile::default();
        for (key, value) in table {
            match value {
                toml::Value::Table(t) => {
                    let mut settings = Vec::with_capacity(t.len());
                    for (k, v) in t {
                        match scalar(&v) {
                            Some(s) => settings.push((k, s)),
                            None => warn!("config: [{}] '{}' is not a scalar, ignored", key, k),
                        }
                    }
                    out.sections.push(Section {
                        name: key,
                        settings,
                    });
                }
                other => match scalar(&other) {
                    Some(s) => out.shared.push((key, s)),
                    None => warn!("config: '{}' is not a scalar, ignored", key),
                },
            }
        }
        Ok(out)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }
}

fn scalar(v: &toml::Value) -> Option<String> {
    match v {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
