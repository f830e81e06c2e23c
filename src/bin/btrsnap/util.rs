use anyhow::{anyhow, Result};
use log::info;
use std::path::Path;

use btrsnap::config::{resolve_runs, BackupConfig, ConfigFile};
use btrsnap::consts::DEFAULT_CONFIG_FILE;

use crate::cli::Setup;

/// Конфиг-файл: явный -c обязан существовать; дефолтный — только если есть.
pub fn load_config_file(setup: &Setup) -> Result<Option<ConfigFile>> {
    if let Some(p) = &setup.config {
        info!("config file mode: {}", p.display());
        return ConfigFile::load(p).map(Some);
    }
    if setup.no_config {
        return Ok(None);
    }
    let def = Path::new(DEFAULT_CONFIG_FILE);
    if def.is_file() {
        info!("config file mode: {}", def.display());
        return ConfigFile::load(def).map(Some);
    }
    Ok(None)
}

/// Собрать конфигурации прогонов: defaults + ENV → файл → CLI, с фильтром по секции.
pub fn load_runs(setup: &Setup) -> Result<Vec<BackupConfig>> {
    let base = BackupConfig::from_env()?;
    let file = load_config_file(setup)?;
    let runs = resolve_runs(&base, file.as_ref(), &setup.overrides())?;

    let Some(want) = setup.section.as_deref() else {
        return Ok(runs);
    };
    let picked: Vec<BackupConfig> = runs
        .into_iter()
        .filter(|c| c.section.as_deref() == Some(want))
        .collect();
    if picked.is_empty() {
        let known = file
            .as_ref()
            .map(|f| f.section_names().join(", "))
            .unwrap_or_default();
        return Err(anyhow!("section '{}' not found (known: {})", want, known));
    }
    Ok(picked)
}
