//! Сканирование каталога снапшотов: `{dir}/{host}_{label}_*/`.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

use super::{Location, Snapshot, SnapshotSet};
use crate::naming;

/// Перечислить снапшоты host+label непосредственно в `dir`.
///
/// - Отсутствующий каталог — пустой набор (первый запуск, бэкап-диск не подключён).
/// - Учитываются только подкаталоги с корректной меткой времени в имени.
/// - Результат отсортирован по возрастанию.
pub fn scan(dir: &Path, host: &str, label: &str, location: Location) -> Result<SnapshotSet> {
    if !dir.is_dir() {
        debug!("scan: {} ({}) not present, empty set", dir.display(), location);
        return Ok(SnapshotSet::empty(dir, location));
    }

    let rd = fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))?;
    let mut entries = Vec::new();
    for ent in rd {
        let ent = ent.with_context(|| format!("read_dir entry in {}", dir.display()))?;
        let name = ent.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !naming::matches(name, host, label) {
            continue;
        }
        let Some(ts) = naming::decode(name, host, label) else {
            debug!("scan: skip '{}' (no valid timestamp for {}_{})", name, host, label);
            continue;
        };
        if !ent.path().is_dir() {
            debug!("scan: skip '{}' (not a directory)", name);
            continue;
        }
        entries.push(Snapshot::new(host, label, ts, dir, location));
    }

    let set = SnapshotSet::from_entries(dir, location, entries);
    debug!(
        "scan: {} ({}) -> {} snapshot(s)",
        dir.display(),
        location,
        set.len()
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unique_root(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("btrsnap-scan-{}-{}-{}", prefix, pid, t))
    }

    #[test]
    fn missing_dir_is_empty() -> Result<()> {
        let root = unique_root("missing");
        let set = scan(&root, "h", "l", Location::Remote)?;
        assert!(set.is_empty());
        assert_eq!(set.location(), Location::Remote);
        Ok(())
    }

    #[test]
    fn picks_only_matching_dirs_sorted() -> Result<()> {
        let root = unique_root("mixed");
        fs::create_dir_all(&root)?;
        for n in [
            "h_l_2024-01-03_00-00-00",
            "h_l_2024-01-01_00-00-00",
            "h_l_2024-01-02_00-00-00",
            "h_other_2024-01-01_00-00-00",
            "x_l_2024-01-01_00-00-00",
            "h_l_extra_2024-01-01_00-00-00",
            "h_l_garbage",
        ] {
            fs::create_dir_all(root.join(n))?;
        }
        // файл с подходящим именем — не снапшот
        fs::write(root.join("h_l_2024-01-04_00-00-00"), b"x")?;

        let set = scan(&root, "h", "l", Location::Local)?;
        assert_eq!(
            set.base_names(),
            vec![
                "h_l_2024-01-01_00-00-00",
                "h_l_2024-01-02_00-00-00",
                "h_l_2024-01-03_00-00-00"
            ]
        );
        assert_eq!(set.as_slice()[0].path, root.join("h_l_2024-01-01_00-00-00"));

        let _ = fs::remove_dir_all(&root);
        Ok(())
    }
}
