//! snapset — модель набора снапшотов (host+label) в одном каталоге.
//!
//! Набор строится сканированием на каждом запуске, не хранится между запусками
//! и не меняется после построения: удаления идут в файловую систему, а не сюда.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod scan;

pub use scan::scan;

/// Где найден снапшот.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Local,
    Remote,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local => f.write_str("local"),
            Location::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub host: String,
    pub label: String,
    pub timestamp: String,
    /// Имя без каталога — ключ сопоставления local/remote.
    pub base_name: String,
    pub path: PathBuf,
    pub location: Location,
}

impl Snapshot {
    pub fn new(host: &str, label: &str, timestamp: &str, dir: &Path, location: Location) -> Self {
        let base_name = crate::naming::encode(host, label, timestamp);
        let path = dir.join(&base_name);
        Self {
            host: host.to_string(),
            label: label.to_string(),
            timestamp: timestamp.to_string(),
            base_name,
            path,
            location,
        }
    }

    /// Тот же снапшот в другом каталоге (как он появится там после передачи).
    pub fn relocated(&self, dir: &Path, location: Location) -> Self {
        Self {
            path: dir.join(&self.base_name),
            location,
            ..self.clone()
        }
    }
}

/// Снапшоты одного host+label из одного каталога, по возрастанию имени (== времени).
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSet {
    location: Location,
    dir: PathBuf,
    entries: Vec<Snapshot>,
}

impl SnapshotSet {
    /// Пустой набор (первый запуск, нет каталога).
    pub fn empty(dir: &Path, location: Location) -> Self {
        Self {
            location,
            dir: dir.to_path_buf(),
            entries: Vec::new(),
        }
    }

    /// Построить набор из произвольных записей; порядок восстанавливается сортировкой по имени.
    pub fn from_entries(dir: &Path, location: Location, mut entries: Vec<Snapshot>) -> Self {
        entries.sort_by(|a, b| a.base_name.cmp(&b.base_name));
        entries.dedup_by(|a, b| a.base_name == b.base_name);
        Self {
            location,
            dir: dir.to_path_buf(),
            entries,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Записи от старых к новым.
    pub fn as_slice(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Записи от новых к старым.
    pub fn newest_first(&self) -> impl Iterator<Item = &Snapshot> + '_ {
        self.entries.iter().rev()
    }

    pub fn newest(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    pub fn contains(&self, base_name: &str) -> bool {
        self.entries
            .binary_search_by(|s| s.base_name.as_str().cmp(base_name))
            .is_ok()
    }

    pub fn get(&self, base_name: &str) -> Option<&Snapshot> {
        self.entries
            .binary_search_by(|s| s.base_name.as_str().cmp(base_name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Копия набора с ещё одной записью (ожидаемый вид каталога после create/transfer).
    pub fn with_entry(&self, snap: Snapshot) -> SnapshotSet {
        let mut entries = self.entries.clone();
        entries.push(snap);
        SnapshotSet::from_entries(&self.dir, self.location, entries)
    }

    pub fn base_names(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.base_name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a SnapshotSet {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(stamps: &[&str]) -> SnapshotSet {
        let dir = Path::new("/snaps");
        let entries = stamps
            .iter()
            .map(|t| Snapshot::new("h", "l", t, dir, Location::Local))
            .collect();
        SnapshotSet::from_entries(dir, Location::Local, entries)
    }

    #[test]
    fn from_entries_sorts_and_dedups() {
        let s = set_of(&[
            "2024-01-03_00-00-00",
            "2024-01-01_00-00-00",
            "2024-01-02_00-00-00",
            "2024-01-01_00-00-00",
        ]);
        assert_eq!(
            s.base_names(),
            vec![
                "h_l_2024-01-01_00-00-00",
                "h_l_2024-01-02_00-00-00",
                "h_l_2024-01-03_00-00-00"
            ]
        );
        assert_eq!(s.newest().unwrap().timestamp, "2024-01-03_00-00-00");
        assert_eq!(
            s.newest_first().next().unwrap().base_name,
            "h_l_2024-01-03_00-00-00"
        );
        assert!(s.contains("h_l_2024-01-02_00-00-00"));
        assert!(!s.contains("h_l_2024-01-04_00-00-00"));
    }

    #[test]
    fn with_entry_keeps_order_and_source_untouched() {
        let s = set_of(&["2024-01-01_00-00-00", "2024-01-03_00-00-00"]);
        let local = Snapshot::new("h", "l", "2024-01-02_00-00-00", Path::new("/src"), Location::Local);
        let moved = local.relocated(s.dir(), s.location());
        assert_eq!(moved.path, Path::new("/snaps/h_l_2024-01-02_00-00-00"));

        let grown = s.with_entry(moved);
        assert_eq!(s.len(), 2);
        assert_eq!(
            grown.base_names(),
            vec![
                "h_l_2024-01-01_00-00-00",
                "h_l_2024-01-02_00-00-00",
                "h_l_2024-01-03_00-00-00"
            ]
        );
        assert!(grown.get("h_l_2024-01-02_00-00-00").is_some());
        assert!(s.get("h_l_2024-01-02_00-00-00").is_none());

        // повторная запись не дублируется
        let again = grown.with_entry(grown.as_slice()[0].clone());
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn snapshot_path_and_base_name() {
        let s = Snapshot::new("h", "l", "2024-01-01_00-00-00", Path::new("/mnt/b"), Location::Remote);
        assert_eq!(s.base_name, "h_l_2024-01-01_00-00-00");
        assert_eq!(s.path, Path::new("/mnt/b/h_l_2024-01-01_00-00-00"));
        assert_eq!(s.location, Location::Remote);
    }
}
