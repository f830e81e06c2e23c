//! Ретеншн: оставить N самых новых снапшотов, остальные удалить (старые первыми).
//!
//! Обе стороны (local, remote) чистятся одной и той же функцией, каждая со своим N.
//! Удаление не транзакционно: ошибка на k-м снапшоте прерывает чистку этой стороны,
//! уже удалённые не восстанавливаются. Повторный запуск пересканирует каталог.

use anyhow::{Context, Result};
use log::info;
use std::num::NonZeroUsize;

use crate::error::SnapError;
use crate::exec::{Executor, Runner};
use crate::snapset::{Snapshot, SnapshotSet};

/// Сколько самых новых снапшотов хранить. Ноль — ошибка конфигурации, а не «удалить всё».
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: NonZeroUsize,
}

impl RetentionPolicy {
    pub fn new(keep: u32) -> Result<Self, SnapError> {
        NonZeroUsize::new(keep as usize)
            .map(|keep| Self { keep })
            .ok_or_else(|| SnapError::precondition("snapshot keep count must be at least 1"))
    }

    pub fn keep(&self) -> usize {
        self.keep.get()
    }
}

/// Снапшоты под удаление: все, кроме `keep` самых новых, от старых к новым.
pub fn select_for_deletion(set: &SnapshotSet, policy: RetentionPolicy) -> &[Snapshot] {
    let n = set.len().saturating_sub(policy.keep());
    &set.as_slice()[..n]
}

/// Удалить лишние снапшоты набора. Возвращает base_name удалённых (в порядке удаления).
pub fn prune<R: Runner>(
    set: &SnapshotSet,
    policy: RetentionPolicy,
    exec: &mut Executor<R>,
) -> Result<Vec<String>> {
    let doomed = select_for_deletion(set, policy);
    if doomed.is_empty() {
        return Ok(Vec::new());
    }
    info!(
        "prune {}: {} of {} snapshot(s), keep {}",
        set.location(),
        doomed.len(),
        set.len(),
        policy.keep()
    );

    let mut deleted = Vec::with_capacity(doomed.len());
    for snap in doomed {
        exec.delete_snapshot(&snap.path).with_context(|| {
            format!(
                "prune {}: delete {} ({} already deleted)",
                set.location(),
                snap.path.display(),
                deleted.len()
            )
        })?;
        deleted.push(snap.base_name.clone());
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapset::Location;
    use std::path::Path;

    fn set_of_size(n: usize) -> SnapshotSet {
        let dir = Path::new("/s");
        let entries = (0..n)
            .map(|i| {
                let ts = format!("2024-01-{:02}_00-00-00", i + 1);
                Snapshot::new("h", "l", &ts, dir, Location::Local)
            })
            .collect();
        SnapshotSet::from_entries(dir, Location::Local, entries)
    }

    #[test]
    fn zero_keep_rejected() {
        let err = RetentionPolicy::new(0).unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(RetentionPolicy::new(3).unwrap().keep(), 3);
    }

    #[test]
    fn selects_oldest_beyond_keep() {
        for size in 0..8usize {
            for keep in 1..10u32 {
                let set = set_of_size(size);
                let doomed = select_for_deletion(&set, RetentionPolicy::new(keep).unwrap());
                let expect = size.saturating_sub(keep as usize);
                assert_eq!(doomed.len(), expect, "size={size} keep={keep}");
                // удаляются именно самые старые
                assert_eq!(doomed, &set.as_slice()[..expect]);
            }
        }
    }
}
