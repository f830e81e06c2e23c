//! Планировщик передачи: что отправить на remote, чтобы догнать последний локальный снапшот.
//!
//! Алгоритм:
//! 1) remote недоступен или передача выключена → Skip;
//! 2) remote пуст → Full(current);
//! 3) ищем самый новый общий снапшот: внешний цикл по local (новые → старые),
//!    внутренний по remote (новые → старые), первое совпадение base_name побеждает;
//! 4) нет совпадения → Full(current);
//! 5) совпадение == current → Skip(UpToDate);
//! 6) иначе → Incremental(base, current).
//!
//! Планирование чистое и не может завершиться ошибкой.

use serde::Serialize;
use std::fmt;

use crate::snapset::{Snapshot, SnapshotSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TransferDisabled,
    RemoteUnavailable,
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferPlan {
    Skip { reason: SkipReason },
    Full { target: String },
    Incremental { base: String, target: String },
}

impl TransferPlan {
    pub fn is_skip(&self) -> bool {
        matches!(self, TransferPlan::Skip { .. })
    }

    /// Снапшот, который окажется на remote после реализации плана.
    pub fn target(&self) -> Option<&str> {
        match self {
            TransferPlan::Skip { .. } => None,
            TransferPlan::Full { target } | TransferPlan::Incremental { target, .. } => {
                Some(target.as_str())
            }
        }
    }
}

impl fmt::Display for TransferPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferPlan::Skip { reason } => {
                let r = match reason {
                    SkipReason::TransferDisabled => "transfer disabled",
                    SkipReason::RemoteUnavailable => "remote unavailable",
                    SkipReason::UpToDate => "remote up to date",
                };
                write!(f, "skip ({r})")
            }
            TransferPlan::Full { target } => write!(f, "full {target}"),
            TransferPlan::Incremental { base, target } => {
                write!(f, "incremental {base} -> {target}")
            }
        }
    }
}

/// Состояние remote-стороны на момент планирования.
#[derive(Debug, Clone)]
pub enum RemoteSide {
    Unavailable(SkipReason),
    Available(SnapshotSet),
}

impl RemoteSide {
    pub fn set(&self) -> Option<&SnapshotSet> {
        match self {
            RemoteSide::Available(s) => Some(s),
            RemoteSide::Unavailable(_) => None,
        }
    }
}

/// Самый новый снапшот, присутствующий на обеих сторонах (приоритет внешнего цикла по local).
pub fn newest_common<'a>(local: &'a SnapshotSet, remote: &SnapshotSet) -> Option<&'a Snapshot> {
    local
        .newest_first()
        .find(|l| remote.newest_first().any(|r| r.base_name == l.base_name))
}

pub fn plan_transfer(local: &SnapshotSet, remote: &RemoteSide, current: &str) -> TransferPlan {
    let remote = match remote {
        RemoteSide::Unavailable(reason) => return TransferPlan::Skip { reason: *reason },
        RemoteSide::Available(set) => set,
    };

    if remote.is_empty() {
        return TransferPlan::Full {
            target: current.to_string(),
        };
    }

    match newest_common(local, remote) {
        None => TransferPlan::Full {
            target: current.to_string(),
        },
        Some(base) if base.base_name == current => TransferPlan::Skip {
            reason: SkipReason::UpToDate,
        },
        Some(base) => TransferPlan::Incremental {
            base: base.base_name.clone(),
            target: current.to_string(),
        },
    }
}
