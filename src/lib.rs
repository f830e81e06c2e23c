// Базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod util;

// Ядро: имена → наборы → план передачи → ретеншн
pub mod naming;
pub mod snapset;   // src/snapset/{mod,scan}.rs
pub mod plan;
pub mod retention;

// Внешние операции (btrfs / sync / hooks)
pub mod exec;      // src/exec/{mod,command}.rs

// Оркестрация прогона
pub mod pipeline;

// Удобные реэкспорты
pub use config::{BackupConfig, ConfigFile, Overrides};
pub use error::{OpKind, SnapError};
pub use exec::{CommandRunner, ExecutionMode, Executor, Operation, Runner};
pub use pipeline::{preview, run_backup, run_sections, Preview, RunReport};
pub use plan::{plan_transfer, RemoteSide, SkipReason, TransferPlan};
pub use retention::{prune, select_for_deletion, RetentionPolicy};
pub use snapset::{scan, Location, Snapshot, SnapshotSet};
