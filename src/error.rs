//! Таксономия ошибок.
//!
//! - Precondition: нет прав, нет каталога, неверный keep-count. Проверяется до любой мутации.
//! - Operation: внешняя операция (create/delete/send/sync/hook) завершилась неуспешно.
//! - Config: неразбираемое числовое значение, битый конфиг-файл.
//!
//! Публичные API крейта возвращают anyhow::Result; SnapError лежит в корне цепочки,
//! вызывающая сторона может сделать `err.downcast_ref::<SnapError>()`.

use std::fmt;
use thiserror::Error;

/// Вид внешней операции (для сообщений и отчётов).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Create,
    Delete,
    SendFull,
    SendIncremental,
    Sync,
    Hook,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpKind::Create => "create",
            OpKind::Delete => "delete",
            OpKind::SendFull => "send-full",
            OpKind::SendIncremental => "send-incremental",
            OpKind::Sync => "sync",
            OpKind::Hook => "hook",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SnapError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("{op} failed: {detail}")]
    Operation {
        op: OpKind,
        detail: String,
        /// Захваченный вывод внешней команды (stdout+stderr).
        output: String,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl SnapError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        SnapError::Precondition(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        SnapError::Config(msg.into())
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, SnapError::Precondition(_))
    }

    pub fn is_operation(&self) -> bool {
        matches!(self, SnapError::Operation { .. })
    }
}

/// Найти SnapError в цепочке anyhow-ошибки.
pub fn snap_error(err: &anyhow::Error) -> Option<&SnapError> {
    err.chain().find_map(|e| e.downcast_ref::<SnapError>())
}
