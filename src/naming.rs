//! Имена снапшотов: `{host}_{label}_{timestamp}`.
//!
//! Метка времени имеет фиксированную ширину (`YYYY-MM-DD_HH-MM-SS`), поэтому вся
//! сортировка в крейте строковая и совпадает с хронологической.

use chrono::{Local, NaiveDateTime};

use crate::consts::{NAME_SEPARATOR, TIMESTAMP_FORMAT, TIMESTAMP_LEN};

/// Собрать имя снапшота.
pub fn encode(host: &str, label: &str, timestamp: &str) -> String {
    format!("{host}{NAME_SEPARATOR}{label}{NAME_SEPARATOR}{timestamp}")
}

/// Префикс `{host}_{label}_`, общий для всех снапшотов набора.
pub fn prefix(host: &str, label: &str) -> String {
    format!("{host}{NAME_SEPARATOR}{label}{NAME_SEPARATOR}")
}

/// Glob-совпадение с шаблоном `{host}_{label}_*`.
pub fn matches(name: &str, host: &str, label: &str) -> bool {
    name.starts_with(&prefix(host, label))
}

/// Разобрать имя: вернуть метку времени, если имя принадлежит набору host+label
/// и суффикс — корректная метка фиксированной ширины.
///
/// `h_l_extra_2024-01-01_00-00-00` не относится к набору (h, l): суффикс не метка времени.
pub fn decode<'a>(name: &'a str, host: &str, label: &str) -> Option<&'a str> {
    let ts = name.strip_prefix(&prefix(host, label))?;
    if is_valid_timestamp(ts) {
        Some(ts)
    } else {
        None
    }
}

pub fn is_valid_timestamp(ts: &str) -> bool {
    ts.len() == TIMESTAMP_LEN && NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok()
}

/// Текущее локальное время в формате метки.
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
