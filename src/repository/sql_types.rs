// ==========================================
// BrightEat 团餐拼单系统 - 列类型转换
// ==========================================
// 金额: TEXT <-> rust_decimal::Decimal
// 枚举: TEXT <-> 领域枚举 (from_db_str)
// 时间: 由 rusqlite chrono 特性直接映射 NaiveDateTime
// ==========================================

use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use std::str::FromStr;

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// 读取金额列
pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, format!("金额格式错误 '{}': {}", raw, e)))
}

/// 读取可空金额列
pub fn opt_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Decimal::from_str(&s).map_err(|e| conversion_error(idx, format!("金额格式错误 '{}': {}", s, e)))
    })
    .transpose()
}

/// 读取枚举列
pub fn enum_at<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("未知枚举值: {}", raw)))
}

/// 读取 JSON 列
pub fn json_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_error(idx, e.to_string())))
        .transpose()
}

/// 金额写入格式
pub fn money(value: Decimal) -> String {
    value.to_string()
}
