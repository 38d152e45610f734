// ==========================================
// BrightEat 团餐拼单系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::FeeSplitRule;
use crate::engine::join_code::{DEFAULT_CODE_LENGTH, MIN_CODE_LENGTH};
use crate::engine::provisioning::{DEFAULT_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT）
    ///
    /// 未知键返回错误
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        if !config_keys::ALL.contains(&key) {
            return Err(format!("未知配置项: {}", key).into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 删除配置值（恢复默认）
    pub fn unset_value(&self, key: &str) -> Result<bool, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let rows = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(rows > 0)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// 已知配置项一律给出生效值（含默认值）,其余已存储键原样输出
    pub fn get_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let mut config_map: BTreeMap<String, String> = BTreeMap::new();

        {
            let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            let mut stmt =
                conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, value) = row?;
                config_map.insert(key, value);
            }
        }

        config_map
            .entry(config_keys::FRONTEND_URL.to_string())
            .or_default();
        config_map
            .entry(config_keys::CLOSE_REQUIRES_ALL_PAID.to_string())
            .or_insert_with(|| "false".to_string());
        config_map
            .entry(config_keys::JOIN_CODE_LENGTH.to_string())
            .or_insert_with(|| DEFAULT_CODE_LENGTH.to_string());
        config_map
            .entry(config_keys::DEFAULT_FEE_SPLIT_RULE.to_string())
            .or_insert_with(|| FeeSplitRule::default().to_db_str().to_string());
        config_map
            .entry(config_keys::PASSWORD_LENGTH.to_string())
            .or_insert_with(|| DEFAULT_PASSWORD_LENGTH.to_string());
        config_map
            .entry(config_keys::LOCALE.to_string())
            .or_insert_with(|| DEFAULT_LOCALE.to_string());

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ==========================================
    // 类型化读取
    // ==========================================

    /// 前端地址（用于生成加入链接）,空值视为未配置
    pub fn get_frontend_url(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::FRONTEND_URL)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 结单前是否要求全部付款
    pub fn get_close_requires_all_paid(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CLOSE_REQUIRES_ALL_PAID, "false")?;
        Ok(parse_bool(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::CLOSE_REQUIRES_ALL_PAID,
                raw_value = %value,
                "布尔配置格式错误，使用默认值 false"
            );
            false
        }))
    }

    /// 拼单码长度（不低于 MIN_CODE_LENGTH）
    pub fn get_join_code_length(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::JOIN_CODE_LENGTH,
            &DEFAULT_CODE_LENGTH.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<usize>()
            .unwrap_or(DEFAULT_CODE_LENGTH)
            .max(MIN_CODE_LENGTH))
    }

    /// 创建拼单时未指定规则的默认分摊规则
    pub fn get_default_fee_split_rule(&self) -> Result<FeeSplitRule, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_FEE_SPLIT_RULE, "EQUAL")?;
        Ok(FeeSplitRule::from_db_str(&value).unwrap_or_default())
    }

    /// 生成密码长度（不低于 MIN_PASSWORD_LENGTH）
    pub fn get_password_length(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::PASSWORD_LENGTH,
            &DEFAULT_PASSWORD_LENGTH.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<usize>()
            .unwrap_or(DEFAULT_PASSWORD_LENGTH)
            .max(MIN_PASSWORD_LENGTH))
    }

    /// 界面语言
    pub fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::LOCALE, DEFAULT_LOCALE)
    }
}

/// 默认语言
pub const DEFAULT_LOCALE: &str = "en";

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const FRONTEND_URL: &str = "frontend_url";
    pub const CLOSE_REQUIRES_ALL_PAID: &str = "close_requires_all_paid";
    pub const JOIN_CODE_LENGTH: &str = "join_code_length";
    pub const DEFAULT_FEE_SPLIT_RULE: &str = "default_fee_split_rule";
    pub const PASSWORD_LENGTH: &str = "password_length";
    pub const LOCALE: &str = "locale";

    /// 全部已知配置项
    pub const ALL: &[&str] = &[
        FRONTEND_URL,
        CLOSE_REQUIRES_ALL_PAID,
        JOIN_CODE_LENGTH,
        DEFAULT_FEE_SPLIT_RULE,
        PASSWORD_LENGTH,
        LOCALE,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = crate::db::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = setup();
        assert_eq!(config.get_frontend_url().unwrap(), None);
        assert!(!config.get_close_requires_all_paid().unwrap());
        assert_eq!(config.get_join_code_length().unwrap(), 6);
        assert_eq!(config.get_default_fee_split_rule().unwrap(), FeeSplitRule::Equal);
        assert_eq!(config.get_password_length().unwrap(), 12);
        assert_eq!(config.get_locale().unwrap(), "en");
    }

    #[test]
    fn test_set_and_read_back() {
        let config = setup();
        config.set_value(config_keys::FRONTEND_URL, " https://eat.example.com ").unwrap();
        config.set_value(config_keys::CLOSE_REQUIRES_ALL_PAID, "true").unwrap();
        config.set_value(config_keys::DEFAULT_FEE_SPLIT_RULE, "weighted").unwrap();
        config.set_value(config_keys::JOIN_CODE_LENGTH, "2").unwrap();

        assert_eq!(
            config.get_frontend_url().unwrap().as_deref(),
            Some("https://eat.example.com")
        );
        assert!(config.get_close_requires_all_paid().unwrap());
        assert_eq!(config.get_default_fee_split_rule().unwrap(), FeeSplitRule::Weighted);
        // 低于下限时取下限
        assert_eq!(config.get_join_code_length().unwrap(), MIN_CODE_LENGTH);

        assert!(config.unset_value(config_keys::CLOSE_REQUIRES_ALL_PAID).unwrap());
        assert!(!config.get_close_requires_all_paid().unwrap());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let config = setup();
        assert!(config.set_value("frontend_ulr", "x").is_err());
    }

    #[test]
    fn test_snapshot_contains_effective_values() {
        let config = setup();
        config.set_value(config_keys::LOCALE, "zh-CN").unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&config.get_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot["locale"], "zh-CN");
        assert_eq!(snapshot["join_code_length"], "6");
        assert_eq!(snapshot["close_requires_all_paid"], "false");
    }
}
