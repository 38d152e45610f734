use crate::domain::audit_log::AuditLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::json_at;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    /// 创建新的审计日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入审计日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    pub fn insert(&self, log: &AuditLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, log)
    }

    /// 插入审计日志（在调用方事务内,与业务写入同生共死）
    pub fn insert_tx(conn: &Connection, log: &AuditLog) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO audit_log (
                action_id, order_id, action_type, action_ts,
                actor_id, actor_name, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.action_id,
                log.order_id,
                log.action_type,
                log.action_ts,
                log.actor_id,
                log.actor_name,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 行映射
    pub(super) fn map_row(row: &Row<'_>) -> SqliteResult<AuditLog> {
        Ok(AuditLog {
            action_id: row.get(0)?,
            order_id: row.get(1)?,
            action_type: row.get(2)?,
            action_ts: row.get(3)?,
            actor_id: row.get(4)?,
            actor_name: row.get(5)?,
            payload_json: json_at(row, 6)?,
            detail: row.get(7)?,
        })
    }
}
