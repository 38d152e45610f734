use super::core::AuditLogRepository;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

const LOG_COLUMNS: &str = r#"
    action_id, order_id, action_type, action_ts,
    actor_id, actor_name, payload_json, detail
"#;

impl AuditLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM audit_log WHERE action_id = ?1", LOG_COLUMNS);
        let log = conn.query_row(&sql, params![action_id], Self::map_row).optional()?;
        Ok(log)
    }

    /// 查询拼单的全部日志（按时间正序,同一时间按写入顺序）
    pub fn find_by_order_id(&self, order_id: &str) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        Self::find_by_order_id_tx(&conn, order_id)
    }

    pub fn find_by_order_id_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<AuditLog>> {
        let sql = format!(
            "SELECT {} FROM audit_log WHERE order_id = ?1 ORDER BY action_ts ASC, rowid ASC",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![order_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询指定操作人的日志
    pub fn find_by_actor(&self, actor_id: &str, limit: i32) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM audit_log WHERE actor_id = ?1 ORDER BY action_ts DESC LIMIT ?2",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![actor_id, limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询最近的 N 条日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM audit_log ORDER BY action_ts DESC, rowid DESC LIMIT ?1",
            LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 统计拼单某类操作的次数
    pub fn count_by_action(&self, order_id: &str, action: AuditAction) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE order_id = ?1 AND action_type = ?2",
            params![order_id, action.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
