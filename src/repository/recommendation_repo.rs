// ==========================================
// BrightEat 团餐拼单系统 - 推荐数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::recommendation::Recommendation;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT r.recommendation_id, r.user_id, u.username, r.restaurant_id, rs.name,
           r.text, r.created_at
    FROM recommendation r
    JOIN users u ON u.user_id = r.user_id
    LEFT JOIN restaurant rs ON rs.restaurant_id = r.restaurant_id
"#;

pub struct RecommendationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecommendationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, rec: &Recommendation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO recommendation (recommendation_id, user_id, restaurant_id, text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                rec.recommendation_id,
                rec.user_id,
                rec.restaurant_id,
                rec.text,
                rec.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, recommendation_id: &str) -> RepositoryResult<Option<Recommendation>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE r.recommendation_id = ?1", SELECT_COLUMNS);
        let rec = conn
            .query_row(&sql, params![recommendation_id], map_recommendation_row)
            .optional()?;
        Ok(rec)
    }

    /// 按餐厅筛选（None 返回全部）,新的在前
    pub fn list(&self, restaurant_id: Option<&str>) -> RepositoryResult<Vec<Recommendation>> {
        let conn = self.get_conn()?;
        let list = match restaurant_id {
            Some(id) => {
                let sql = format!(
                    "{} WHERE r.restaurant_id = ?1 ORDER BY r.created_at DESC, r.rowid DESC",
                    SELECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![id], map_recommendation_row)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!("{} ORDER BY r.created_at DESC, r.rowid DESC", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_recommendation_row)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };
        Ok(list)
    }

    pub fn delete(&self, recommendation_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM recommendation WHERE recommendation_id = ?1",
            params![recommendation_id],
        )?;
        Ok(rows)
    }
}

fn map_recommendation_row(row: &Row<'_>) -> SqliteResult<Recommendation> {
    Ok(Recommendation {
        recommendation_id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        restaurant_id: row.get(3)?,
        restaurant_name: row.get(4)?,
        text: row.get(5)?,
        created_at: row.get(6)?,
    })
}
