use crate::domain::fee_preset::FeeBundle;
use crate::domain::order::CollectionOrder;
use crate::domain::types::{FeeSplitRule, OrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{decimal_at, enum_at, money};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = r#"
    order_id, code, restaurant_id, collector_id, collector_name, status,
    cutoff_time, instapay_link, is_private,
    delivery_fee, tip, service_fee, fee_split_rule,
    created_at, locked_at, ordered_at, closed_at
"#;

// ==========================================
// OrderRepository - 拼单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的拼单仓储
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

    /// 插入拼单及其指派成员
    pub fn insert_tx(conn: &Connection, order: &CollectionOrder) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO collection_order (
                order_id, code, restaurant_id, collector_id, collector_name, status,
                cutoff_time, instapay_link, is_private,
                delivery_fee, tip, service_fee, fee_split_rule,
                created_at, locked_at, ordered_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                order.order_id,
                order.code,
                order.restaurant_id,
                order.collector_id,
                order.collector_name,
                order.status.to_db_str(),
                order.cutoff_time,
                order.instapay_link,
                order.is_private,
                money(order.fees.delivery_fee),
                money(order.fees.tip),
                money(order.fees.service_fee),
                order.fee_split_rule.to_db_str(),
                order.created_at,
                order.locked_at,
                order.ordered_at,
                order.closed_at,
            ],
        )?;
        Self::replace_assigned_users_tx(conn, &order.order_id, &order.assigned_user_ids)?;
        Ok(())
    }

    /// 写回状态与生命周期时间戳
    ///
    /// 以 `expected` 作为乐观条件,状态已被并发修改时返回 0 行
    pub fn update_status_tx(
        conn: &Connection,
        order: &CollectionOrder,
        expected: OrderStatus,
    ) -> RepositoryResult<usize> {
        let rows = conn.execute(
            r#"
            UPDATE collection_order
            SET status = ?1, locked_at = ?2, ordered_at = ?3, closed_at = ?4
            WHERE order_id = ?5 AND status = ?6
            "#,
            params![
                order.status.to_db_str(),
                order.locked_at,
                order.ordered_at,
                order.closed_at,
                order.order_id,
                expected.to_db_str(),
            ],
        )?;
        Ok(rows)
    }

    /// 替换指派成员集合（保持入参顺序）
    pub fn replace_assigned_users_tx(
        conn: &Connection,
        order_id: &str,
        user_ids: &[String],
    ) -> RepositoryResult<()> {
        conn.execute(
            "DELETE FROM order_assigned_user WHERE order_id = ?1",
            params![order_id],
        )?;
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO order_assigned_user (order_id, user_id) VALUES (?1, ?2)",
        )?;
        for user_id in user_ids {
            stmt.execute(params![order_id, user_id])?;
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<CollectionOrder>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, order_id)
    }

    pub fn find_by_id_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Option<CollectionOrder>> {
        let sql = format!("SELECT {} FROM collection_order WHERE order_id = ?1", ORDER_COLUMNS);
        let order = conn.query_row(&sql, params![order_id], map_order_row).optional()?;
        match order {
            Some(mut order) => {
                order.assigned_user_ids = Self::assigned_user_ids_tx(conn, &order.order_id)?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<CollectionOrder>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM collection_order WHERE code = ?1", ORDER_COLUMNS);
        let order = conn.query_row(&sql, params![code], map_order_row).optional()?;
        match order {
            Some(mut order) => {
                order.assigned_user_ids = Self::assigned_user_ids_tx(&conn, &order.order_id)?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    pub fn code_exists_tx(conn: &Connection, code: &str) -> RepositoryResult<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM collection_order WHERE code = ?1",
                params![code],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 查询拼单列表（可按状态过滤,按创建时间倒序）
    pub fn list(&self, status: Option<OrderStatus>) -> RepositoryResult<Vec<CollectionOrder>> {
        let conn = self.get_conn()?;
        let mut orders = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM collection_order WHERE status = ?1 ORDER BY created_at DESC",
                    ORDER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![status.to_db_str()], map_order_row)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM collection_order ORDER BY created_at DESC",
                    ORDER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_order_row)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };
        for order in orders.iter_mut() {
            order.assigned_user_ids = Self::assigned_user_ids_tx(&conn, &order.order_id)?;
        }
        Ok(orders)
    }

    /// 指派成员ID（按指派顺序）
    pub fn assigned_user_ids_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT user_id FROM order_assigned_user WHERE order_id = ?1 ORDER BY rowid",
        )?;
        let ids = stmt
            .query_map(params![order_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(ids)
    }
}

fn map_order_row(row: &Row<'_>) -> SqliteResult<CollectionOrder> {
    Ok(CollectionOrder {
        order_id: row.get(0)?,
        code: row.get(1)?,
        restaurant_id: row.get(2)?,
        collector_id: row.get(3)?,
        collector_name: row.get(4)?,
        status: enum_at(row, 5, OrderStatus::from_db_str)?,
        cutoff_time: row.get(6)?,
        instapay_link: row.get(7)?,
        is_private: row.get(8)?,
        assigned_user_ids: Vec::new(),
        fees: FeeBundle {
            delivery_fee: decimal_at(row, 9)?,
            tip: decimal_at(row, 10)?,
            service_fee: decimal_at(row, 11)?,
        },
        fee_split_rule: enum_at(row, 12, FeeSplitRule::from_db_str)?,
        created_at: row.get(13)?,
        locked_at: row.get(14)?,
        ordered_at: row.get(15)?,
        closed_at: row.get(16)?,
    })
}
