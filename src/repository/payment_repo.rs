// ==========================================
// BrightEat 团餐拼单系统 - 付款台账数据仓储
// ==========================================
// 红线: (order_id, user_id) 唯一; 重算时原地覆盖,不新增重复行
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::payment::Payment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{decimal_at, money};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const PAYMENT_COLUMNS: &str = r#"
    payment_id, order_id, user_id, user_name, item_subtotal, fee_share, amount,
    is_paid, paid_at, created_at, updated_at
"#;

pub struct PaymentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PaymentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 按 (order_id, user_id) 插入或覆盖
    ///
    /// 冲突时保留原 payment_id 与 created_at
    pub fn upsert_tx(conn: &Connection, payment: &Payment) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO payment (
                payment_id, order_id, user_id, user_name, item_subtotal, fee_share, amount,
                is_paid, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(order_id, user_id) DO UPDATE SET
                user_name = excluded.user_name,
                item_subtotal = excluded.item_subtotal,
                fee_share = excluded.fee_share,
                amount = excluded.amount,
                is_paid = excluded.is_paid,
                paid_at = excluded.paid_at,
                updated_at = excluded.updated_at
            "#,
            params![
                payment.payment_id,
                payment.order_id,
                payment.user_id,
                payment.user_name,
                money(payment.item_subtotal),
                money(payment.fee_share),
                money(payment.amount),
                payment.is_paid,
                payment.paid_at,
                payment.created_at,
                payment.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 删除不在参与人列表中的付款记录
    ///
    /// # 返回
    /// - 被删除的行数
    pub fn delete_stale_tx(
        conn: &Connection,
        order_id: &str,
        participant_ids: &[String],
    ) -> RepositoryResult<usize> {
        let existing = Self::list_by_order_tx(conn, order_id)?;
        let mut removed = 0;
        for payment in existing {
            if !participant_ids.iter().any(|id| *id == payment.user_id) {
                removed += conn.execute(
                    "DELETE FROM payment WHERE payment_id = ?1",
                    params![payment.payment_id],
                )?;
            }
        }
        Ok(removed)
    }

    /// 写回付款状态
    pub fn update_paid_tx(conn: &Connection, payment: &Payment) -> RepositoryResult<()> {
        let rows = conn.execute(
            "UPDATE payment SET is_paid = ?1, paid_at = ?2, updated_at = ?3 WHERE payment_id = ?4",
            params![
                payment.is_paid,
                payment.paid_at,
                payment.updated_at,
                payment.payment_id
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Payment", &payment.payment_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, payment_id: &str) -> RepositoryResult<Option<Payment>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, payment_id)
    }

    pub fn find_by_id_tx(conn: &Connection, payment_id: &str) -> RepositoryResult<Option<Payment>> {
        let sql = format!("SELECT {} FROM payment WHERE payment_id = ?1", PAYMENT_COLUMNS);
        let payment = conn.query_row(&sql, params![payment_id], map_payment_row).optional()?;
        Ok(payment)
    }

    pub fn list_by_order(&self, order_id: &str) -> RepositoryResult<Vec<Payment>> {
        let conn = self.get_conn()?;
        Self::list_by_order_tx(&conn, order_id)
    }

    pub fn list_by_order_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM payment WHERE order_id = ?1 ORDER BY rowid",
            PAYMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map(params![order_id], map_payment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 用户的全部付款记录（最近更新在前）
    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Payment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM payment WHERE user_id = ?1 ORDER BY updated_at DESC",
            PAYMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map(params![user_id], map_payment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 未付款数量
    pub fn count_unpaid_tx(conn: &Connection, order_id: &str) -> RepositoryResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM payment WHERE order_id = ?1 AND is_paid = 0",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_payment_row(row: &Row<'_>) -> SqliteResult<Payment> {
    Ok(Payment {
        payment_id: row.get(0)?,
        order_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        item_subtotal: decimal_at(row, 4)?,
        fee_share: decimal_at(row, 5)?,
        amount: decimal_at(row, 6)?,
        is_paid: row.get(7)?,
        paid_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
