use super::core::OrderRepository;
use crate::domain::order::{ItemSource, OrderItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{decimal_at, money, opt_decimal_at};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

const ITEM_COLUMNS: &str = r#"
    item_id, order_id, user_id, user_name, item_kind, menu_item_id,
    custom_name, custom_price, item_name, quantity, unit_price, total_price, created_at
"#;

impl OrderRepository {
    // ==========================================
    // 明细写入
    // ==========================================

    /// 插入明细
    pub fn insert_item_tx(conn: &Connection, item: &OrderItem) -> RepositoryResult<()> {
        let (kind, menu_item_id, custom_name, custom_price) = match &item.source {
            ItemSource::Catalog { menu_item_id } => ("CATALOG", menu_item_id.clone(), None, None),
            ItemSource::Custom { name, price } => {
                ("CUSTOM", None, Some(name.clone()), Some(money(*price)))
            }
        };

        conn.execute(
            r#"
            INSERT INTO order_item (
                item_id, order_id, user_id, user_name, item_kind, menu_item_id,
                custom_name, custom_price, item_name, quantity, unit_price, total_price, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                item.item_id,
                item.order_id,
                item.user_id,
                item.user_name,
                kind,
                menu_item_id,
                custom_name,
                custom_price,
                item.item_name,
                item.quantity,
                money(item.unit_price),
                money(item.total_price),
                item.created_at,
            ],
        )?;
        Ok(())
    }

    /// 删除明细
    pub fn delete_item_tx(conn: &Connection, item_id: &str) -> RepositoryResult<()> {
        let rows = conn.execute("DELETE FROM order_item WHERE item_id = ?1", params![item_id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found("OrderItem", item_id));
        }
        Ok(())
    }

    // ==========================================
    // 明细查询
    // ==========================================

    pub fn find_item_tx(conn: &Connection, item_id: &str) -> RepositoryResult<Option<OrderItem>> {
        let sql = format!("SELECT {} FROM order_item WHERE item_id = ?1", ITEM_COLUMNS);
        let item = conn.query_row(&sql, params![item_id], map_item_row).optional()?;
        Ok(item)
    }

    /// 拼单明细（按加入顺序）
    pub fn list_items(&self, order_id: &str) -> RepositoryResult<Vec<OrderItem>> {
        let conn = self.get_conn()?;
        Self::list_items_tx(&conn, order_id)
    }

    pub fn list_items_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<OrderItem>> {
        let sql = format!(
            "SELECT {} FROM order_item WHERE order_id = ?1 ORDER BY rowid",
            ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![order_id], map_item_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    pub fn count_items_tx(conn: &Connection, order_id: &str) -> RepositoryResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM order_item WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_item_row(row: &Row<'_>) -> SqliteResult<OrderItem> {
    let kind: String = row.get(4)?;
    let source = match kind.as_str() {
        "CATALOG" => ItemSource::Catalog {
            menu_item_id: row.get(5)?,
        },
        "CUSTOM" => ItemSource::Custom {
            name: row.get(6)?,
            price: opt_decimal_at(row, 7)?.ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    Type::Null,
                    "自定义菜品缺少价格".to_string().into(),
                )
            })?,
        },
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("未知明细类型: {}", other).into(),
            ))
        }
    };

    Ok(OrderItem {
        item_id: row.get(0)?,
        order_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        source,
        item_name: row.get(8)?,
        quantity: row.get(9)?,
        unit_price: decimal_at(row, 10)?,
        total_price: decimal_at(row, 11)?,
        created_at: row.get(12)?,
    })
}
