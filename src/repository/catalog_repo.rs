// ==========================================
// BrightEat 团餐拼单系统 - 菜单目录数据仓储
// ==========================================
// 职责: restaurant / menu / menu_item 三张表的 CRUD
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::catalog::{Menu, MenuItem, Restaurant};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{decimal_at, money};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

const MENU_ITEM_SELECT: &str = r#"
    SELECT mi.menu_item_id, mi.menu_id, m.restaurant_id, mi.name, mi.description,
           mi.price, mi.is_available, mi.created_at
    FROM menu_item mi
    JOIN menu m ON m.menu_id = mi.menu_id
"#;

// ==========================================
// CatalogRepository - 菜单目录仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 餐厅
    // ==========================================

    pub fn insert_restaurant(&self, restaurant: &Restaurant) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO restaurant (restaurant_id, name, description, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                restaurant.restaurant_id,
                restaurant.name,
                restaurant.description,
                restaurant.created_by,
                restaurant.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_restaurant(&self, restaurant_id: &str) -> RepositoryResult<Option<Restaurant>> {
        let conn = self.get_conn()?;
        Self::find_restaurant_tx(&conn, restaurant_id)
    }

    pub fn find_restaurant_tx(
        conn: &Connection,
        restaurant_id: &str,
    ) -> RepositoryResult<Option<Restaurant>> {
        let restaurant = conn
            .query_row(
                r#"
                SELECT restaurant_id, name, description, created_by, created_at
                FROM restaurant WHERE restaurant_id = ?1
                "#,
                params![restaurant_id],
                map_restaurant_row,
            )
            .optional()?;
        Ok(restaurant)
    }

    pub fn find_restaurant_by_name(&self, name: &str) -> RepositoryResult<Option<Restaurant>> {
        let conn = self.get_conn()?;
        let restaurant = conn
            .query_row(
                r#"
                SELECT restaurant_id, name, description, created_by, created_at
                FROM restaurant WHERE name = ?1
                "#,
                params![name],
                map_restaurant_row,
            )
            .optional()?;
        Ok(restaurant)
    }

    pub fn list_restaurants(&self) -> RepositoryResult<Vec<Restaurant>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT restaurant_id, name, description, created_by, created_at
            FROM restaurant ORDER BY name
            "#,
        )?;
        let list = stmt
            .query_map([], map_restaurant_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    // ==========================================
    // 菜单
    // ==========================================

    pub fn insert_menu(&self, menu: &Menu) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO menu (menu_id, restaurant_id, name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                menu.menu_id,
                menu.restaurant_id,
                menu.name,
                menu.is_active,
                menu.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_menu(&self, menu_id: &str) -> RepositoryResult<Option<Menu>> {
        let conn = self.get_conn()?;
        let menu = conn
            .query_row(
                "SELECT menu_id, restaurant_id, name, is_active, created_at FROM menu WHERE menu_id = ?1",
                params![menu_id],
                map_menu_row,
            )
            .optional()?;
        Ok(menu)
    }

    pub fn find_menu_by_name(&self, restaurant_id: &str, name: &str) -> RepositoryResult<Option<Menu>> {
        let conn = self.get_conn()?;
        let menu = conn
            .query_row(
                r#"
                SELECT menu_id, restaurant_id, name, is_active, created_at
                FROM menu WHERE restaurant_id = ?1 AND name = ?2
                "#,
                params![restaurant_id, name],
                map_menu_row,
            )
            .optional()?;
        Ok(menu)
    }

    pub fn list_menus(&self, restaurant_id: &str) -> RepositoryResult<Vec<Menu>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT menu_id, restaurant_id, name, is_active, created_at
            FROM menu WHERE restaurant_id = ?1 ORDER BY name
            "#,
        )?;
        let list = stmt
            .query_map(params![restaurant_id], map_menu_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    // ==========================================
    // 菜品
    // ==========================================

    pub fn insert_menu_item(&self, item: &MenuItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO menu_item (
                menu_item_id, menu_id, name, description, price, is_available, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                item.menu_item_id,
                item.menu_id,
                item.name,
                item.description,
                money(item.price),
                item.is_available,
                item.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_menu_item(&self, menu_item_id: &str) -> RepositoryResult<Option<MenuItem>> {
        let conn = self.get_conn()?;
        Self::find_menu_item_tx(&conn, menu_item_id)
    }

    pub fn find_menu_item_tx(
        conn: &Connection,
        menu_item_id: &str,
    ) -> RepositoryResult<Option<MenuItem>> {
        let sql = format!("{} WHERE mi.menu_item_id = ?1", MENU_ITEM_SELECT);
        let item = conn
            .query_row(&sql, params![menu_item_id], map_menu_item_row)
            .optional()?;
        Ok(item)
    }

    pub fn find_menu_item_by_name(&self, menu_id: &str, name: &str) -> RepositoryResult<Option<MenuItem>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE mi.menu_id = ?1 AND mi.name = ?2", MENU_ITEM_SELECT);
        let item = conn
            .query_row(&sql, params![menu_id, name], map_menu_item_row)
            .optional()?;
        Ok(item)
    }

    pub fn list_menu_items(&self, menu_id: &str) -> RepositoryResult<Vec<MenuItem>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE mi.menu_id = ?1 ORDER BY mi.name", MENU_ITEM_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map(params![menu_id], map_menu_item_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    pub fn update_menu_item_price(&self, menu_item_id: &str, price: Decimal) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE menu_item SET price = ?1 WHERE menu_item_id = ?2",
            params![money(price), menu_item_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("MenuItem", menu_item_id));
        }
        Ok(())
    }

    pub fn set_menu_item_availability(&self, menu_item_id: &str, is_available: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE menu_item SET is_available = ?1 WHERE menu_item_id = ?2",
            params![is_available, menu_item_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("MenuItem", menu_item_id));
        }
        Ok(())
    }

    /// 删除菜品（已有明细的 menu_item_id 置空,名称/单价快照保留）
    pub fn delete_menu_item(&self, menu_item_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM menu_item WHERE menu_item_id = ?1",
            params![menu_item_id],
        )?;
        Ok(rows)
    }
}

fn map_restaurant_row(row: &Row<'_>) -> SqliteResult<Restaurant> {
    Ok(Restaurant {
        restaurant_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_menu_row(row: &Row<'_>) -> SqliteResult<Menu> {
    Ok(Menu {
        menu_id: row.get(0)?,
        restaurant_id: row.get(1)?,
        name: row.get(2)?,
        is_active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_menu_item_row(row: &Row<'_>) -> SqliteResult<MenuItem> {
    Ok(MenuItem {
        menu_item_id: row.get(0)?,
        menu_id: row.get(1)?,
        restaurant_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        price: decimal_at(row, 5)?,
        is_available: row.get(6)?,
        created_at: row.get(7)?,
    })
}
