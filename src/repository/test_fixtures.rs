// ==========================================
// 仓储层测试夹具 (仅测试编译)
// ==========================================
// 内存库 + 满足外键的最小数据
// ==========================================

use crate::domain::fee_preset::FeeBundle;
use crate::domain::order::CollectionOrder;
use crate::domain::types::{FeeSplitRule, OrderStatus, UserRole};
use crate::domain::user::User;
use crate::repository::order_repo::OrderRepository;
use crate::repository::user_repo::UserRepository;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub fn setup_conn() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(crate::db::open_in_memory().unwrap()))
}

pub fn insert_user(conn: &Connection, username: &str) -> String {
    let user = User::new(username.to_string(), None, UserRole::User);
    UserRepository::insert_tx(conn, &user).unwrap();
    user.user_id
}

pub fn insert_restaurant(conn: &Connection, name: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO restaurant (restaurant_id, name, description, created_at) VALUES (?1, ?2, '', datetime('now'))",
        params![id, name],
    )
    .unwrap();
    id
}

pub fn sample_order(restaurant_id: &str, collector_id: &str, code: &str) -> CollectionOrder {
    CollectionOrder {
        order_id: uuid::Uuid::new_v4().to_string(),
        code: code.to_string(),
        restaurant_id: restaurant_id.to_string(),
        collector_id: Some(collector_id.to_string()),
        collector_name: "collector".to_string(),
        status: OrderStatus::Open,
        cutoff_time: None,
        instapay_link: None,
        is_private: false,
        assigned_user_ids: vec![],
        fees: FeeBundle::new("30".parse().unwrap(), "10".parse().unwrap(), "0".parse().unwrap()),
        fee_split_rule: FeeSplitRule::Equal,
        created_at: chrono::Utc::now().naive_utc(),
        locked_at: None,
        ordered_at: None,
        closed_at: None,
    }
}

/// 插入一张 OPEN 拼单,返回 (order_id, collector_id)
pub fn insert_order(conn: &Connection, code: &str) -> (String, String) {
    let collector_id = insert_user(conn, &format!("collector_{}", code.to_lowercase()));
    let restaurant_id = insert_restaurant(conn, &format!("Restaurant {}", code));
    let order = sample_order(&restaurant_id, &collector_id, code);
    OrderRepository::insert_tx(conn, &order).unwrap();
    (order.order_id, collector_id)
}
