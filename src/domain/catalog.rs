// ==========================================
// BrightEat 团餐拼单系统 - 菜单目录领域模型
// ==========================================
// 职责: 餐厅 / 菜单 / 菜品
// 红线: 拼单只引用菜品,下单时快照价格
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Restaurant - 餐厅
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub restaurant_id: String,
    pub name: String,
    pub description: String,
    pub created_by: Option<String>, // 创建人 (用户删除后为空)
    pub created_at: NaiveDateTime,
}

// ==========================================
// Menu - 菜单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub menu_id: String,
    pub restaurant_id: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// MenuItem - 菜品
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub menu_item_id: String,
    pub menu_id: String,
    pub restaurant_id: String, // 所属餐厅 (经 menu 关联查询得出)
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}
