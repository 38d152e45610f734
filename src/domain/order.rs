// ==========================================
// BrightEat 团餐拼单系统 - 拼单领域模型
// ==========================================
// 职责: 拼单 (CollectionOrder) / 拼单明细 (OrderItem)
// 红线: 状态单向推进; 明细只能在 OPEN 状态下新增
// 红线: 明细在加入时快照单价,菜单调价不回溯
// ==========================================

use crate::domain::fee_preset::FeeBundle;
use crate::domain::types::{FeeSplitRule, OrderStatus};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// CollectionOrder - 拼单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOrder {
    // ===== 主键 =====
    pub order_id: String, // 拼单ID
    pub code: String,     // 拼单码 (唯一,便于分享)

    // ===== 关联 =====
    pub restaurant_id: String,
    pub collector_id: Option<String>, // 发起人 (用户删除后为空)
    pub collector_name: String,       // 发起人用户名快照

    // ===== 状态 =====
    pub status: OrderStatus,
    pub cutoff_time: Option<NaiveDateTime>, // 截单时间 (仅展示)
    pub instapay_link: Option<String>,      // 收款链接

    // ===== 可见性 =====
    pub is_private: bool,
    pub assigned_user_ids: Vec<String>, // 指派成员 (私有拼单时限制加菜)

    // ===== 费用 =====
    pub fees: FeeBundle,
    pub fee_split_rule: FeeSplitRule,

    // ===== 生命周期时间戳 (各只设置一次) =====
    pub created_at: NaiveDateTime,
    pub locked_at: Option<NaiveDateTime>,
    pub ordered_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
}

impl CollectionOrder {
    /// 判断用户是否为发起人
    pub fn is_collector(&self, user_id: &str) -> bool {
        self.collector_id.as_deref() == Some(user_id)
    }

    /// 判断用户是否可以向该拼单加菜（只看可见性,不看状态）
    pub fn may_contribute(&self, user_id: &str) -> bool {
        !self.is_private
            || self.is_collector(user_id)
            || self.assigned_user_ids.iter().any(|id| id == user_id)
    }

    /// 最近一次生命周期时间戳
    pub fn last_transition_at(&self) -> NaiveDateTime {
        self.closed_at
            .or(self.ordered_at)
            .or(self.locked_at)
            .unwrap_or(self.created_at)
    }
}

// ==========================================
// ItemSpec - 加菜请求 (已校验的标签联合)
// ==========================================
// 菜单菜品 与 自定义菜品 二选一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemSpec {
    CatalogItem { menu_item_id: String },
    CustomItem { name: String, price: Decimal },
}

// ==========================================
// ItemSource - 已保存明细的来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemSource {
    /// 菜单菜品 (菜品删除后 menu_item_id 为空,名称/单价保留快照)
    Catalog { menu_item_id: Option<String> },
    /// 自定义菜品
    Custom { name: String, price: Decimal },
}

// ==========================================
// OrderItem - 拼单明细
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: String,
    pub order_id: String,
    pub user_id: String,   // 参与人
    pub user_name: String, // 参与人用户名快照
    pub source: ItemSource,
    pub item_name: String, // 显示名称快照
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal, // quantity × unit_price
    pub created_at: NaiveDateTime,
}

impl OrderItem {
    /// 由已校验的来源构建明细
    ///
    /// 数量 × 单价溢出时返回 None
    pub fn new(
        order_id: &str,
        user_id: &str,
        user_name: &str,
        source: ItemSource,
        item_name: String,
        quantity: i32,
        unit_price: Decimal,
    ) -> Option<Self> {
        let total_price = unit_price.checked_mul(Decimal::from(quantity))?;
        Some(Self {
            item_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            source,
            item_name,
            quantity,
            unit_price,
            total_price,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }

    /// 关联的菜单菜品ID（自定义菜品或已删除菜品为 None）
    pub fn menu_item_id(&self) -> Option<&str> {
        match &self.source {
            ItemSource::Catalog { menu_item_id } => menu_item_id.as_deref(),
            ItemSource::Custom { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> CollectionOrder {
        CollectionOrder {
            order_id: "o1".to_string(),
            code: "ABC123".to_string(),
            restaurant_id: "r1".to_string(),
            collector_id: Some("u-collector".to_string()),
            collector_name: "collector".to_string(),
            status: OrderStatus::Open,
            cutoff_time: None,
            instapay_link: None,
            is_private: true,
            assigned_user_ids: vec!["u-a".to_string(), "u-b".to_string()],
            fees: FeeBundle::default(),
            fee_split_rule: FeeSplitRule::Equal,
            created_at: chrono::Utc::now().naive_utc(),
            locked_at: None,
            ordered_at: None,
            closed_at: None,
        }
    }

    #[test]
    fn test_private_order_contribution() {
        let order = sample_order();
        assert!(order.may_contribute("u-a"));
        assert!(order.may_contribute("u-collector"));
        assert!(!order.may_contribute("u-c"));

        let mut public = order.clone();
        public.is_private = false;
        assert!(public.may_contribute("u-c"));
    }

    #[test]
    fn test_item_total_price() {
        let item = OrderItem::new(
            "o1",
            "u-a",
            "alice",
            ItemSource::Custom {
                name: "Extra bread".to_string(),
                price: "2.50".parse().unwrap(),
            },
            "Extra bread".to_string(),
            3,
            "2.50".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(item.total_price, "7.50".parse::<Decimal>().unwrap());
        assert_eq!(item.menu_item_id(), None);
    }

    #[test]
    fn test_item_total_overflow_returns_none() {
        let item = OrderItem::new(
            "o1",
            "u-a",
            "alice",
            ItemSource::Custom {
                name: "big".to_string(),
                price: Decimal::MAX,
            },
            "big".to_string(),
            2,
            Decimal::MAX,
        );
        assert!(item.is_none());
    }
}
