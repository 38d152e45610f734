// ==========================================
// BrightEat 团餐拼单系统 - 审计日志领域模型
// ==========================================
// 红线: 只追加,不修改,不删除 (随拼单级联删除除外)
// 红线: 每次状态转换恰好一条日志
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditLog - 审计日志
// ==========================================
// 对齐: schema.sql audit_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    // ===== 主键 =====
    pub action_id: String,        // 日志ID (UUID)
    pub order_id: String,         // 关联拼单
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime, // 操作时间戳

    // ===== 操作人 =====
    pub actor_id: Option<String>, // 操作人ID (用户删除后为空)
    pub actor_name: String,       // 操作人用户名快照

    // ===== 操作负载 =====
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// AuditAction - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    OrderCreated,         // 创建拼单
    ItemAdded,            // 加菜
    ItemRemoved,          // 删菜
    AssignedUsersUpdated, // 调整指派成员
    Locked,               // 锁单
    Ordered,              // 下单
    Closed,               // 结单
    SharesRecomputed,     // 重算分摊
    PaymentMarkedPaid,    // 确认付款
}

impl AuditAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::OrderCreated => "ORDER_CREATED",
            AuditAction::ItemAdded => "ITEM_ADDED",
            AuditAction::ItemRemoved => "ITEM_REMOVED",
            AuditAction::AssignedUsersUpdated => "ASSIGNED_USERS_UPDATED",
            AuditAction::Locked => "LOCKED",
            AuditAction::Ordered => "ORDERED",
            AuditAction::Closed => "CLOSED",
            AuditAction::SharesRecomputed => "SHARES_RECOMPUTED",
            AuditAction::PaymentMarkedPaid => "PAYMENT_MARKED_PAID",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ORDER_CREATED" => Some(AuditAction::OrderCreated),
            "ITEM_ADDED" => Some(AuditAction::ItemAdded),
            "ITEM_REMOVED" => Some(AuditAction::ItemRemoved),
            "ASSIGNED_USERS_UPDATED" => Some(AuditAction::AssignedUsersUpdated),
            "LOCKED" => Some(AuditAction::Locked),
            "ORDERED" => Some(AuditAction::Ordered),
            "CLOSED" => Some(AuditAction::Closed),
            "SHARES_RECOMPUTED" => Some(AuditAction::SharesRecomputed),
            "PAYMENT_MARKED_PAID" => Some(AuditAction::PaymentMarkedPaid),
            _ => None,
        }
    }

    /// 是否为状态转换类操作
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            AuditAction::Locked | AuditAction::Ordered | AuditAction::Closed
        )
    }
}

// ==========================================
// AuditLog 辅助方法
// ==========================================
impl AuditLog {
    /// 创建新的审计日志
    pub fn new(order_id: &str, action: AuditAction, actor_id: &str, actor_name: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            action_type: action.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor_id: Some(actor_id.to_string()),
            actor_name: actor_name.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 指定时间戳（与状态转换时间对齐）
    pub fn at(mut self, ts: NaiveDateTime) -> Self {
        self.action_ts = ts;
        self
    }

    /// 解析后的操作类型
    pub fn action(&self) -> Option<AuditAction> {
        AuditAction::parse(&self.action_type)
    }
}
