// ==========================================
// BrightEat 团餐拼单系统 - 领域类型定义
// ==========================================
// 拼单状态 / 费用分摊规则 / 用户角色
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 拼单状态 (Order Status)
// ==========================================
// 红线: 状态只能前进,不可回退
// 顺序: Open < Locked < Ordered < Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,    // 收集中
    Locked,  // 已锁单
    Ordered, // 已下单
    Closed,  // 已结束
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl OrderStatus {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(OrderStatus::Open),
            "LOCKED" => Some(OrderStatus::Locked),
            "ORDERED" => Some(OrderStatus::Ordered),
            "CLOSED" => Some(OrderStatus::Closed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Locked => "LOCKED",
            OrderStatus::Ordered => "ORDERED",
            OrderStatus::Closed => "CLOSED",
        }
    }

    /// 后继状态（终态返回 None）
    pub fn next(&self) -> Option<Self> {
        match self {
            OrderStatus::Open => Some(OrderStatus::Locked),
            OrderStatus::Locked => Some(OrderStatus::Ordered),
            OrderStatus::Ordered => Some(OrderStatus::Closed),
            OrderStatus::Closed => None,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

// ==========================================
// 费用分摊规则 (Fee Split Rule)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeSplitRule {
    #[default]
    Equal,    // 按人头平摊
    Weighted, // 按菜品金额加权
}

impl fmt::Display for FeeSplitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FeeSplitRule {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EQUAL" => Some(FeeSplitRule::Equal),
            "WEIGHTED" => Some(FeeSplitRule::Weighted),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            FeeSplitRule::Equal => "EQUAL",
            FeeSplitRule::Weighted => "WEIGHTED",
        }
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,    // 普通成员
    Manager, // 菜单管理员
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "User"),
            UserRole::Manager => write!(f, "Manager"),
        }
    }
}

impl UserRole {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(UserRole::User),
            "manager" => Some(UserRole::Manager),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Manager => "manager",
        }
    }
}
