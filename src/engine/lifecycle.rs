// ==========================================
// BrightEat 团餐拼单系统 - 拼单生命周期引擎
// ==========================================
// 状态机: OPEN → LOCKED → ORDERED → CLOSED
// 红线: 状态只能前进; 时间戳各设置一次且单调不减
// 红线: 非法转换必须显式报错,不可静默忽略
// ==========================================
// 职责: 纯状态机校验与推进,不拼 SQL
// ==========================================

use crate::domain::audit_log::AuditAction;
use crate::domain::order::CollectionOrder;
use crate::domain::types::OrderStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// Transition - 状态转换
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Lock,        // OPEN → LOCKED
    MarkOrdered, // LOCKED → ORDERED
    Close,       // ORDERED → CLOSED
}

impl Transition {
    /// 允许发起转换的当前状态
    pub fn from_status(&self) -> OrderStatus {
        match self {
            Transition::Lock => OrderStatus::Open,
            Transition::MarkOrdered => OrderStatus::Locked,
            Transition::Close => OrderStatus::Ordered,
        }
    }

    /// 转换后的目标状态
    pub fn to_status(&self) -> OrderStatus {
        match self {
            Transition::Lock => OrderStatus::Locked,
            Transition::MarkOrdered => OrderStatus::Ordered,
            Transition::Close => OrderStatus::Closed,
        }
    }

    /// 对应的审计操作类型
    pub fn audit_action(&self) -> AuditAction {
        match self {
            Transition::Lock => AuditAction::Locked,
            Transition::MarkOrdered => AuditAction::Ordered,
            Transition::Close => AuditAction::Closed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transition::Lock => "lock",
            Transition::MarkOrdered => "mark_ordered",
            Transition::Close => "close",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==========================================
// LifecycleError - 生命周期错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("无效的状态转换: 当前状态={current}, 请求={requested} (需要 {expected})")]
    InvalidTransition {
        current: OrderStatus,
        requested: Transition,
        expected: OrderStatus,
    },

    #[error("仅发起人可执行该操作: order={order_id}, actor={actor_id}")]
    NotCollector { order_id: String, actor_id: String },
}

// ==========================================
// 状态机校验与推进
// ==========================================

/// 校验转换是否合法（不修改拼单）
///
/// 先校验状态,再校验发起人身份
pub fn check_transition(
    order: &CollectionOrder,
    transition: Transition,
    actor_id: &str,
) -> Result<(), LifecycleError> {
    if order.status != transition.from_status() {
        return Err(LifecycleError::InvalidTransition {
            current: order.status,
            requested: transition,
            expected: transition.from_status(),
        });
    }
    if !order.is_collector(actor_id) {
        return Err(LifecycleError::NotCollector {
            order_id: order.order_id.clone(),
            actor_id: actor_id.to_string(),
        });
    }
    Ok(())
}

/// 执行转换: 推进状态并设置对应时间戳
///
/// 时间戳取 max(now, 上一个生命周期时间戳),保证单调不减。
/// 失败时拼单保持不变。
///
/// # 返回
/// - `Ok(ts)`: 本次转换写入的时间戳
pub fn apply_transition(
    order: &mut CollectionOrder,
    transition: Transition,
    actor_id: &str,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, LifecycleError> {
    check_transition(order, transition, actor_id)?;

    let ts = now.max(order.last_transition_at());
    match transition {
        Transition::Lock => order.locked_at = Some(ts),
        Transition::MarkOrdered => order.ordered_at = Some(ts),
        Transition::Close => order.closed_at = Some(ts),
    }
    order.status = transition.to_status();
    Ok(ts)
}

/// 校验拼单是否仍可修改明细（OPEN）
pub fn is_accepting_items(order: &CollectionOrder) -> bool {
    order.status == OrderStatus::Open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fee_preset::FeeBundle;
    use crate::domain::types::FeeSplitRule;
    use chrono::Duration;

    fn open_order() -> CollectionOrder {
        CollectionOrder {
            order_id: "o1".to_string(),
            code: "K7P2QX".to_string(),
            restaurant_id: "r1".to_string(),
            collector_id: Some("collector".to_string()),
            collector_name: "collector".to_string(),
            status: OrderStatus::Open,
            cutoff_time: None,
            instapay_link: None,
            is_private: false,
            assigned_user_ids: vec![],
            fees: FeeBundle::default(),
            fee_split_rule: FeeSplitRule::Equal,
            created_at: chrono::Utc::now().naive_utc(),
            locked_at: None,
            ordered_at: None,
            closed_at: None,
        }
    }

    #[test]
    fn test_full_sequence_sets_each_timestamp_once() {
        let mut order = open_order();
        let t0 = order.created_at;

        let t_lock = apply_transition(&mut order, Transition::Lock, "collector", t0 + Duration::seconds(1)).unwrap();
        let t_ord = apply_transition(&mut order, Transition::MarkOrdered, "collector", t0 + Duration::seconds(2)).unwrap();
        let t_close = apply_transition(&mut order, Transition::Close, "collector", t0 + Duration::seconds(3)).unwrap();

        assert_eq!(order.status, OrderStatus::Closed);
        assert_eq!(order.locked_at, Some(t_lock));
        assert_eq!(order.ordered_at, Some(t_ord));
        assert_eq!(order.closed_at, Some(t_close));
        assert!(t0 <= t_lock && t_lock <= t_ord && t_ord <= t_close);
    }

    #[test]
    fn test_clock_skew_keeps_timestamps_monotonic() {
        let mut order = open_order();
        let earlier = order.created_at - Duration::minutes(5);

        let t_lock = apply_transition(&mut order, Transition::Lock, "collector", earlier).unwrap();
        assert_eq!(t_lock, order.created_at);
    }

    #[test]
    fn test_out_of_order_transition_rejected_without_side_effects() {
        let mut order = open_order();
        let before = order.clone();
        let now = order.created_at;

        let err = apply_transition(&mut order, Transition::Close, "collector", now).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                current: OrderStatus::Open,
                requested: Transition::Close,
                expected: OrderStatus::Ordered,
            }
        );
        assert_eq!(order.status, before.status);
        assert_eq!(order.locked_at, None);
        assert_eq!(order.closed_at, None);
    }

    #[test]
    fn test_repeated_transition_rejected() {
        let mut order = open_order();
        let now = order.created_at;
        apply_transition(&mut order, Transition::Lock, "collector", now).unwrap();
        let locked_at = order.locked_at;

        let err = apply_transition(&mut order, Transition::Lock, "collector", now).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { current: OrderStatus::Locked, .. }));
        assert_eq!(order.locked_at, locked_at);
    }

    #[test]
    fn test_non_collector_rejected() {
        let mut order = open_order();
        let now = order.created_at;
        let err = apply_transition(&mut order, Transition::Lock, "someone-else", now).unwrap_err();
        assert!(matches!(err, LifecycleError::NotCollector { .. }));
        assert_eq!(order.status, OrderStatus::Open);
    }

    #[test]
    fn test_only_open_accepts_items() {
        let mut order = open_order();
        assert!(is_accepting_items(&order));
        let now = order.created_at;
        apply_transition(&mut order, Transition::Lock, "collector", now).unwrap();
        assert!(!is_accepting_items(&order));
    }

    #[test]
    fn test_transition_metadata() {
        assert_eq!(Transition::MarkOrdered.from_status(), OrderStatus::Locked);
        assert_eq!(Transition::MarkOrdered.to_status(), OrderStatus::Ordered);
        assert_eq!(Transition::Close.audit_action(), AuditAction::Closed);
        assert_eq!(Transition::Lock.to_string(), "lock");
    }
}
