// ==========================================
// BrightEat 团餐拼单系统 - 付款台账领域模型
// ==========================================
// 职责: 每个参与人在拼单中的应付金额与付款状态
// 红线: (order_id, user_id) 唯一; 重算时原地覆盖
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Payment - 付款记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub order_id: String,
    pub user_id: String,
    pub user_name: String,         // 用户名快照
    pub item_subtotal: Decimal,    // 菜品小计
    pub fee_share: Decimal,        // 分摊费用
    pub amount: Decimal,           // 应付 = 小计 + 分摊
    pub is_paid: bool,
    pub paid_at: Option<NaiveDateTime>, // 仅在 is_paid 变为 true 时设置
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Payment {
    /// 新建未付款记录
    pub fn new(
        order_id: &str,
        user_id: &str,
        user_name: &str,
        item_subtotal: Decimal,
        fee_share: Decimal,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            payment_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            item_subtotal,
            fee_share,
            amount: item_subtotal + fee_share,
            is_paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 用新的分摊结果覆盖本记录
    ///
    /// 金额不变时保留付款状态; 金额变化时重置为未付款
    pub fn apply_share(&mut self, item_subtotal: Decimal, fee_share: Decimal, now: NaiveDateTime) {
        let amount = item_subtotal + fee_share;
        if amount != self.amount {
            self.is_paid = false;
            self.paid_at = None;
        }
        self.item_subtotal = item_subtotal;
        self.fee_share = fee_share;
        self.amount = amount;
        self.updated_at = now;
    }

    /// 标记为已付款（已付款时不变,返回 false）
    pub fn mark_paid(&mut self, now: NaiveDateTime) -> bool {
        if self.is_paid {
            return false;
        }
        self.is_paid = true;
        self.paid_at = Some(now);
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_mark_paid_sets_timestamp_once() {
        let mut p = Payment::new("o1", "u1", "alice", d("45.00"), d("20.00"));
        assert_eq!(p.amount, d("65.00"));

        let t1 = chrono::Utc::now().naive_utc();
        assert!(p.mark_paid(t1));
        assert_eq!(p.paid_at, Some(t1));

        let t2 = t1 + chrono::Duration::seconds(5);
        assert!(!p.mark_paid(t2));
        assert_eq!(p.paid_at, Some(t1));
    }

    #[test]
    fn test_apply_share_resets_paid_only_on_change() {
        let now = chrono::Utc::now().naive_utc();
        let mut p = Payment::new("o1", "u1", "alice", d("45.00"), d("20.00"));
        p.mark_paid(now);

        p.apply_share(d("45.00"), d("20.00"), now);
        assert!(p.is_paid);

        p.apply_share(d("45.00"), d("15.00"), now);
        assert!(!p.is_paid);
        assert_eq!(p.paid_at, None);
        assert_eq!(p.amount, d("60.00"));
    }
}
