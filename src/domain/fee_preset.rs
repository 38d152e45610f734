// ==========================================
// BrightEat 团餐拼单系统 - 费用预设领域模型
// ==========================================
// 职责: 配送费 / 小费 / 服务费 组合
// 红线: 创建拼单时复制数值,不保留引用
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// FeeBundle - 费用组合
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FeeBundle {
    pub delivery_fee: Decimal,
    pub tip: Decimal,
    pub service_fee: Decimal,
}

impl FeeBundle {
    pub fn new(delivery_fee: Decimal, tip: Decimal, service_fee: Decimal) -> Self {
        Self {
            delivery_fee,
            tip,
            service_fee,
        }
    }

    /// 共享费用合计
    pub fn total(&self) -> Decimal {
        self.delivery_fee + self.tip + self.service_fee
    }

    /// 共享费用合计,溢出时返回 None
    pub fn checked_total(&self) -> Option<Decimal> {
        self.delivery_fee
            .checked_add(self.tip)?
            .checked_add(self.service_fee)
    }

    /// 返回第一个为负的费用字段名
    pub fn first_negative_field(&self) -> Option<&'static str> {
        [
            ("delivery_fee", self.delivery_fee),
            ("tip", self.tip),
            ("service_fee", self.service_fee),
        ]
        .into_iter()
        .find(|(_, v)| *v < Decimal::ZERO)
        .map(|(name, _)| name)
    }
}

// ==========================================
// FeePreset - 费用预设
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePreset {
    pub preset_id: String,
    pub name: String, // 唯一
    pub fees: FeeBundle,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_total() {
        let fees = FeeBundle::new(d("30.00"), d("10.00"), d("0"));
        assert_eq!(fees.total(), d("40.00"));
        assert_eq!(fees.first_negative_field(), None);
    }

    #[test]
    fn test_negative_field_detected() {
        let fees = FeeBundle::new(d("5"), d("-1"), d("0"));
        assert_eq!(fees.first_negative_field(), Some("tip"));
    }
}
