// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use brighteat::api::{CreateOrderRequest, FeeSource};
use brighteat::domain::types::FeeSplitRule;
use brighteat::FeeBundle;

// ==========================================
// CreateOrderRequest 构建器
// ==========================================

pub struct OrderRequestBuilder {
    restaurant_id: String,
    collector_id: String,
    fees: FeeSource,
    rule: Option<FeeSplitRule>,
    is_private: bool,
    assigned: Vec<String>,
    cutoff_time: Option<NaiveDateTime>,
}

impl OrderRequestBuilder {
    pub fn new(restaurant_id: &str, collector_id: &str) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            collector_id: collector_id.to_string(),
            fees: FeeSource::Explicit(FeeBundle::default()),
            rule: None,
            is_private: false,
            assigned: Vec::new(),
            cutoff_time: None,
        }
    }

    pub fn fees(mut self, delivery_fee: &str, tip: &str, service_fee: &str) -> Self {
        self.fees = FeeSource::Explicit(FeeBundle::new(
            dec(delivery_fee),
            dec(tip),
            dec(service_fee),
        ));
        self
    }

    pub fn preset(mut self, preset_id: &str) -> Self {
        self.fees = FeeSource::Preset(preset_id.to_string());
        self
    }

    pub fn rule(mut self, rule: FeeSplitRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn private_for(mut self, user_ids: &[&str]) -> Self {
        self.is_private = true;
        self.assigned = user_ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn cutoff(mut self, cutoff: NaiveDateTime) -> Self {
        self.cutoff_time = Some(cutoff);
        self
    }

    pub fn build(self) -> CreateOrderRequest {
        let mut req = CreateOrderRequest::new(&self.restaurant_id, &self.collector_id, self.fees);
        req.fee_split_rule = self.rule;
        req.is_private = self.is_private;
        req.assigned_user_ids = self.assigned;
        req.cutoff_time = self.cutoff_time;
        req
    }
}

/// 解析金额字面量
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("非法金额字面量")
}
