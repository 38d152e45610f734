// ==========================================
// BrightEat 团餐拼单系统 - 拼单 API
// ==========================================
// 职责: 拼单创建、加菜、状态推进、分摊与付款台账
// 红线: 每个写操作一个 BEGIN IMMEDIATE 事务,审计日志与业务写入同事务提交
// 红线: 状态在写明细的同一事务内重新读取
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::domain::fee_preset::FeeBundle;
use crate::domain::order::{CollectionOrder, OrderItem};
use crate::domain::payment::Payment;
use crate::domain::types::{FeeSplitRule, OrderStatus};
use crate::domain::user::{User, UserBrief};
use crate::engine::lifecycle;
use crate::repository::{
    AuditLogRepository, CatalogRepository, FeePresetRepository, OrderRepository,
    PaymentRepository, UserRepository,
};

mod creation;
mod items;
mod transitions;
mod payments;
mod queries;


// ==========================================
// 请求/响应类型
// ==========================================

/// 拼单费用来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeSource {
    /// 引用费用预设（创建时复制数值）
    Preset(String),
    /// 直接给出费用
    Explicit(FeeBundle),
}

/// 创建拼单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    pub collector_id: String,
    pub fees: FeeSource,
    pub fee_split_rule: Option<FeeSplitRule>,
    pub is_private: bool,
    pub assigned_user_ids: Vec<String>,
    pub cutoff_time: Option<NaiveDateTime>,
    pub instapay_link: Option<String>,
}

impl CreateOrderRequest {
    pub fn new(restaurant_id: &str, collector_id: &str, fees: FeeSource) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            collector_id: collector_id.to_string(),
            fees,
            fee_split_rule: None,
            is_private: false,
            assigned_user_ids: Vec::new(),
            cutoff_time: None,
            instapay_link: None,
        }
    }
}

/// 拼单汇总视图
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order: CollectionOrder,
    pub restaurant_name: String,
    pub items: Vec<OrderItem>,
    pub participants: Vec<UserBrief>,
    pub assigned_users: Vec<UserBrief>,
    pub payments: Vec<Payment>,
    pub total_items_cost: Decimal,
    pub total_cost: Decimal,
    pub share_message: String,
    pub join_url: String,
}

// ==========================================
// OrderApi - 拼单 API
// ==========================================

/// 拼单API
///
/// 职责：
/// 1. 拼单创建与指派成员维护
/// 2. 加菜/删菜（仅 OPEN）
/// 3. 状态推进 lock / mark_ordered / close
/// 4. 费用分摊与付款台账
pub struct OrderApi {
    conn: Arc<Mutex<Connection>>,
    order_repo: Arc<OrderRepository>,
    user_repo: Arc<UserRepository>,
    catalog_repo: Arc<CatalogRepository>,
    fee_preset_repo: Arc<FeePresetRepository>,
    payment_repo: Arc<PaymentRepository>,
    audit_log_repo: Arc<AuditLogRepository>,
    config_manager: Arc<ConfigManager>,
}

impl OrderApi {
    /// 创建新的OrderApi实例
    ///
    /// `conn` 须与各仓储共享同一连接
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        order_repo: Arc<OrderRepository>,
        user_repo: Arc<UserRepository>,
        catalog_repo: Arc<CatalogRepository>,
        fee_preset_repo: Arc<FeePresetRepository>,
        payment_repo: Arc<PaymentRepository>,
        audit_log_repo: Arc<AuditLogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            order_repo,
            user_repo,
            catalog_repo,
            fee_preset_repo,
            payment_repo,
            audit_log_repo,
            config_manager,
        }
    }

    /// 在 BEGIN IMMEDIATE 事务内执行
    ///
    /// 闭包返回错误时事务随 drop 回滚
    ///
    /// 注意: 闭包内只能调用仓储的 `*_tx` 函数,不能再经 ConfigManager 或仓储便捷方法加锁
    fn with_immediate_tx<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> ApiResult<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseError(format!("锁获取失败: {}", e)))?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// 事务内加载拼单
    fn load_order_tx(conn: &Connection, order_id: &str) -> ApiResult<CollectionOrder> {
        OrderRepository::find_by_id_tx(conn, order_id)?
            .ok_or_else(|| ApiError::not_found("CollectionOrder", order_id))
    }

    /// 事务内加载用户
    fn load_user_tx(conn: &Connection, user_id: &str) -> ApiResult<User> {
        UserRepository::find_by_id_tx(conn, user_id)?
            .ok_or_else(|| ApiError::not_found("User", user_id))
    }

    /// 事务内写审计日志
    fn audit_tx(conn: &Connection, log: AuditLog) -> ApiResult<String> {
        Ok(AuditLogRepository::insert_tx(conn, &log)?)
    }

    /// 配置读取错误统一转换
    fn config_err(e: Box<dyn std::error::Error>) -> ApiError {
        ApiError::InternalError(format!("配置读取失败: {}", e))
    }

    fn now() -> NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    fn require_not_blank(value: &str, field: &str) -> ApiResult<()> {
        if value.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
        }
        Ok(())
    }

    fn ensure_accepting_items(order: &CollectionOrder) -> ApiResult<()> {
        if !lifecycle::is_accepting_items(order) {
            return Err(ApiError::OrderLocked {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }
        Ok(())
    }

    fn ensure_collector(order: &CollectionOrder, actor_id: &str) -> ApiResult<()> {
        if !order.is_collector(actor_id) {
            return Err(ApiError::NotCollector {
                order_id: order.order_id.clone(),
                actor_id: actor_id.to_string(),
            });
        }
        Ok(())
    }
}
