use super::*;
use crate::engine::lifecycle::{apply_transition, check_transition, Transition};

impl OrderApi {
    // ==========================================
    // 状态推进接口
    // ==========================================

    /// 锁单: OPEN → LOCKED（仅发起人）
    pub fn lock(&self, order_id: &str, actor_id: &str) -> ApiResult<CollectionOrder> {
        self.run_transition(order_id, actor_id, Transition::Lock)
    }

    /// 下单: LOCKED → ORDERED（仅发起人）
    ///
    /// 计算分摊并为每个参与人写入付款记录
    ///
    /// # 错误
    /// - NoParticipants: 无任何明细,拼单保持 LOCKED
    /// - WEIGHTED 基数为零时回退为 EQUAL,并记入审计详情
    pub fn mark_ordered(&self, order_id: &str, actor_id: &str) -> ApiResult<CollectionOrder> {
        self.run_transition(order_id, actor_id, Transition::MarkOrdered)
    }

    /// 结单: ORDERED → CLOSED（仅发起人）
    ///
    /// 配置 close_requires_all_paid=true 时,存在未付款记录则拒绝
    pub fn close(&self, order_id: &str, actor_id: &str) -> ApiResult<CollectionOrder> {
        self.run_transition(order_id, actor_id, Transition::Close)
    }

    /// 执行一次状态转换
    ///
    /// 校验、状态写回、付款台账与审计日志在同一事务内完成
    fn run_transition(
        &self,
        order_id: &str,
        actor_id: &str,
        transition: Transition,
    ) -> ApiResult<CollectionOrder> {
        let require_all_paid = match transition {
            Transition::Close => self
                .config_manager
                .get_close_requires_all_paid()
                .map_err(Self::config_err)?,
            _ => false,
        };

        let result = self.with_immediate_tx(|tx| {
            let mut order = Self::load_order_tx(tx, order_id)?;
            let from = order.status;
            check_transition(&order, transition, actor_id)?;
            let actor = Self::load_user_tx(tx, actor_id)?;

            let mut payload = serde_json::json!({
                "from": from,
                "to": transition.to_status(),
            });
            let mut detail = format!("{}: {} -> {}", transition, from, transition.to_status());

            // 下单前先完成分摊计算,失败时不推进状态
            let breakdown = match transition {
                Transition::MarkOrdered => {
                    let items = OrderRepository::list_items_tx(tx, order_id)?;
                    let (breakdown, fallback) = Self::compute_breakdown(&order, &items)?;
                    payload["rule"] = serde_json::json!(breakdown.rule);
                    payload["total_fee"] = serde_json::json!(breakdown.total_fee);
                    payload["total_items_cost"] = serde_json::json!(breakdown.total_items_cost);
                    payload["participants"] = serde_json::json!(breakdown.shares.len());
                    if let Some(note) = fallback {
                        detail = format!("{}; {}", detail, note);
                    }
                    Some(breakdown)
                }
                Transition::Close if require_all_paid => {
                    let unpaid = PaymentRepository::count_unpaid_tx(tx, order_id)?;
                    if unpaid > 0 {
                        return Err(ApiError::PaymentsOutstanding {
                            order_id: order_id.to_string(),
                            unpaid,
                        });
                    }
                    None
                }
                _ => None,
            };

            let ts = apply_transition(&mut order, transition, actor_id, Self::now())?;
            let rows = OrderRepository::update_status_tx(tx, &order, from)?;
            if rows == 0 {
                // 状态已被并发修改
                let current = Self::load_order_tx(tx, order_id)?.status;
                return Err(ApiError::InvalidTransition {
                    current,
                    requested: transition.name().to_string(),
                });
            }

            if let Some(breakdown) = &breakdown {
                Self::sync_payments_tx(tx, &order, breakdown, ts)?;
            }

            Self::audit_tx(
                tx,
                AuditLog::new(order_id, transition.audit_action(), actor_id, &actor.username)
                    .at(ts)
                    .with_payload(&payload)
                    .with_detail(detail),
            )?;
            Ok(order)
        });

        match &result {
            Ok(order) => tracing::info!(
                order_id = order_id,
                transition = transition.name(),
                status = %order.status,
                "拼单状态已推进"
            ),
            Err(e) => tracing::warn!(
                order_id = order_id,
                transition = transition.name(),
                actor_id = actor_id,
                code = e.code(),
                error = %e,
                "状态转换被拒绝"
            ),
        }
        result
    }
}
