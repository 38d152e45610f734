use super::*;
use crate::engine::cost_split::{compute_shares, ShareBreakdown, SplitError};

impl OrderApi {
    // ==========================================
    // 分摊与付款台账
    // ==========================================

    /// 按拼单规则计算分摊
    ///
    /// WEIGHTED 基数为零时回退为 EQUAL,返回回退说明
    pub(super) fn compute_breakdown(
        order: &CollectionOrder,
        items: &[OrderItem],
    ) -> ApiResult<(ShareBreakdown, Option<String>)> {
        match compute_shares(order, items, order.fee_split_rule) {
            Ok(breakdown) => Ok((breakdown, None)),
            Err(SplitError::ZeroBasis) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    "加权分摊基数为零，回退为平均分摊"
                );
                let breakdown = compute_shares(order, items, FeeSplitRule::Equal)?;
                Ok((
                    breakdown,
                    Some("WEIGHTED basis is zero, fell back to EQUAL".to_string()),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 将分摊结果写入付款台账
    ///
    /// 按 (order, user) 原地覆盖; 金额不变的记录保留付款状态;
    /// 不再参与的用户记录被删除
    pub(super) fn sync_payments_tx(
        conn: &Connection,
        order: &CollectionOrder,
        breakdown: &ShareBreakdown,
        now: NaiveDateTime,
    ) -> ApiResult<Vec<Payment>> {
        let existing = PaymentRepository::list_by_order_tx(conn, &order.order_id)?;

        for share in &breakdown.shares {
            let payment = match existing.iter().find(|p| p.user_id == share.user_id) {
                Some(current) => {
                    let mut payment = current.clone();
                    payment.user_name = share.user_name.clone();
                    payment.apply_share(share.item_subtotal, share.fee_share, now);
                    payment
                }
                None => {
                    let mut payment = Payment::new(
                        &order.order_id,
                        &share.user_id,
                        &share.user_name,
                        share.item_subtotal,
                        share.fee_share,
                    );
                    payment.created_at = now;
                    payment.updated_at = now;
                    payment
                }
            };
            PaymentRepository::upsert_tx(conn, &payment)?;
        }

        let participant_ids: Vec<String> =
            breakdown.shares.iter().map(|s| s.user_id.clone()).collect();
        let removed = PaymentRepository::delete_stale_tx(conn, &order.order_id, &participant_ids)?;
        if removed > 0 {
            tracing::warn!(
                order_id = %order.order_id,
                removed = removed,
                "已删除不再参与的付款记录"
            );
        }

        Ok(PaymentRepository::list_by_order_tx(conn, &order.order_id)?)
    }

    /// 重算分摊（LOCKED / ORDERED,仅发起人）
    ///
    /// # 返回
    /// - Ok(Vec<Payment>): 重算后的付款台账
    pub fn recompute_shares(&self, order_id: &str, actor_id: &str) -> ApiResult<Vec<Payment>> {
        let payments = self.with_immediate_tx(|tx| {
            let order = Self::load_order_tx(tx, order_id)?;
            if !matches!(order.status, OrderStatus::Locked | OrderStatus::Ordered) {
                return Err(ApiError::InvalidTransition {
                    current: order.status,
                    requested: "recompute_shares".to_string(),
                });
            }
            Self::ensure_collector(&order, actor_id)?;
            let actor = Self::load_user_tx(tx, actor_id)?;

            let items = OrderRepository::list_items_tx(tx, order_id)?;
            let (breakdown, fallback) = Self::compute_breakdown(&order, &items)?;
            let payments = Self::sync_payments_tx(tx, &order, &breakdown, Self::now())?;

            let mut detail = format!(
                "{} participants, total {}",
                breakdown.shares.len(),
                breakdown.total_amount()
            );
            if let Some(note) = fallback {
                detail = format!("{}; {}", detail, note);
            }
            Self::audit_tx(
                tx,
                AuditLog::new(order_id, AuditAction::SharesRecomputed, actor_id, &actor.username)
                    .with_payload(&breakdown.shares)
                    .with_detail(detail),
            )?;
            Ok(payments)
        })?;

        tracing::info!(order_id = order_id, payments = payments.len(), "分摊已重算");
        Ok(payments)
    }

    /// 确认付款（发起人或付款人本人）
    ///
    /// 已付款时原样返回,不重复写日志
    pub fn mark_paid(&self, payment_id: &str, actor_id: &str) -> ApiResult<Payment> {
        let payment = self.with_immediate_tx(|tx| {
            let mut payment = PaymentRepository::find_by_id_tx(tx, payment_id)?
                .ok_or_else(|| ApiError::not_found("Payment", payment_id))?;
            let order = Self::load_order_tx(tx, &payment.order_id)?;
            if payment.user_id != actor_id {
                Self::ensure_collector(&order, actor_id)?;
            }
            let actor = Self::load_user_tx(tx, actor_id)?;

            if !payment.mark_paid(Self::now()) {
                return Ok(payment);
            }
            PaymentRepository::update_paid_tx(tx, &payment)?;
            Self::audit_tx(
                tx,
                AuditLog::new(&order.order_id, AuditAction::PaymentMarkedPaid, actor_id, &actor.username)
                    .with_payload(&serde_json::json!({
                        "payment_id": payment.payment_id,
                        "user_id": payment.user_id,
                        "amount": payment.amount,
                    }))
                    .with_detail(format!("{} paid {}", payment.user_name, payment.amount)),
            )?;
            Ok(payment)
        })?;

        tracing::info!(
            payment_id = payment_id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            "付款已确认"
        );
        Ok(payment)
    }

    /// 拼单付款台账
    pub fn list_payments(&self, order_id: &str) -> ApiResult<Vec<Payment>> {
        Ok(self.payment_repo.list_by_order(order_id)?)
    }

    /// 用户的全部付款记录
    pub fn list_user_payments(&self, user_id: &str) -> ApiResult<Vec<Payment>> {
        Ok(self.payment_repo.list_by_user(user_id)?)
    }
}
