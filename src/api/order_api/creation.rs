use super::*;
use crate::engine::join_code;
use crate::engine::money::validate_amount;

/// 拼单码生成最大尝试次数
const MAX_CODE_ATTEMPTS: usize = 32;

impl OrderApi {
    // ==========================================
    // 拼单创建
    // ==========================================

    /// 创建拼单
    ///
    /// # 参数
    /// - req: 创建请求（餐厅、发起人、费用来源、可见性、指派成员）
    ///
    /// # 返回
    /// - Ok(CollectionOrder): 新拼单（状态 OPEN）
    /// - Err(ApiError::NotFound): 餐厅/发起人/费用预设/指派成员不存在
    /// - Err(ApiError::InvalidInput): 费用为负或精度超限
    pub fn create_order(&self, req: CreateOrderRequest) -> ApiResult<CollectionOrder> {
        Self::require_not_blank(&req.restaurant_id, "餐厅ID")?;
        Self::require_not_blank(&req.collector_id, "发起人ID")?;

        // 费用来源解析为数值副本
        let fees = match &req.fees {
            FeeSource::Preset(preset_id) => {
                self.fee_preset_repo
                    .find_by_id(preset_id)?
                    .ok_or_else(|| ApiError::not_found("FeePreset", preset_id))?
                    .fees
            }
            FeeSource::Explicit(bundle) => *bundle,
        };
        for (field, value) in [
            ("delivery_fee", fees.delivery_fee),
            ("tip", fees.tip),
            ("service_fee", fees.service_fee),
        ] {
            validate_amount(field, value).map_err(ApiError::InvalidInput)?;
        }

        // 配置须在事务外读取（共享同一连接锁）
        let fee_split_rule = match req.fee_split_rule {
            Some(rule) => rule,
            None => self
                .config_manager
                .get_default_fee_split_rule()
                .map_err(Self::config_err)?,
        };
        let code_length = self
            .config_manager
            .get_join_code_length()
            .map_err(Self::config_err)?;

        let mut assigned_user_ids: Vec<String> = Vec::with_capacity(req.assigned_user_ids.len());
        for id in &req.assigned_user_ids {
            if !assigned_user_ids.contains(id) {
                assigned_user_ids.push(id.clone());
            }
        }

        let order = self.with_immediate_tx(|tx| {
            CatalogRepository::find_restaurant_tx(tx, &req.restaurant_id)?
                .ok_or_else(|| ApiError::not_found("Restaurant", &req.restaurant_id))?;
            let collector = Self::load_user_tx(tx, &req.collector_id)?;
            for id in &assigned_user_ids {
                Self::load_user_tx(tx, id)?;
            }

            let code = Self::unique_code_tx(tx, code_length)?;
            let instapay_link = req
                .instapay_link
                .clone()
                .filter(|s| !s.trim().is_empty())
                .or_else(|| collector.instapay_link.clone());

            let order = CollectionOrder {
                order_id: uuid::Uuid::new_v4().to_string(),
                code,
                restaurant_id: req.restaurant_id.clone(),
                collector_id: Some(collector.user_id.clone()),
                collector_name: collector.username.clone(),
                status: OrderStatus::Open,
                cutoff_time: req.cutoff_time,
                instapay_link,
                is_private: req.is_private,
                assigned_user_ids: assigned_user_ids.clone(),
                fees,
                fee_split_rule,
                created_at: Self::now(),
                locked_at: None,
                ordered_at: None,
                closed_at: None,
            };
            OrderRepository::insert_tx(tx, &order)?;

            let payload = serde_json::json!({
                "code": order.code,
                "restaurant_id": order.restaurant_id,
                "fees": order.fees,
                "fee_split_rule": order.fee_split_rule,
                "is_private": order.is_private,
                "assigned_user_ids": order.assigned_user_ids,
            });
            Self::audit_tx(
                tx,
                AuditLog::new(
                    &order.order_id,
                    AuditAction::OrderCreated,
                    &collector.user_id,
                    &collector.username,
                )
                .at(order.created_at)
                .with_payload(&payload)
                .with_detail(format!("创建拼单 {}", order.code)),
            )?;
            Ok(order)
        })?;

        tracing::info!(
            order_id = %order.order_id,
            code = %order.code,
            collector = %order.collector_name,
            rule = %order.fee_split_rule,
            "拼单已创建"
        );
        Ok(order)
    }

    /// 生成未被占用的拼单码
    fn unique_code_tx(conn: &Connection, length: usize) -> ApiResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = join_code::generate(length);
            if !OrderRepository::code_exists_tx(conn, &code)? {
                return Ok(code);
            }
        }
        Err(ApiError::InternalError(format!(
            "拼单码生成失败: 连续{}次冲突",
            MAX_CODE_ATTEMPTS
        )))
    }

    // ==========================================
    // 指派成员
    // ==========================================

    /// 替换指派成员（仅发起人,仅 OPEN）
    ///
    /// # 返回
    /// - Ok(CollectionOrder): 更新后的拼单
    pub fn update_assigned_users(
        &self,
        order_id: &str,
        actor_id: &str,
        user_ids: Vec<String>,
    ) -> ApiResult<CollectionOrder> {
        let mut unique_ids: Vec<String> = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            if !unique_ids.contains(&id) {
                unique_ids.push(id);
            }
        }

        let order = self.with_immediate_tx(|tx| {
            let mut order = Self::load_order_tx(tx, order_id)?;
            Self::ensure_accepting_items(&order)?;
            Self::ensure_collector(&order, actor_id)?;
            let actor = Self::load_user_tx(tx, actor_id)?;
            for id in &unique_ids {
                Self::load_user_tx(tx, id)?;
            }

            let previous = std::mem::replace(&mut order.assigned_user_ids, unique_ids.clone());
            OrderRepository::replace_assigned_users_tx(tx, order_id, &order.assigned_user_ids)?;

            Self::audit_tx(
                tx,
                AuditLog::new(order_id, AuditAction::AssignedUsersUpdated, actor_id, &actor.username)
                    .with_payload(&serde_json::json!({
                        "before": previous,
                        "after": order.assigned_user_ids,
                    }))
                    .with_detail(format!("指派成员 {} 人", order.assigned_user_ids.len())),
            )?;
            Ok(order)
        })?;

        tracing::info!(
            order_id = %order.order_id,
            assigned = order.assigned_user_ids.len(),
            "指派成员已更新"
        );
        Ok(order)
    }
}
