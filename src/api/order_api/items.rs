use super::*;
use crate::domain::order::ItemSpec;
use crate::engine::item_spec::{resolve_catalog, resolve_custom, ItemRequest, ItemSpecError};

impl OrderApi {
    // ==========================================
    // 加菜 / 删菜
    // ==========================================

    /// 加菜
    ///
    /// # 参数
    /// - order_id: 拼单ID
    /// - user_id: 参与人ID
    /// - req: 原始加菜请求（菜单菜品或自定义菜品二选一）
    ///
    /// # 返回
    /// - Ok(OrderItem): 新明细（名称与单价已快照）
    /// - Err(ApiError::OrderLocked): 拼单不在 OPEN 状态
    /// - Err(ApiError::NotAssigned): 私有拼单且用户未被指派
    /// - Err(ApiError::InvalidItemSpec): 请求形态或菜品不合法
    /// - Err(ApiError::NotFound): 拼单/用户/菜品不存在
    ///
    /// # 并发
    /// 状态在插入明细的同一 IMMEDIATE 事务内读取,与 lock() 串行化
    pub fn add_item(&self, order_id: &str, user_id: &str, req: ItemRequest) -> ApiResult<OrderItem> {
        let item = self.with_immediate_tx(|tx| {
            let order = Self::load_order_tx(tx, order_id)?;
            Self::ensure_accepting_items(&order)?;

            let user = Self::load_user_tx(tx, user_id)?;
            if !order.may_contribute(user_id) {
                return Err(ApiError::NotAssigned {
                    order_id: order_id.to_string(),
                    user_id: user_id.to_string(),
                });
            }

            let (spec, quantity) = req.into_spec()?;
            let resolved = match spec {
                ItemSpec::CatalogItem { menu_item_id } => {
                    let menu_item = CatalogRepository::find_menu_item_tx(tx, &menu_item_id)?
                        .ok_or_else(|| ApiError::not_found("MenuItem", &menu_item_id))?;
                    resolve_catalog(&menu_item, &order.restaurant_id, quantity)?
                }
                ItemSpec::CustomItem { name, price } => resolve_custom(name, price, quantity),
            };

            let item = OrderItem::new(
                order_id,
                &user.user_id,
                &user.username,
                resolved.source,
                resolved.item_name,
                resolved.quantity,
                resolved.unit_price,
            )
            .ok_or(ItemSpecError::AmountOverflow {
                quantity: resolved.quantity,
                unit_price: resolved.unit_price,
            })?;
            OrderRepository::insert_item_tx(tx, &item)?;

            Self::audit_tx(
                tx,
                AuditLog::new(order_id, AuditAction::ItemAdded, &user.user_id, &user.username)
                    .with_payload(&item)
                    .with_detail(format!(
                        "{} x{} @ {}",
                        item.item_name, item.quantity, item.unit_price
                    )),
            )?;
            Ok(item)
        });

        match &item {
            Ok(item) => tracing::info!(
                order_id = order_id,
                item_id = %item.item_id,
                user = %item.user_name,
                total = %item.total_price,
                "明细已添加"
            ),
            Err(e) => tracing::warn!(
                order_id = order_id,
                user_id = user_id,
                code = e.code(),
                error = %e,
                "加菜被拒绝"
            ),
        }
        item
    }

    /// 删除明细（仅 OPEN; 明细所有人或发起人）
    ///
    /// # 返回
    /// - Ok(OrderItem): 被删除的明细
    /// - Err(ApiError::OrderLocked): 拼单不在 OPEN 状态
    /// - Err(ApiError::NotCollector): 删除他人明细但不是发起人
    pub fn remove_item(&self, order_id: &str, item_id: &str, actor_id: &str) -> ApiResult<OrderItem> {
        let removed = self.with_immediate_tx(|tx| {
            let order = Self::load_order_tx(tx, order_id)?;
            Self::ensure_accepting_items(&order)?;

            let item = OrderRepository::find_item_tx(tx, item_id)?
                .filter(|item| item.order_id == order_id)
                .ok_or_else(|| ApiError::not_found("OrderItem", item_id))?;
            if item.user_id != actor_id {
                Self::ensure_collector(&order, actor_id)?;
            }
            let actor = Self::load_user_tx(tx, actor_id)?;

            OrderRepository::delete_item_tx(tx, item_id)?;
            Self::audit_tx(
                tx,
                AuditLog::new(order_id, AuditAction::ItemRemoved, actor_id, &actor.username)
                    .with_payload(&item)
                    .with_detail(format!("删除 {} ({})", item.item_name, item.user_name)),
            )?;
            Ok(item)
        })?;

        tracing::info!(order_id = order_id, item_id = item_id, "明细已删除");
        Ok(removed)
    }
}
