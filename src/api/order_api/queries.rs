use super::*;
use crate::engine::cost_split::{participants, total_cost, total_items_cost};
use crate::engine::{join_code, share_message};

impl OrderApi {
    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询拼单
    pub fn get_order(&self, order_id: &str) -> ApiResult<CollectionOrder> {
        self.order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::not_found("CollectionOrder", order_id))
    }

    /// 按拼单码查找（忽略大小写与首尾空白）
    pub fn find_by_code(&self, code: &str) -> ApiResult<CollectionOrder> {
        let code = join_code::normalize(code);
        Self::require_not_blank(&code, "拼单码")?;
        self.order_repo
            .find_by_code(&code)?
            .ok_or_else(|| ApiError::NotFound(format!("拼单码{}不存在", code)))
    }

    /// 拼单列表（最近创建在前,可按状态过滤）
    pub fn list_orders(&self, status: Option<OrderStatus>) -> ApiResult<Vec<CollectionOrder>> {
        Ok(self.order_repo.list(status)?)
    }

    /// 拼单明细（加入顺序）
    pub fn list_items(&self, order_id: &str) -> ApiResult<Vec<OrderItem>> {
        self.get_order(order_id)?;
        Ok(self.order_repo.list_items(order_id)?)
    }

    /// 参与人列表
    ///
    /// 至少有一条明细的用户,按首次加菜顺序去重
    pub fn get_participants(&self, order_id: &str) -> ApiResult<Vec<UserBrief>> {
        let items = self.list_items(order_id)?;
        self.participant_briefs(&items)
    }

    fn participant_briefs(&self, items: &[OrderItem]) -> ApiResult<Vec<UserBrief>> {
        let mut briefs = Vec::new();
        for p in participants(items)? {
            let brief = match self.user_repo.find_by_id(&p.user_id)? {
                Some(user) => UserBrief::from(&user),
                None => UserBrief {
                    user_id: p.user_id,
                    username: p.user_name,
                    email: None,
                },
            };
            briefs.push(brief);
        }
        Ok(briefs)
    }

    /// 拼单汇总（明细、参与人、付款台账、总额与分享文案）
    ///
    /// 文案语言取配置 locale
    pub fn get_summary(&self, order_id: &str) -> ApiResult<OrderSummary> {
        let frontend_url = self
            .config_manager
            .get_frontend_url()
            .map_err(Self::config_err)?;
        let locale = self.config_manager.get_locale().map_err(Self::config_err)?;

        let order = self.get_order(order_id)?;
        let restaurant_name = self
            .catalog_repo
            .find_restaurant(&order.restaurant_id)?
            .map(|r| r.name)
            .ok_or_else(|| ApiError::not_found("Restaurant", &order.restaurant_id))?;
        let items = self.order_repo.list_items(order_id)?;
        let participants = self.participant_briefs(&items)?;

        let mut assigned_users = Vec::with_capacity(order.assigned_user_ids.len());
        for id in &order.assigned_user_ids {
            if let Some(user) = self.user_repo.find_by_id(id)? {
                assigned_users.push(UserBrief::from(&user));
            }
        }
        let assigned_usernames: Vec<String> =
            assigned_users.iter().map(|u| u.username.clone()).collect();

        let ctx = share_message::ShareContext {
            restaurant_name: &restaurant_name,
            code: &order.code,
            cutoff_time: order.cutoff_time,
            collector_name: &order.collector_name,
            assigned_usernames: &assigned_usernames,
            frontend_url: frontend_url.as_deref(),
        };
        let share_message = share_message::build(&ctx, &locale);
        let join_url = share_message::join_url(frontend_url.as_deref(), &order.code);

        let payments = self.payment_repo.list_by_order(order_id)?;

        Ok(OrderSummary {
            total_items_cost: total_items_cost(&items)?,
            total_cost: total_cost(&order, &items)?,
            order,
            restaurant_name,
            items,
            participants,
            assigned_users,
            payments,
            share_message,
            join_url,
        })
    }

    /// 拼单审计日志（时间顺序）
    pub fn list_audit_logs(&self, order_id: &str) -> ApiResult<Vec<AuditLog>> {
        Ok(self.audit_log_repo.find_by_order_id(order_id)?)
    }
}
