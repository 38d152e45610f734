// ==========================================
// BrightEat 团餐拼单系统 - 菜单目录 API
// ==========================================
// 职责: 餐厅、菜单、菜品维护,以及用户推荐
// 红线: 菜品调价/下架/删除不影响已加入拼单的明细快照
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::{Menu, MenuItem, Restaurant};
use crate::domain::recommendation::Recommendation;
use crate::domain::types::UserRole;
use crate::engine::money::validate_amount;
use crate::repository::{CatalogRepository, RecommendationRepository, UserRepository};

// ==========================================
// CatalogApi - 菜单目录 API
// ==========================================
pub struct CatalogApi {
    catalog_repo: Arc<CatalogRepository>,
    recommendation_repo: Arc<RecommendationRepository>,
    user_repo: Arc<UserRepository>,
}

impl CatalogApi {
    pub fn new(
        catalog_repo: Arc<CatalogRepository>,
        recommendation_repo: Arc<RecommendationRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            catalog_repo,
            recommendation_repo,
            user_repo,
        }
    }

    fn now() -> chrono::NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    fn require_name(name: &str, field: &str) -> ApiResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
        }
        Ok(name.to_string())
    }

    // ==========================================
    // 餐厅
    // ==========================================

    /// 创建餐厅（名称唯一）
    pub fn create_restaurant(
        &self,
        name: &str,
        description: &str,
        created_by: Option<&str>,
    ) -> ApiResult<Restaurant> {
        let restaurant = Restaurant {
            restaurant_id: uuid::Uuid::new_v4().to_string(),
            name: Self::require_name(name, "餐厅名称")?,
            description: description.trim().to_string(),
            created_by: created_by.map(str::to_string),
            created_at: Self::now(),
        };
        self.catalog_repo.insert_restaurant(&restaurant)?;
        tracing::info!(restaurant_id = %restaurant.restaurant_id, name = %restaurant.name, "餐厅已创建");
        Ok(restaurant)
    }

    pub fn get_restaurant(&self, restaurant_id: &str) -> ApiResult<Restaurant> {
        self.catalog_repo
            .find_restaurant(restaurant_id)?
            .ok_or_else(|| ApiError::not_found("Restaurant", restaurant_id))
    }

    pub fn find_restaurant_by_name(&self, name: &str) -> ApiResult<Option<Restaurant>> {
        Ok(self.catalog_repo.find_restaurant_by_name(name.trim())?)
    }

    pub fn list_restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        Ok(self.catalog_repo.list_restaurants()?)
    }

    // ==========================================
    // 菜单
    // ==========================================

    /// 创建菜单（同一餐厅内名称唯一）
    pub fn create_menu(&self, restaurant_id: &str, name: &str, is_active: bool) -> ApiResult<Menu> {
        self.get_restaurant(restaurant_id)?;
        let menu = Menu {
            menu_id: uuid::Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.to_string(),
            name: Self::require_name(name, "菜单名称")?,
            is_active,
            created_at: Self::now(),
        };
        self.catalog_repo.insert_menu(&menu)?;
        tracing::info!(menu_id = %menu.menu_id, restaurant_id = restaurant_id, "菜单已创建");
        Ok(menu)
    }

    pub fn list_menus(&self, restaurant_id: &str) -> ApiResult<Vec<Menu>> {
        Ok(self.catalog_repo.list_menus(restaurant_id)?)
    }

    // ==========================================
    // 菜品
    // ==========================================

    /// 添加菜品（价格非负,最多两位小数）
    pub fn add_menu_item(
        &self,
        menu_id: &str,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> ApiResult<MenuItem> {
        let menu = self
            .catalog_repo
            .find_menu(menu_id)?
            .ok_or_else(|| ApiError::not_found("Menu", menu_id))?;
        validate_amount("price", price).map_err(ApiError::InvalidInput)?;

        let item = MenuItem {
            menu_item_id: uuid::Uuid::new_v4().to_string(),
            menu_id: menu.menu_id,
            restaurant_id: menu.restaurant_id,
            name: Self::require_name(name, "菜品名称")?,
            description: description.trim().to_string(),
            price,
            is_available: true,
            created_at: Self::now(),
        };
        self.catalog_repo.insert_menu_item(&item)?;
        tracing::info!(menu_item_id = %item.menu_item_id, name = %item.name, price = %item.price, "菜品已添加");
        Ok(item)
    }

    pub fn get_menu_item(&self, menu_item_id: &str) -> ApiResult<MenuItem> {
        self.catalog_repo
            .find_menu_item(menu_item_id)?
            .ok_or_else(|| ApiError::not_found("MenuItem", menu_item_id))
    }

    pub fn list_menu_items(&self, menu_id: &str) -> ApiResult<Vec<MenuItem>> {
        Ok(self.catalog_repo.list_menu_items(menu_id)?)
    }

    /// 调价（已加入拼单的明细单价不变）
    pub fn update_menu_item_price(&self, menu_item_id: &str, price: Decimal) -> ApiResult<MenuItem> {
        validate_amount("price", price).map_err(ApiError::InvalidInput)?;
        self.catalog_repo.update_menu_item_price(menu_item_id, price)?;
        tracing::info!(menu_item_id = menu_item_id, price = %price, "菜品已调价");
        self.get_menu_item(menu_item_id)
    }

    /// 上架/下架
    pub fn set_menu_item_availability(&self, menu_item_id: &str, is_available: bool) -> ApiResult<MenuItem> {
        self.catalog_repo
            .set_menu_item_availability(menu_item_id, is_available)?;
        tracing::info!(menu_item_id = menu_item_id, is_available = is_available, "菜品可点状态已变更");
        self.get_menu_item(menu_item_id)
    }

    /// 删除菜品
    ///
    /// 引用该菜品的明细保留名称与单价快照,menu_item_id 置空
    pub fn delete_menu_item(&self, menu_item_id: &str) -> ApiResult<()> {
        if self.catalog_repo.delete_menu_item(menu_item_id)? == 0 {
            return Err(ApiError::not_found("MenuItem", menu_item_id));
        }
        tracing::info!(menu_item_id = menu_item_id, "菜品已删除");
        Ok(())
    }

    // ==========================================
    // 推荐
    // ==========================================

    /// 发布推荐（可不关联餐厅）
    ///
    /// # 错误
    /// - InvalidInput: 内容为空
    /// - NotFound: 用户或餐厅不存在
    pub fn add_recommendation(
        &self,
        user_id: &str,
        restaurant_id: Option<&str>,
        text: &str,
    ) -> ApiResult<Recommendation> {
        let text = Self::require_name(text, "推荐内容")?;
        self.user_repo
            .find_by_id(user_id)?
            .ok_or_else(|| ApiError::not_found("User", user_id))?;
        if let Some(id) = restaurant_id {
            self.get_restaurant(id)?;
        }

        let rec = Recommendation::new(user_id, restaurant_id, text);
        self.recommendation_repo.insert(&rec)?;
        tracing::info!(
            recommendation_id = %rec.recommendation_id,
            user_id = user_id,
            restaurant_id = ?restaurant_id,
            "推荐已发布"
        );
        self.get_recommendation(&rec.recommendation_id)
    }

    pub fn get_recommendation(&self, recommendation_id: &str) -> ApiResult<Recommendation> {
        self.recommendation_repo
            .find_by_id(recommendation_id)?
            .ok_or_else(|| ApiError::not_found("Recommendation", recommendation_id))
    }

    /// 推荐列表,新的在前; 指定餐厅时只返回该餐厅的推荐
    pub fn list_recommendations(&self, restaurant_id: Option<&str>) -> ApiResult<Vec<Recommendation>> {
        Ok(self.recommendation_repo.list(restaurant_id)?)
    }

    /// 删除推荐（作者本人或管理员）
    pub fn delete_recommendation(&self, recommendation_id: &str, actor_id: &str) -> ApiResult<()> {
        let rec = self.get_recommendation(recommendation_id)?;
        let actor = self
            .user_repo
            .find_by_id(actor_id)?
            .ok_or_else(|| ApiError::not_found("User", actor_id))?;
        if rec.user_id != actor.user_id && actor.role != UserRole::Manager {
            return Err(ApiError::PermissionDenied(format!(
                "{} 不能删除他人的推荐",
                actor.username
            )));
        }
        self.recommendation_repo.delete(recommendation_id)?;
        tracing::info!(recommendation_id = recommendation_id, actor_id = actor_id, "推荐已删除");
        Ok(())
    }
}
