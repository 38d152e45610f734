// ==========================================
// BrightEat 团餐拼单系统 - 加菜请求校验
// ==========================================
// 红线: 菜单菜品 与 自定义菜品 二选一,不可同时提供,也不可都不提供
// 红线: 单价在加入时快照
// ==========================================
// 职责: 原始请求 → ItemSpec 标签联合 → 已解析的明细来源
// ==========================================

use crate::domain::catalog::MenuItem;
use crate::domain::order::{ItemSource, ItemSpec};
use crate::engine::money::{CURRENCY_SCALE, MAX_AMOUNT, MAX_QUANTITY};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ItemSpecError - 加菜请求错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemSpecError {
    #[error("不能同时指定菜单菜品和自定义菜品")]
    BothSources,

    #[error("必须指定菜单菜品或自定义菜品")]
    NoSource,

    #[error("自定义菜品必须提供正数价格")]
    MissingCustomPrice,

    #[error("自定义价格必须为正数: {0}")]
    NonPositivePrice(Decimal),

    #[error("自定义价格最多保留两位小数: {0}")]
    PricePrecision(Decimal),

    #[error("自定义价格超过上限: {0}")]
    PriceTooLarge(Decimal),

    #[error("未指定自定义菜品名称时不能提供自定义价格")]
    StrayCustomPrice,

    #[error("数量必须为正整数: {0}")]
    InvalidQuantity(i32),

    #[error("数量超过上限 {max}: {quantity}")]
    QuantityTooLarge { quantity: i32, max: i32 },

    #[error("明细金额溢出: {quantity} x {unit_price}")]
    AmountOverflow { quantity: i32, unit_price: Decimal },

    #[error("菜品 {menu_item_id} 不属于拼单餐厅 {restaurant_id}")]
    WrongRestaurant {
        menu_item_id: String,
        restaurant_id: String,
    },

    #[error("菜品 {0} 当前不可点")]
    Unavailable(String),
}

// ==========================================
// ItemRequest - 原始加菜请求 (来自 CLI / API)
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRequest {
    pub menu_item_id: Option<String>,
    pub custom_name: Option<String>,
    pub custom_price: Option<Decimal>,
    pub quantity: i32,
}

impl ItemRequest {
    /// 菜单菜品请求
    pub fn catalog(menu_item_id: &str, quantity: i32) -> Self {
        Self {
            menu_item_id: Some(menu_item_id.to_string()),
            quantity,
            ..Default::default()
        }
    }

    /// 自定义菜品请求
    pub fn custom(name: &str, price: Decimal, quantity: i32) -> Self {
        Self {
            custom_name: Some(name.to_string()),
            custom_price: Some(price),
            quantity,
            ..Default::default()
        }
    }

    /// 转换为标签联合,同时校验数量
    ///
    /// 空白字符串视同未提供
    pub fn into_spec(self) -> Result<(ItemSpec, i32), ItemSpecError> {
        if self.quantity <= 0 {
            return Err(ItemSpecError::InvalidQuantity(self.quantity));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(ItemSpecError::QuantityTooLarge {
                quantity: self.quantity,
                max: MAX_QUANTITY,
            });
        }

        let menu_item_id = non_blank(self.menu_item_id);
        let custom_name = non_blank(self.custom_name);

        let spec = match (menu_item_id, custom_name) {
            (Some(_), Some(_)) => return Err(ItemSpecError::BothSources),
            (None, None) => return Err(ItemSpecError::NoSource),
            (Some(menu_item_id), None) => {
                if self.custom_price.is_some() {
                    return Err(ItemSpecError::StrayCustomPrice);
                }
                ItemSpec::CatalogItem { menu_item_id }
            }
            (None, Some(name)) => {
                let price = self.custom_price.ok_or(ItemSpecError::MissingCustomPrice)?;
                validate_custom_price(price)?;
                ItemSpec::CustomItem { name, price }
            }
        };
        Ok((spec, self.quantity))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_custom_price(price: Decimal) -> Result<(), ItemSpecError> {
    if price <= Decimal::ZERO {
        return Err(ItemSpecError::NonPositivePrice(price));
    }
    if price > MAX_AMOUNT {
        return Err(ItemSpecError::PriceTooLarge(price));
    }
    if price.normalize().scale() > CURRENCY_SCALE {
        return Err(ItemSpecError::PricePrecision(price));
    }
    Ok(())
}

// ==========================================
// ResolvedItem - 已解析的明细 (名称/单价快照)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub source: ItemSource,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// 解析菜单菜品: 校验餐厅归属与可点状态,快照名称与单价
pub fn resolve_catalog(
    menu_item: &MenuItem,
    order_restaurant_id: &str,
    quantity: i32,
) -> Result<ResolvedItem, ItemSpecError> {
    if menu_item.restaurant_id != order_restaurant_id {
        return Err(ItemSpecError::WrongRestaurant {
            menu_item_id: menu_item.menu_item_id.clone(),
            restaurant_id: order_restaurant_id.to_string(),
        });
    }
    if !menu_item.is_available {
        return Err(ItemSpecError::Unavailable(menu_item.name.clone()));
    }
    Ok(ResolvedItem {
        source: ItemSource::Catalog {
            menu_item_id: Some(menu_item.menu_item_id.clone()),
        },
        item_name: menu_item.name.clone(),
        unit_price: menu_item.price,
        quantity,
    })
}

/// 解析自定义菜品
pub fn resolve_custom(name: String, price: Decimal, quantity: i32) -> ResolvedItem {
    ResolvedItem {
        source: ItemSource::Custom {
            name: name.clone(),
            price,
        },
        item_name: name,
        unit_price: price,
        quantity,
    }
}
