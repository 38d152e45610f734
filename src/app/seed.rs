// ==========================================
// BrightEat 团餐拼单系统 - 初始数据
// ==========================================
// 职责: 幂等写入演示用户、餐厅菜单与费用预设
// 红线: 已存在的记录不覆盖
// ==========================================

use rust_decimal::Decimal;
use serde::Serialize;

use crate::api::{ApiResult, RegisterUserRequest};
use crate::app::state::AppState;
use crate::domain::fee_preset::FeeBundle;
use crate::domain::types::UserRole;

/// 种子用户: (用户名, 邮箱, 名, 姓, 角色, 初始密码)
const SEED_USERS: &[(&str, &str, &str, &str, UserRole, &str)] = &[
    ("manager", "manager@brighteat.com", "Menu", "Manager", UserRole::Manager, "manager123"),
    ("mostafa", "mostafa@brighteat.com", "Mostafa", "Hakam", UserRole::User, "mostafa123"),
];

const SEED_RESTAURANT: (&str, &str) = ("Balbaa", "Delicious Middle Eastern cuisine");
const SEED_MENU: &str = "Main Menu";

/// 种子菜品: (名称, 价格, 描述)
const SEED_MENU_ITEMS: &[(&str, i64, &str)] = &[
    ("Shawarma Sandwich", 45, "Chicken shawarma with tahini"),
    ("Falafel Sandwich", 25, "Crispy falafel with vegetables"),
    ("Mixed Grill", 120, "Chicken and beef kebab with rice"),
    ("Hummus Plate", 35, "Creamy hummus with pita bread"),
    ("Fattoush Salad", 40, "Fresh mixed salad with pomegranate"),
    ("Mansaf", 95, "Traditional lamb with yogurt sauce"),
    ("Kunafa", 30, "Sweet cheese pastry"),
    ("Fresh Juice", 20, "Orange or mango juice"),
];

/// 种子费用预设: (名称, 配送费, 小费, 服务费)
const SEED_FEE_PRESETS: &[(&str, i64, i64, i64)] = &[
    ("Talabat", 30, 10, 0),
    ("Otlob", 25, 5, 0),
    ("Direct Order", 20, 15, 0),
];

/// 种子数据执行报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

impl SeedReport {
    fn record(&mut self, created: bool, label: String) {
        if created {
            tracing::info!("已创建 {}", label);
            self.created.push(label);
        } else {
            tracing::debug!("已存在 {}", label);
            self.existing.push(label);
        }
    }
}

/// 写入初始数据（可重复执行）
pub fn seed_data(state: &AppState) -> ApiResult<SeedReport> {
    let mut report = SeedReport::default();

    // ===== 用户 =====
    let mut manager_id = None;
    for (username, email, first_name, last_name, role, password) in SEED_USERS {
        let existing = state.user_api.list_users()?.into_iter().find(|u| u.username == *username);
        let (user, created) = match existing {
            Some(user) => (user, false),
            None => {
                let user = state.user_api.register_user(RegisterUserRequest {
                    username: username.to_string(),
                    email: Some(email.to_string()),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    password: password.to_string(),
                    password_confirm: password.to_string(),
                    role: *role,
                    ..Default::default()
                })?;
                (user, true)
            }
        };
        if user.role == UserRole::Manager && manager_id.is_none() {
            manager_id = Some(user.user_id.clone());
        }
        report.record(created, format!("user:{}", username));
    }

    // ===== 餐厅与菜单 =====
    let (restaurant_name, description) = SEED_RESTAURANT;
    let (restaurant, created) = match state.catalog_api.find_restaurant_by_name(restaurant_name)? {
        Some(r) => (r, false),
        None => (
            state
                .catalog_api
                .create_restaurant(restaurant_name, description, manager_id.as_deref())?,
            true,
        ),
    };
    report.record(created, format!("restaurant:{}", restaurant.name));

    let existing_menu = state
        .catalog_api
        .list_menus(&restaurant.restaurant_id)?
        .into_iter()
        .find(|m| m.name == SEED_MENU);
    let (menu, created) = match existing_menu {
        Some(m) => (m, false),
        None => (
            state
                .catalog_api
                .create_menu(&restaurant.restaurant_id, SEED_MENU, true)?,
            true,
        ),
    };
    report.record(created, format!("menu:{}", menu.name));

    let existing_items = state.catalog_api.list_menu_items(&menu.menu_id)?;
    for (name, price, description) in SEED_MENU_ITEMS {
        let created = if existing_items.iter().any(|i| i.name == *name) {
            false
        } else {
            state
                .catalog_api
                .add_menu_item(&menu.menu_id, name, description, Decimal::new(price * 100, 2))?;
            true
        };
        report.record(created, format!("menu_item:{}", name));
    }

    // ===== 费用预设 =====
    for (name, delivery_fee, tip, service_fee) in SEED_FEE_PRESETS {
        let created = if state.fee_preset_api.find_preset_by_name(name)?.is_some() {
            false
        } else {
            let fees = FeeBundle::new(
                Decimal::new(delivery_fee * 100, 2),
                Decimal::new(tip * 100, 2),
                Decimal::new(service_fee * 100, 2),
            );
            state.fee_preset_api.create_preset(name, fees)?;
            true
        };
        report.record(created, format!("fee_preset:{}", name));
    }

    tracing::info!(
        created = report.created.len(),
        existing = report.existing.len(),
        "初始数据写入完成"
    );
    Ok(report)
}
