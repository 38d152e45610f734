// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 临时数据库 + 完整 AppState + 演示数据
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use tempfile::NamedTempFile;

use brighteat::api::{ApiError, RegisterUserRequest};
use brighteat::app::{seed_data, AppState};
use brighteat::domain::types::UserRole;
use brighteat::User;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 每个测试独占一个临时数据库文件
pub struct ApiTestEnv {
    pub db_path: String,
    pub state: AppState,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境（空库）
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) = test_helpers::create_test_db()
            .map_err(|e| format!("创建测试数据库失败: {}", e))?;
        let state = AppState::new(db_path.clone())?;
        Ok(Self {
            db_path,
            state,
            _temp_file: temp_file,
        })
    }

    /// 创建测试环境并写入演示数据
    pub fn with_seed() -> Result<Self, String> {
        let env = Self::new()?;
        seed_data(&env.state).map_err(|e| format!("写入演示数据失败: {}", e))?;
        Ok(env)
    }

    /// 对同一数据库文件打开第二个 AppState（独立连接）
    pub fn reopen(&self) -> Result<AppState, String> {
        AppState::new(self.db_path.clone())
    }

    /// 注册普通用户
    pub fn register(&self, username: &str) -> Result<User, ApiError> {
        self.state.user_api.register_user(RegisterUserRequest {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            password: "integration-pass".to_string(),
            password_confirm: "integration-pass".to_string(),
            role: UserRole::User,
            ..Default::default()
        })
    }

    /// 按名称查找演示菜单中的菜品ID
    pub fn menu_item_id(&self, name: &str) -> String {
        let restaurant = self
            .state
            .catalog_api
            .find_restaurant_by_name("Balbaa")
            .expect("查询餐厅失败")
            .expect("演示餐厅不存在");
        for menu in self
            .state
            .catalog_api
            .list_menus(&restaurant.restaurant_id)
            .expect("查询菜单失败")
        {
            let items = self
                .state
                .catalog_api
                .list_menu_items(&menu.menu_id)
                .expect("查询菜品失败");
            if let Some(item) = items.into_iter().find(|i| i.name == name) {
                return item.menu_item_id;
            }
        }
        panic!("演示菜单中没有菜品 {}", name);
    }

    /// 演示餐厅ID
    pub fn restaurant_id(&self) -> String {
        self.state
            .catalog_api
            .find_restaurant_by_name("Balbaa")
            .expect("查询餐厅失败")
            .expect("演示餐厅不存在")
            .restaurant_id
    }
}
