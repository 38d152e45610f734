// ==========================================
// BrightEat 团餐拼单系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{CatalogApi, FeePresetApi, OrderApi, UserApi};
use crate::config::config_manager::ConfigManager;
use crate::repository::{
    AuditLogRepository, CatalogRepository, FeePresetRepository, OrderRepository,
    PaymentRepository, RecommendationRepository, UserRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "BRIGHTEAT_DB";

/// 应用状态
///
/// 包含所有API实例和共享资源,所有仓储共享同一连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 拼单API
    pub order_api: Arc<OrderApi>,

    /// 用户目录API
    pub user_api: Arc<UserApi>,

    /// 菜单目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 费用预设API
    pub fee_preset_api: Arc<FeePresetApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        if let Err(e) = crate::db::warn_on_schema_mismatch(&conn) {
            tracing::warn!("schema_version 读取失败(将继续启动): {}", e);
        }

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（连接须已建表）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let user_repo = Arc::new(UserRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let fee_preset_repo = Arc::new(FeePresetRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let payment_repo = Arc::new(PaymentRepository::new(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(conn.clone()));
        let recommendation_repo = Arc::new(RecommendationRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let order_api = Arc::new(OrderApi::new(
            conn,
            order_repo,
            user_repo.clone(),
            catalog_repo.clone(),
            fee_preset_repo.clone(),
            payment_repo,
            audit_log_repo,
            config_manager.clone(),
        ));
        let user_api = Arc::new(UserApi::new(user_repo.clone(), config_manager.clone()));
        let catalog_api = Arc::new(CatalogApi::new(catalog_repo, recommendation_repo, user_repo));
        let fee_preset_api = Arc::new(FeePresetApi::new(fee_preset_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            order_api,
            user_api,
            catalog_api,
            fee_preset_api,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 BRIGHTEAT_DB > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./brighteat.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("brighteat-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("brighteat");
        }

        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&path).is_ok() {
            path = path.join("brighteat.db");
        } else {
            path = PathBuf::from("./brighteat.db");
        }
    }

    path.to_string_lossy().to_string()
}
