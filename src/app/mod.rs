// ==========================================
// BrightEat 团餐拼单系统 - 应用层
// ==========================================
// 职责: 组装仓储与API,提供初始数据
// ==========================================

pub mod seed;
pub mod state;

// 重导出
pub use seed::{seed_data, SeedReport};
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
