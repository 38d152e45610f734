// ==========================================
// BrightEat 团餐拼单系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `*_tx` 关联函数在调用方事务内执行,供 API 层组合原子操作
// ==========================================

pub mod audit_log_repo;
pub mod catalog_repo;
pub mod error;
pub mod fee_preset_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod recommendation_repo;
pub mod sql_types;
pub mod user_repo;

#[cfg(test)]
pub(crate) mod test_fixtures;

// 重导出核心仓储
pub use audit_log_repo::AuditLogRepository;
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use fee_preset_repo::FeePresetRepository;
pub use order_repo::OrderRepository;
pub use payment_repo::PaymentRepository;
pub use recommendation_repo::RecommendationRepository;
pub use user_repo::UserRepository;
