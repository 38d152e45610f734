// ==========================================
// BrightEat 团餐拼单系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit_log;
pub mod catalog;
pub mod fee_preset;
pub mod order;
pub mod payment;
pub mod recommendation;
pub mod types;
pub mod user;

// 重导出核心类型
pub use audit_log::{AuditAction, AuditLog};
pub use catalog::{Menu, MenuItem, Restaurant};
pub use fee_preset::{FeeBundle, FeePreset};
pub use order::{CollectionOrder, ItemSource, ItemSpec, OrderItem};
pub use payment::Payment;
pub use recommendation::Recommendation;
pub use types::{FeeSplitRule, OrderStatus, UserRole};
pub use user::{User, UserBrief};
