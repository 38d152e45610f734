// ==========================================
// BrightEat 团餐拼单系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 团队拼单 (发起 → 加菜 → 锁单 → 下单 → 结单) 与费用分摊
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与初始数据
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FeeSplitRule, OrderStatus, UserRole};

// 领域实体
pub use domain::{
    AuditAction, AuditLog, CollectionOrder, FeeBundle, FeePreset, ItemSource, ItemSpec, Menu,
    MenuItem, OrderItem, Payment, Recommendation, Restaurant, User, UserBrief,
};

// 引擎
pub use engine::{ItemRequest, LifecycleError, ShareBreakdown, SplitError, Transition};

// API
pub use api::{ApiError, ApiResult, CreateOrderRequest, FeeSource, OrderApi, OrderSummary};

// ==========================================
// 版本信息
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "BrightEat";
