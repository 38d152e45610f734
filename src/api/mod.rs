// ==========================================
// BrightEat 团餐拼单系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 与上层调用
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod fee_preset_api;
pub mod order_api;
pub mod user_api;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult};
pub use fee_preset_api::FeePresetApi;
pub use order_api::{CreateOrderRequest, FeeSource, OrderApi, OrderSummary};
pub use user_api::{Credential, ProvisionReport, RegisterUserRequest, UserApi};
