// ==========================================
// BrightEat 团餐拼单系统 - 引擎层
// ==========================================
// 职责: 实现拼单业务规则（状态机、费用分摊、加菜校验）,不拼 SQL
// 红线: Engine 不访问数据库, 输入输出均为领域对象
// ==========================================

pub mod cost_split;
pub mod item_spec;
pub mod join_code;
pub mod lifecycle;
pub mod money;
pub mod provisioning;
pub mod share_message;

// 重导出核心引擎
pub use cost_split::{ParticipantShare, ShareBreakdown, SplitError};
pub use item_spec::{ItemRequest, ItemSpecError, ResolvedItem};
pub use lifecycle::{LifecycleError, Transition};
pub use share_message::ShareContext;
