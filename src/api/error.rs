// ==========================================
// BrightEat 团餐拼单系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,把仓储层/引擎层错误转换为可区分的用户错误
// 红线: 每类错误有稳定错误码,不可合并为通用失败
// ==========================================

use crate::domain::types::OrderStatus;
use crate::engine::cost_split::SplitError;
use crate::engine::item_spec::ItemSpecError;
use crate::engine::lifecycle::LifecycleError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 拼单状态机错误
    // ==========================================
    #[error("无效的状态转换: 当前状态={current}, 请求操作={requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: String,
    },

    #[error("拼单已锁定,不能修改明细: order={order_id}, status={status}")]
    OrderLocked { order_id: String, status: OrderStatus },

    #[error("私有拼单仅指派成员可加菜: order={order_id}, user={user_id}")]
    NotAssigned { order_id: String, user_id: String },

    #[error("仅发起人可执行该操作: order={order_id}, actor={actor_id}")]
    NotCollector { order_id: String, actor_id: String },

    #[error("仍有未付款记录,不能结单: order={order_id}, unpaid={unpaid}")]
    PaymentsOutstanding { order_id: String, unpaid: i64 },

    // ==========================================
    // 加菜与分摊错误
    // ==========================================
    #[error("加菜请求不合法: {0}")]
    InvalidItemSpec(String),

    #[error("拼单没有参与人,无法分摊")]
    NoParticipants,

    #[error("菜品总额为零,无法按金额加权分摊")]
    ZeroBasis,

    // ==========================================
    // 通用业务错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定错误码（对外展示 / 前端分支判断）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ApiError::OrderLocked { .. } => "ORDER_LOCKED",
            ApiError::NotAssigned { .. } => "NOT_ASSIGNED",
            ApiError::NotCollector { .. } => "NOT_COLLECTOR",
            ApiError::PaymentsOutstanding { .. } => "PAYMENTS_OUTSTANDING",
            ApiError::InvalidItemSpec(_) => "INVALID_ITEM_SPEC",
            ApiError::NoParticipants => "NO_PARTICIPANTS",
            ApiError::ZeroBasis => "ZERO_BASIS",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PermissionDenied(_) => "PERMISSION_DENIED",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{}(id={})不存在", entity, id))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("检查约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

// ==========================================
// 从引擎错误转换
// ==========================================
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition {
                current, requested, ..
            } => ApiError::InvalidTransition {
                current,
                requested: requested.name().to_string(),
            },
            LifecycleError::NotCollector { order_id, actor_id } => {
                ApiError::NotCollector { order_id, actor_id }
            }
        }
    }
}

impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        match err {
            SplitError::NoParticipants => ApiError::NoParticipants,
            SplitError::ZeroBasis => ApiError::ZeroBasis,
            SplitError::AmountOverflow => ApiError::InvalidInput(err.to_string()),
        }
    }
}

impl From<ItemSpecError> for ApiError {
    fn from(err: ItemSpecError) -> Self {
        ApiError::InvalidItemSpec(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
