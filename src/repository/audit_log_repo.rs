// ==========================================
// BrightEat 团餐拼单系统 - 审计日志数据仓储
// ==========================================
// 对齐: schema.sql audit_log 表
// 红线: 只追加; 不提供 update / delete 接口
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use self::core::AuditLogRepository;
