// ==========================================
// BrightEat 团餐拼单系统 - 拼单数据仓储
// ==========================================
// 对齐: schema.sql collection_order / order_assigned_user / order_item 表
// 红线: Repository 不含业务逻辑 (状态校验在 engine::lifecycle)
// ==========================================
// 约定: `*_tx` 关联函数接收调用方的连接/事务,供 API 层在同一事务内组合
// ==========================================

mod core;
mod items;

#[cfg(test)]
mod tests;

pub use self::core::OrderRepository;
