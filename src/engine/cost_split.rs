// ==========================================
// BrightEat 团餐拼单系统 - 费用分摊引擎
// ==========================================
// 红线: 全程 Decimal 运算,不使用浮点
// 红线: Σ fee_share == 总费用 (不漏分)
// ==========================================
// 职责: 汇总明细金额 + 按规则分摊配送费/小费/服务费
// 输入: 拼单 + 明细 (按加入顺序)
// 输出: 每个参与人的 小计 / 分摊 / 应付
// ==========================================

use crate::domain::order::{CollectionOrder, OrderItem};
use crate::domain::types::FeeSplitRule;
use crate::engine::money::floor_cents;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

// ==========================================
// SplitError - 分摊错误
// ==========================================
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitError {
    #[error("拼单没有参与人,无法分摊")]
    NoParticipants,

    #[error("菜品总额为零,无法按金额加权分摊")]
    ZeroBasis,

    #[error("金额溢出,无法汇总或分摊")]
    AmountOverflow,
}

// ==========================================
// Participant - 参与人 (按首次加菜顺序)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub user_name: String,
    pub item_subtotal: Decimal,
}

// ==========================================
// ParticipantShare - 单人分摊结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantShare {
    pub user_id: String,
    pub user_name: String,
    pub item_subtotal: Decimal,
    pub fee_share: Decimal,
    pub amount: Decimal, // item_subtotal + fee_share
}

// ==========================================
// ShareBreakdown - 整单分摊结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareBreakdown {
    pub rule: FeeSplitRule,
    pub total_items_cost: Decimal,
    pub total_fee: Decimal,
    pub shares: Vec<ParticipantShare>,
}

impl ShareBreakdown {
    pub fn total_fee_shares(&self) -> Decimal {
        self.shares.iter().map(|s| s.fee_share).sum()
    }

    pub fn total_amount(&self) -> Decimal {
        self.shares.iter().map(|s| s.amount).sum()
    }

    pub fn share_for(&self, user_id: &str) -> Option<&ParticipantShare> {
        self.shares.iter().find(|s| s.user_id == user_id)
    }
}

// ==========================================
// 汇总
// ==========================================

fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, SplitError> {
    a.checked_add(b).ok_or(SplitError::AmountOverflow)
}

/// 菜品总额
pub fn total_items_cost(items: &[OrderItem]) -> Result<Decimal, SplitError> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| checked_add(acc, item.total_price))
}

/// 共享费用合计
fn total_fee(order: &CollectionOrder) -> Result<Decimal, SplitError> {
    order.fees.checked_total().ok_or(SplitError::AmountOverflow)
}

/// 拼单总额 = 菜品总额 + 配送费 + 小费 + 服务费
pub fn total_cost(order: &CollectionOrder, items: &[OrderItem]) -> Result<Decimal, SplitError> {
    checked_add(total_items_cost(items)?, total_fee(order)?)
}

/// 参与人列表（去重,按首次加菜顺序）
///
/// `items` 需按加入顺序排列
pub fn participants(items: &[OrderItem]) -> Result<Vec<Participant>, SplitError> {
    let mut result: Vec<Participant> = Vec::new();
    for item in items {
        match result.iter_mut().find(|p| p.user_id == item.user_id) {
            Some(p) => p.item_subtotal = checked_add(p.item_subtotal, item.total_price)?,
            None => result.push(Participant {
                user_id: item.user_id.clone(),
                user_name: item.user_name.clone(),
                item_subtotal: item.total_price,
            }),
        }
    }
    Ok(result)
}

// ==========================================
// 分摊
// ==========================================

/// 计算每个参与人的应付金额
///
/// # 规则
/// - EQUAL: 每人 floor(总费用 / n),余数归发起人（发起人未参与时归首位参与人）
/// - WEIGHTED: 每人 floor(总费用 × 小计 / 菜品总额),余数归小计最大者（并列取最早）
///
/// # 错误
/// - `NoParticipants`: 没有任何明细
/// - `ZeroBasis`: WEIGHTED 且菜品总额为零
/// - `AmountOverflow`: 汇总或加权乘积超出 Decimal 表示范围
#[instrument(skip(order, items), fields(order_id = %order.order_id, rule = %rule, item_count = items.len()))]
pub fn compute_shares(
    order: &CollectionOrder,
    items: &[OrderItem],
    rule: FeeSplitRule,
) -> Result<ShareBreakdown, SplitError> {
    let participants = participants(items)?;
    if participants.is_empty() {
        return Err(SplitError::NoParticipants);
    }

    let total_items_cost = total_items_cost(items)?;
    let total_fee = total_fee(order)?;
    // 各人应付之和 == 菜品总额 + 费用,须可表示
    checked_add(total_items_cost, total_fee)?;

    let (fee_shares, residual_index) = match rule {
        FeeSplitRule::Equal => {
            let n = Decimal::from(participants.len() as u64);
            let base = floor_cents(total_fee / n);
            let collector_index = participants
                .iter()
                .position(|p| order.is_collector(&p.user_id))
                .unwrap_or(0);
            (vec![base; participants.len()], collector_index)
        }
        FeeSplitRule::Weighted => {
            if total_items_cost.is_zero() {
                return Err(SplitError::ZeroBasis);
            }
            let shares = participants
                .iter()
                .map(|p| {
                    total_fee
                        .checked_mul(p.item_subtotal)
                        .and_then(|product| product.checked_div(total_items_cost))
                        .map(floor_cents)
                        .ok_or(SplitError::AmountOverflow)
                })
                .collect::<Result<Vec<_>, _>>()?;
            (shares, largest_subtotal_index(&participants))
        }
    };

    let mut shares: Vec<ParticipantShare> = participants
        .into_iter()
        .zip(fee_shares)
        .map(|(p, fee_share)| -> Result<ParticipantShare, SplitError> {
            Ok(ParticipantShare {
                amount: checked_add(p.item_subtotal, fee_share)?,
                user_id: p.user_id,
                user_name: p.user_name,
                item_subtotal: p.item_subtotal,
                fee_share,
            })
        })
        .collect::<Result<_, _>>()?;

    // 余数 (向零取整后恒为非负,且不超过总费用)
    let allocated = shares
        .iter()
        .try_fold(Decimal::ZERO, |acc, s| checked_add(acc, s.fee_share))?;
    let residual = total_fee - allocated;
    if !residual.is_zero() {
        let target = &mut shares[residual_index];
        target.fee_share += residual;
        target.amount = checked_add(target.amount, residual)?;
    }

    Ok(ShareBreakdown {
        rule,
        total_items_cost,
        total_fee,
        shares,
    })
}

/// 小计最大的参与人下标（并列时取最早）
fn largest_subtotal_index(participants: &[Participant]) -> usize {
    let mut best = 0;
    for (idx, p) in participants.iter().enumerate() {
        if p.item_subtotal > participants[best].item_subtotal {
            best = idx;
        }
    }
    best
}
