// ==========================================
// BrightEat 团餐拼单系统 - 金额工具
// ==========================================
// 使用 rust_decimal 做精确小数运算,禁止浮点
// 货币精度: 2 位小数
// ==========================================

use rust_decimal::prelude::*;

/// 货币精度（小数位数）
pub const CURRENCY_SCALE: u32 = 2;

/// 最小货币单位 (0.01)
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, CURRENCY_SCALE);

/// 单笔金额上限 (1e12)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// 单条明细数量上限
pub const MAX_QUANTITY: i32 = 10_000;

/// 向零截断到货币精度
pub fn floor_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::ToZero)
}

/// 规范化到货币精度显示 (例如 45 → 45.00)
pub fn to_cents(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(CURRENCY_SCALE);
    v
}

/// 校验金额: 非负,不超过上限,且不超过货币精度
pub fn validate_amount(field: &str, value: Decimal) -> Result<(), String> {
    if value < Decimal::ZERO {
        return Err(format!("{} 不能为负数: {}", field, value));
    }
    if value > MAX_AMOUNT {
        return Err(format!("{} 超过上限 {}: {}", field, MAX_AMOUNT, value));
    }
    if value.normalize().scale() > CURRENCY_SCALE {
        return Err(format!(
            "{} 最多保留{}位小数: {}",
            field, CURRENCY_SCALE, value
        ));
    }
    Ok(())
}

/// 解析金额字符串
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, String> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|e| format!("{} 不是合法金额 ({}): {}", field, raw, e))?;
    validate_amount(field, value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_floor_cents() {
        assert_eq!(floor_cents(d("13.3333333")), d("13.33"));
        assert_eq!(floor_cents(d("13.339")), d("13.33"));
        assert_eq!(floor_cents(d("20")), d("20"));
    }

    #[test]
    fn test_to_cents_rescales() {
        assert_eq!(to_cents(d("45")).to_string(), "45.00");
        assert_eq!(to_cents(d("0.125")).to_string(), "0.13");
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price", d("12.50")).is_ok());
        assert!(validate_amount("price", d("12.500")).is_ok());
        assert!(validate_amount("price", d("-1")).is_err());
        assert!(validate_amount("price", d("1.005")).is_err());
    }

    #[test]
    fn test_validate_amount_upper_bound() {
        assert_eq!(MAX_AMOUNT, d("1000000000000"));
        assert!(validate_amount("tip", MAX_AMOUNT).is_ok());
        assert!(validate_amount("tip", d("1000000000000.01")).is_err());
        assert!(validate_amount("tip", Decimal::MAX).is_err());
        assert!(parse_amount("tip", "79228162514264337593543950335").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("tip", " 10.5 ").unwrap(), d("10.50"));
        assert!(parse_amount("tip", "abc").is_err());
    }

    #[test]
    fn test_cent_constant() {
        assert_eq!(CENT, d("0.01"));
    }
}
