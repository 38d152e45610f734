// ==========================================
// BrightEat 团餐拼单系统 - 拼单码生成
// ==========================================
// 拼单码: 短小、便于口头/消息分享,全局唯一 (唯一性由数据库约束兜底)
// 字母表去掉易混淆字符 0/O/1/I/L
// ==========================================

use rand::Rng;

/// 拼单码字母表
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// 默认长度
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// 最短长度
pub const MIN_CODE_LENGTH: usize = 4;

/// 生成拼单码
pub fn generate(length: usize) -> String {
    generate_with(&mut rand::thread_rng(), length)
}

/// 使用指定随机源生成拼单码（测试可注入种子）
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    let length = length.max(MIN_CODE_LENGTH);
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// 规范化用户输入的拼单码（去空白、转大写）
pub fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}
