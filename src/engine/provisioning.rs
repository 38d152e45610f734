// ==========================================
// BrightEat 团餐拼单系统 - 批量开户辅助
// ==========================================
// 职责: 邮箱规范化 / 用户名推导 / 随机密码 / 密码哈希
// 红线: 数据库只保存 argon2 哈希,明文密码只在开户报告中出现一次
// ==========================================

use rand::distributions::Alphanumeric;
use rand::Rng;

/// 默认密码长度
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// 最短密码长度
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// 规范化邮箱（去空白、转小写）
///
/// 不含 `@` 或本地部分为空时返回 None
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(email),
        _ => None,
    }
}

/// 由邮箱推导唯一用户名
///
/// 取 `@` 前部分; 已被占用时依次尝试 `name1`, `name2`, ...
pub fn derive_username<F>(email: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = email.split('@').next().unwrap_or(email);
    let mut candidate = base.to_string();
    let mut counter = 1u32;
    while exists(&candidate) {
        candidate = format!("{}{}", base, counter);
        counter += 1;
    }
    candidate
}

/// 生成随机密码（大小写字母 + 数字）
pub fn generate_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(MIN_PASSWORD_LENGTH))
        .map(char::from)
        .collect()
}

/// 计算密码哈希 (argon2id, PHC 字符串)
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// 校验密码
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Alice@Example.COM "),
            Some("alice@example.com".to_string())
        );
        assert_eq!(normalize_email("not-an-email"), None);
        assert_eq!(normalize_email("@example.com"), None);
    }

    #[test]
    fn test_derive_username_suffixes() {
        let taken: HashSet<&str> = ["alice", "alice1"].into_iter().collect();
        assert_eq!(derive_username("alice@example.com", |u| taken.contains(u)), "alice2");
        assert_eq!(derive_username("bob@example.com", |u| taken.contains(u)), "bob");
    }

    #[test]
    fn test_generate_password() {
        let pwd = generate_password(16);
        assert_eq!(pwd.len(), 16);
        assert!(pwd.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(generate_password(2).len(), MIN_PASSWORD_LENGTH);
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cretPass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cretPass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cretPass", "not-a-hash"));
    }
}
