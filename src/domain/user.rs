// ==========================================
// BrightEat 团餐拼单系统 - 用户目录领域模型
// ==========================================
// 职责: 用户身份 (用户名/邮箱/角色/收款链接)
// 红线: 密码只存哈希,不序列化输出
// ==========================================

use crate::domain::types::UserRole;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// User - 用户
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,               // 用户ID
    pub username: String,              // 用户名 (唯一)
    pub email: Option<String>,         // 邮箱 (唯一,小写)
    pub first_name: String,            // 名
    pub last_name: String,             // 姓
    pub role: UserRole,                // 角色
    pub phone: Option<String>,         // 电话
    pub instapay_link: Option<String>, // 收款链接
    pub is_active: bool,               // 是否启用
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>, // 密码哈希 (argon2)
    pub date_joined: NaiveDateTime,    // 注册时间
}

impl User {
    /// 创建新用户（未设置密码）
    pub fn new(username: String, email: Option<String>, role: UserRole) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            role,
            phone: None,
            instapay_link: None,
            is_active: true,
            password_hash: None,
            date_joined: chrono::Utc::now().naive_utc(),
        }
    }

    /// 设置姓名
    pub fn with_name(mut self, first_name: &str, last_name: &str) -> Self {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self
    }

    /// 显示用邮箱（缺失时为 N/A）
    pub fn display_email(&self) -> &str {
        self.email.as_deref().unwrap_or("N/A")
    }
}

/// 用户简要信息（参与人/指派人列表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBrief {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
}

impl From<&User> for UserBrief {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}
