// ==========================================
// BrightEat 团餐拼单系统 - 推荐领域模型
// ==========================================
// 职责: 用户对餐厅(或泛指)的文字推荐
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Recommendation - 推荐
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_id: String,
    pub user_id: String,
    pub user_name: String,                // 读取时关联用户名
    pub restaurant_id: Option<String>,    // 未关联餐厅或餐厅已删除时为空
    pub restaurant_name: Option<String>,  // 读取时关联餐厅名
    pub text: String,
    pub created_at: NaiveDateTime,
}

impl Recommendation {
    pub fn new(user_id: &str, restaurant_id: Option<&str>, text: String) -> Self {
        Self {
            recommendation_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            user_name: String::new(),
            restaurant_id: restaurant_id.map(str::to_string),
            restaurant_name: None,
            text,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
