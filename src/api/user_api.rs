// ==========================================
// BrightEat 团餐拼单系统 - 用户目录 API
// ==========================================
// 职责: 注册、查询、停用、批量开户、重置密码与凭据导出
// 红线: 数据库只保存密码哈希; 明文密码只出现在开户报告与导出文件中
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::types::UserRole;
use crate::domain::user::User;
use crate::engine::provisioning::{
    derive_username, generate_password, hash_password, normalize_email, MIN_PASSWORD_LENGTH,
};
use crate::repository::UserRepository;

// ==========================================
// 请求/响应类型
// ==========================================

/// 注册请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub instapay_link: Option<String>,
}

/// 开户凭据（含明文密码,仅用于一次性分发）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// 批量开户报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub created: Vec<Credential>,
    /// 已存在的邮箱
    pub skipped: Vec<String>,
    /// (原始输入, 失败原因)
    pub failed: Vec<(String, String)>,
}

// ==========================================
// UserApi - 用户目录 API
// ==========================================
pub struct UserApi {
    user_repo: Arc<UserRepository>,
    config_manager: Arc<ConfigManager>,
}

impl UserApi {
    pub fn new(user_repo: Arc<UserRepository>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            user_repo,
            config_manager,
        }
    }

    // ==========================================
    // 注册与查询
    // ==========================================

    /// 注册用户
    ///
    /// # 错误
    /// - InvalidInput: 用户名为空、邮箱格式错误、用户名/邮箱已被占用、两次密码不一致或过短
    pub fn register_user(&self, req: RegisterUserRequest) -> ApiResult<User> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(ApiError::InvalidInput("用户名不能为空".to_string()));
        }
        let email = match req.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                normalize_email(raw)
                    .ok_or_else(|| ApiError::InvalidInput(format!("邮箱格式错误: {}", raw)))?,
            ),
            None => None,
        };
        if req.password != req.password_confirm {
            return Err(ApiError::InvalidInput("两次输入的密码不一致".to_string()));
        }
        if req.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::InvalidInput(format!(
                "密码长度不能少于{}位",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.user_repo.username_exists(&username)? {
            return Err(ApiError::InvalidInput(format!("用户名已存在: {}", username)));
        }
        if let Some(email) = &email {
            if self.user_repo.email_exists(email)? {
                return Err(ApiError::InvalidInput(format!("邮箱已存在: {}", email)));
            }
        }

        let mut user = User::new(username, email, req.role).with_name(&req.first_name, &req.last_name);
        user.phone = req.phone.filter(|s| !s.trim().is_empty());
        user.instapay_link = req.instapay_link.filter(|s| !s.trim().is_empty());
        user.password_hash = Some(Self::hash(&req.password)?);
        self.user_repo.insert(&user)?;

        tracing::info!(user_id = %user.user_id, username = %user.username, role = %user.role, "用户已注册");
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.user_repo
            .find_by_id(user_id)?
            .ok_or_else(|| ApiError::not_found("User", user_id))
    }

    pub fn find_by_username(&self, username: &str) -> ApiResult<User> {
        self.user_repo
            .find_by_username(username.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("用户{}不存在", username.trim())))
    }

    /// 用户列表（按用户名排序）
    pub fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.user_repo.list_all()?)
    }

    /// 停用用户
    pub fn deactivate_user(&self, user_id: &str) -> ApiResult<()> {
        self.user_repo.set_active(user_id, false)?;
        tracing::info!(user_id = user_id, "用户已停用");
        Ok(())
    }

    /// 删除用户
    ///
    /// 已有明细或付款记录的用户不可删除（返回 InvalidInput）
    pub fn delete_user(&self, user_id: &str) -> ApiResult<()> {
        let rows = self.user_repo.delete(user_id)?;
        if rows == 0 {
            return Err(ApiError::not_found("User", user_id));
        }
        tracing::info!(user_id = user_id, "用户已删除");
        Ok(())
    }

    // ==========================================
    // 批量开户
    // ==========================================

    /// 按邮箱批量开户
    ///
    /// 邮箱规范化后去重; 已存在的邮箱跳过; 用户名取邮箱本地部分并追加数字去重
    pub fn create_users_from_emails(&self, emails: &[String], role: UserRole) -> ApiResult<ProvisionReport> {
        let password_length = self
            .config_manager
            .get_password_length()
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))?;

        let mut report = ProvisionReport::default();
        let mut seen: Vec<String> = Vec::new();

        for raw in emails {
            if raw.trim().is_empty() {
                continue;
            }
            let Some(email) = normalize_email(raw) else {
                report.failed.push((raw.clone(), "邮箱格式错误".to_string()));
                continue;
            };
            if seen.contains(&email) {
                continue;
            }
            seen.push(email.clone());

            if self.user_repo.email_exists(&email)? {
                report.skipped.push(email);
                continue;
            }

            match self.provision_one(&email, role, password_length) {
                Ok(credential) => report.created.push(credential),
                Err(e) => {
                    tracing::warn!(email = %email, error = %e, "开户失败");
                    report.failed.push((email, e.to_string()));
                }
            }
        }

        tracing::info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "批量开户完成"
        );
        Ok(report)
    }

    fn provision_one(&self, email: &str, role: UserRole, password_length: usize) -> ApiResult<Credential> {
        let mut lookup_error = None;
        let username = derive_username(email, |candidate| {
            match self.user_repo.username_exists(candidate) {
                Ok(exists) => exists,
                Err(e) => {
                    lookup_error = Some(e);
                    false
                }
            }
        });
        if let Some(e) = lookup_error {
            return Err(e.into());
        }

        let password = generate_password(password_length);
        let mut user = User::new(username.clone(), Some(email.to_string()), role);
        user.password_hash = Some(Self::hash(&password)?);
        self.user_repo.insert(&user)?;

        Ok(Credential {
            username,
            email: email.to_string(),
            password,
            role,
        })
    }

    /// 为全部用户重新生成密码
    ///
    /// # 返回
    /// - 新凭据列表（按用户名排序）
    pub fn regenerate_passwords(&self) -> ApiResult<Vec<Credential>> {
        let password_length = self
            .config_manager
            .get_password_length()
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))?;

        let mut credentials = Vec::new();
        for user in self.user_repo.list_all()? {
            let password = generate_password(password_length);
            self.user_repo.update_password_hash(&user.user_id, &Self::hash(&password)?)?;
            credentials.push(Credential {
                email: user.display_email().to_string(),
                username: user.username,
                password,
                role: user.role,
            });
        }

        tracing::info!(count = credentials.len(), "密码已全部重置");
        Ok(credentials)
    }

    /// 导出凭据为 CSV（username,email,password,role）
    ///
    /// # 返回
    /// - 写入的记录数
    pub fn export_credentials_csv(&self, path: &Path, credentials: &[Credential]) -> ApiResult<usize> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| ApiError::InternalError(format!("无法创建导出文件: {}", e)))?;
        writer
            .write_record(["username", "email", "password", "role"])
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        for c in credentials {
            writer
                .write_record([
                    c.username.as_str(),
                    c.email.as_str(),
                    c.password.as_str(),
                    c.role.to_db_str(),
                ])
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        tracing::info!(path = %path.display(), count = credentials.len(), "凭据已导出");
        Ok(credentials.len())
    }

    fn hash(password: &str) -> ApiResult<String> {
        hash_password(password).map_err(|e| ApiError::InternalError(format!("密码哈希失败: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::provisioning::verify_password;
    use std::sync::Mutex;

    fn setup() -> UserApi {
        let conn = Arc::new(Mutex::new(crate::db::open_in_memory().unwrap()));
        UserApi::new(
            Arc::new(UserRepository::new(conn.clone())),
            Arc::new(ConfigManager::from_connection(conn).unwrap()),
        )
    }

    fn register_req(username: &str, email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.to_string(),
            email: Some(email.to_string()),
            password: "s3cret-pass".to_string(),
            password_confirm: "s3cret-pass".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_user() {
        let api = setup();
        let user = api.register_user(register_req("alice", " Alice@Example.com ")).unwrap();
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert!(verify_password("s3cret-pass", user.password_hash.as_deref().unwrap()));

        let err = api.register_user(register_req("alice", "other@example.com")).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        let err = api.register_user(register_req("alice2", "alice@example.com")).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_register_password_mismatch() {
        let api = setup();
        let mut req = register_req("bob", "bob@example.com");
        req.password_confirm = "different".to_string();
        assert!(matches!(api.register_user(req), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_create_users_from_emails() {
        let api = setup();
        api.register_user(register_req("alice", "alice@corp.com")).unwrap();

        let emails = vec![
            "alice@corp.com".to_string(),
            "ALICE@other.com".to_string(),
            "bob@corp.com".to_string(),
            "bob@corp.com ".to_string(),
            "not-an-email".to_string(),
            "".to_string(),
        ];
        let report = api.create_users_from_emails(&emails, UserRole::User).unwrap();

        assert_eq!(report.skipped, vec!["alice@corp.com".to_string()]);
        assert_eq!(report.failed.len(), 1);
        let names: Vec<&str> = report.created.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(names, vec!["alice1", "bob"]);
        assert!(report.created.iter().all(|c| c.password.len() == 12));

        let stored = api.find_by_username("alice1").unwrap();
        assert!(verify_password(
            &report.created[0].password,
            stored.password_hash.as_deref().unwrap()
        ));
    }

    #[test]
    fn test_regenerate_and_export() {
        let api = setup();
        api.register_user(register_req("zoe", "zoe@corp.com")).unwrap();
        api.register_user(register_req("amy", "amy@corp.com")).unwrap();

        let creds = api.regenerate_passwords().unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[0].username, "amy");
        let amy = api.find_by_username("amy").unwrap();
        assert!(verify_password(&creds[0].password, amy.password_hash.as_deref().unwrap()));
        assert!(!verify_password("s3cret-pass", amy.password_hash.as_deref().unwrap()));

        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(api.export_credentials_csv(file.path(), &creds).unwrap(), 2);
        let content = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("username,email,password,role"));
        assert!(lines.next().unwrap().starts_with("amy,amy@corp.com,"));
    }

    #[test]
    fn test_deactivate_and_delete() {
        let api = setup();
        let user = api.register_user(register_req("carl", "carl@corp.com")).unwrap();
        api.deactivate_user(&user.user_id).unwrap();
        assert!(!api.get_user(&user.user_id).unwrap().is_active);

        api.delete_user(&user.user_id).unwrap();
        assert_eq!(api.get_user(&user.user_id).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(api.delete_user(&user.user_id).unwrap_err().code(), "NOT_FOUND");
    }
}
