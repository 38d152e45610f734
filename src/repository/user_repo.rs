// ==========================================
// BrightEat 团餐拼单系统 - 用户目录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::types::UserRole;
use crate::domain::user::User;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::enum_at;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const USER_COLUMNS: &str = r#"
    user_id, username, email, first_name, last_name, role,
    phone, instapay_link, is_active, password_hash, date_joined
"#;

// ==========================================
// UserRepository - 用户仓储
// ==========================================
/// 职责: 管理 users 表的 CRUD 操作
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入用户
    pub fn insert(&self, user: &User) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, user)
    }

    /// 插入用户（在调用方事务内）
    pub fn insert_tx(conn: &Connection, user: &User) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO users (
                user_id, username, email, first_name, last_name, role,
                phone, instapay_link, is_active, password_hash, date_joined
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                user.user_id,
                user.username,
                user.email,
                user.first_name,
                user.last_name,
                user.role.to_db_str(),
                user.phone,
                user.instapay_link,
                user.is_active,
                user.password_hash,
                user.date_joined,
            ],
        )?;
        Ok(())
    }

    /// 更新密码哈希
    pub fn update_password_hash(&self, user_id: &str, password_hash: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE user_id = ?2",
            params![password_hash, user_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("User", user_id));
        }
        Ok(())
    }

    /// 设置启用状态
    pub fn set_active(&self, user_id: &str, is_active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE users SET is_active = ?1 WHERE user_id = ?2",
            params![is_active, user_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("User", user_id));
        }
        Ok(())
    }

    /// 删除用户
    ///
    /// 已有明细或付款记录的用户受外键 RESTRICT 保护,删除会失败
    pub fn delete(&self, user_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, user_id)
    }

    pub fn find_by_id_tx(conn: &Connection, user_id: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS);
        let user = conn
            .query_row(&sql, params![user_id], map_user_row)
            .optional()?;
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = conn
            .query_row(&sql, params![username], map_user_row)
            .optional()?;
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        let user = conn
            .query_row(&sql, params![email], map_user_row)
            .optional()?;
        Ok(user)
    }

    pub fn username_exists(&self, username: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1",
                params![username],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn email_exists(&self, email: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row("SELECT 1 FROM users WHERE email = ?1", params![email], |_row| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// 查询全部用户（按用户名排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map([], map_user_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    /// 按角色查询
    pub fn list_by_role(&self, role: UserRole) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users WHERE role = ?1 ORDER BY username", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map(params![role.to_db_str()], map_user_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    /// 按ID批量查询（保持入参顺序,忽略不存在的ID）
    pub fn find_by_ids_tx(conn: &Connection, user_ids: &[String]) -> RepositoryResult<Vec<User>> {
        let mut users = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            if let Some(user) = Self::find_by_id_tx(conn, id)? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

fn map_user_row(row: &Row<'_>) -> SqliteResult<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        role: enum_at(row, 5, UserRole::from_db_str)?,
        phone: row.get(6)?,
        instapay_link: row.get(7)?,
        is_active: row.get(8)?,
        password_hash: row.get(9)?,
        date_joined: row.get::<_, NaiveDateTime>(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> UserRepository {
        let conn = crate::db::open_in_memory().unwrap();
        UserRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup();
        let user = User::new("alice".to_string(), Some("alice@example.com".to_string()), UserRole::User)
            .with_name("Alice", "Smith");
        repo.insert(&user).unwrap();

        let found = repo.find_by_id(&user.user_id).unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.first_name, "Alice");
        assert_eq!(found.role, UserRole::User);
        assert!(found.is_active);

        assert!(repo.username_exists("alice").unwrap());
        assert!(repo.email_exists("alice@example.com").unwrap());
        assert!(repo.find_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let repo = setup();
        repo.insert(&User::new("alice".to_string(), None, UserRole::User)).unwrap();
        let err = repo
            .insert(&User::new("alice".to_string(), None, UserRole::Manager))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_list_sorted_and_by_role() {
        let repo = setup();
        repo.insert(&User::new("zed".to_string(), None, UserRole::User)).unwrap();
        repo.insert(&User::new("amy".to_string(), None, UserRole::Manager)).unwrap();

        let names: Vec<String> = repo.list_all().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert_eq!(repo.list_by_role(UserRole::Manager).unwrap().len(), 1);
    }

    #[test]
    fn test_password_and_active_updates() {
        let repo = setup();
        let user = User::new("alice".to_string(), None, UserRole::User);
        repo.insert(&user).unwrap();

        repo.update_password_hash(&user.user_id, "$argon2id$dummy").unwrap();
        repo.set_active(&user.user_id, false).unwrap();
        let found = repo.find_by_id(&user.user_id).unwrap().unwrap();
        assert_eq!(found.password_hash.as_deref(), Some("$argon2id$dummy"));
        assert!(!found.is_active);

        assert!(matches!(
            repo.set_active("missing", true),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
