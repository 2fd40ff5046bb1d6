use crate::{
    error::{AppError, Result},
    models::user::*,
    services::Database,
    utils::validation::{validate_subject, validate_username},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// 用户服务，处理用户相关的业务逻辑
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    /// 创建新的用户服务实例
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 创建新用户，用户名重复时返回校验错误
    pub async fn create_user(&self, username: &str) -> Result<User> {
        debug!("Creating user: {}", username);
        validate_username(username)?;

        if self.get_by_username(username).await?.is_some() {
            return Err(AppError::Validation(format!(
                "A user with username {} already exists",
                username
            )));
        }

        let created_at = Utc::now();
        let id = sqlx::query("INSERT INTO users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(created_at)
            .execute(&self.db.pool)
            .await?
            .last_insert_rowid();

        info!("Created user {} ({})", username, id);
        Ok(User {
            id,
            username: username.to_string(),
            created_at,
        })
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(user)
    }

    /// 按用户名查找，不存在时返回 NotFound
    pub async fn require_by_username(&self, username: &str) -> Result<User> {
        self.get_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 获取或创建用户（认证成功的主体首次访问时建立本地记录）
    ///
    /// 用户名来自已验证的令牌，只做长度检查，格式不受本地注册规则约束。
    pub async fn get_or_create(&self, username: &str) -> Result<User> {
        validate_subject(username)?;

        sqlx::query("INSERT INTO users (username, created_at) VALUES (?, ?) ON CONFLICT (username) DO NOTHING")
            .bind(username)
            .bind(Utc::now())
            .execute(&self.db.pool)
            .await?;

        self.require_by_username(username).await
    }

    /// 作者的帖子总数
    pub async fn post_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = ?")
            .bind(user_id)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count)
    }
}
