use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// 个人主页头部信息
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub author: User,
    pub post_count: i64,
    /// 当前访问者是否已关注该作者（匿名访问恒为 false）
    pub is_following: bool,
    /// 当前访问者是否就是该作者
    pub is_self: bool,
}
