use crate::{
    error::Result,
    models::follow::*,
    models::user::User,
    services::{Database, UserService},
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
    user_service: UserService,
}

impl FollowService {
    pub async fn new(db: Arc<Database>, user_service: UserService) -> Result<Self> {
        Ok(Self { db, user_service })
    }

    /// 关注作者。
    ///
    /// 关注自己或重复关注都是无操作；目标用户不存在时返回 NotFound。
    pub async fn follow(&self, follower: &User, target_username: &str) -> Result<()> {
        debug!("User {} following {}", follower.username, target_username);

        let author = self.user_service.require_by_username(target_username).await?;

        if follower.id == author.id {
            debug!("Ignoring self-follow by {}", follower.username);
            return Ok(());
        }

        let result = sqlx::query(
            "INSERT INTO follows (user_id, author_id) VALUES (?, ?) ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(follower.id)
        .bind(author.id)
        .execute(&self.db.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("User {} followed {}", follower.username, author.username);
        }
        Ok(())
    }

    /// 取消关注；不存在关注关系时为无操作
    pub async fn unfollow(&self, follower: &User, target_username: &str) -> Result<()> {
        debug!("User {} unfollowing {}", follower.username, target_username);

        let author = self.user_service.require_by_username(target_username).await?;

        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(follower.id)
            .bind(author.id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("User {} unfollowed {}", follower.username, author.username);
        }
        Ok(())
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count > 0)
    }

    /// 用户发出的全部关注边
    pub async fn get_following(&self, user_id: i64) -> Result<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>("SELECT * FROM follows WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;
        Ok(follows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::testing::{fixture, Fixture};

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let Fixture { follows, author, reader, .. } = fixture().await;

        follows.follow(&reader, &author.username).await.unwrap();
        follows.follow(&reader, &author.username).await.unwrap();

        let edges = follows.get_following(reader.id).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].author_id, author.id);
        assert!(follows.is_following(reader.id, author.id).await.unwrap());
        assert!(!follows.is_following(author.id, reader.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_ignored() {
        let Fixture { follows, author, .. } = fixture().await;
        follows.follow(&author, &author.username).await.unwrap();
        assert!(follows.get_following(author.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfollow_then_unfollow_again() {
        let Fixture { follows, author, reader, .. } = fixture().await;

        follows.follow(&reader, &author.username).await.unwrap();
        follows.unfollow(&reader, &author.username).await.unwrap();
        assert!(follows.get_following(reader.id).await.unwrap().is_empty());

        follows.unfollow(&reader, &author.username).await.unwrap();
        assert!(follows.get_following(reader.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let Fixture { follows, reader, .. } = fixture().await;
        assert!(matches!(follows.follow(&reader, "ghost").await.unwrap_err(), AppError::NotFound(_)));
        assert!(matches!(follows.unfollow(&reader, "ghost").await.unwrap_err(), AppError::NotFound(_)));
    }
}
