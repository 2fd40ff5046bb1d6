use crate::{
    error::{AppError, Result},
    models::comment::*,
    models::user::User,
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 为帖子添加评论
    pub async fn add_comment(&self, author: &User, post_id: i64, form: CommentForm) -> Result<Comment> {
        debug!("Creating comment for post: {}", post_id);

        let mut tx = self.db.begin_transaction().await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(AppError::not_found("Post"));
        }

        form.validate()?;

        let text = form.text.trim().to_string();
        let created_at = Utc::now();

        let id = sqlx::query("INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)")
            .bind(post_id)
            .bind(author.id)
            .bind(&text)
            .bind(created_at)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        tx.commit().await?;

        info!("Created comment {} on post {} by {}", id, post_id, author.username);
        Ok(Comment {
            id,
            post_id,
            author_id: author.id,
            text,
            created_at,
        })
    }

    /// 帖子的全部评论，按时间先后排列
    pub async fn get_post_comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
                SELECT
                    c.id,
                    c.post_id,
                    c.author_id,
                    u.username AS author_username,
                    c.text,
                    c.created_at
                FROM comments c
                JOIN users u ON u.id = c.author_id
                WHERE c.post_id = ?
                ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(comments)
    }
}
