use crate::{
    error::{AppError, Result},
    models::post::*,
    models::user::User,
    services::Database,
    utils::cache::Cache,
};
use chrono::Utc;
use sqlx::{Executor, Sqlite};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// 帖子视图的公共查询（作者与分组已连接）
pub(crate) const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id,
        p.text,
        p.created_at,
        p.image,
        p.author_id,
        u.username AS author_username,
        p.group_id,
        g.slug AS group_slug,
        g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// 帖子内容服务：创建、编辑、删除帖子并维护首页缓存
#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    index_cache: Cache<String>,
}

impl PostService {
    pub async fn new(db: Arc<Database>, index_cache: Cache<String>) -> Result<Self> {
        Ok(Self { db, index_cache })
    }

    /// 创建帖子
    pub async fn create_post(&self, author: &User, form: PostForm) -> Result<Post> {
        debug!("Creating post for user: {}", author.username);

        form.validate()?;
        let group_id = form.group_id()?;
        ensure_group_exists(&self.db.pool, group_id).await?;

        let text = form.text.trim().to_string();
        let image = form.image_path();
        let created_at = Utc::now();

        let id = sqlx::query(
            "INSERT INTO posts (text, created_at, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&text)
        .bind(created_at)
        .bind(author.id)
        .bind(group_id)
        .bind(&image)
        .execute(&self.db.pool)
        .await?
        .last_insert_rowid();

        self.invalidate_index();

        info!("Created post: {} by user: {}", id, author.username);
        Ok(Post {
            id,
            text,
            created_at,
            author_id: author.id,
            group_id,
            image,
        })
    }

    /// 编辑帖子。
    ///
    /// 依次检查：帖子存在（NotFound）、请求者为作者（Authorization）、
    /// 表单有效（Validation）。创建时间保持不变；未提供新图片时保留原图。
    pub async fn edit_post(&self, requester: &User, post_id: i64, form: PostForm) -> Result<Post> {
        debug!("Updating post: {} by user: {}", post_id, requester.username);

        let mut tx = self.db.begin_transaction().await?;

        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.author_id != requester.id {
            warn!("User {} attempted to edit post {} owned by {}", requester.id, post_id, post.author_id);
            return Err(AppError::forbidden("Only the author may edit this post"));
        }

        form.validate()?;
        let group_id = form.group_id()?;
        ensure_group_exists(&mut *tx, group_id).await?;

        let text = form.text.trim().to_string();
        let image = form.image_path().or(post.image);

        sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(&text)
            .bind(group_id)
            .bind(&image)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.invalidate_index();

        info!("Updated post: {} by user: {}", post_id, requester.username);
        Ok(Post {
            id: post.id,
            text,
            created_at: post.created_at,
            author_id: post.author_id,
            group_id,
            image,
        })
    }

    /// 获取帖子详情
    pub async fn get_post(&self, post_id: i64) -> Result<PostView> {
        let sql = format!("{} WHERE p.id = ?", POST_VIEW_SELECT);
        sqlx::query_as::<_, PostView>(&sql)
            .bind(post_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 删除帖子（评论级联删除）。首页缓存不会因此失效。
    pub async fn delete_post(&self, post_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post"));
        }

        info!("Deleted post: {}", post_id);
        Ok(())
    }

    fn invalidate_index(&self) {
        debug!("Invalidating index page cache");
        self.index_cache.clear();
    }
}

/// 分组引用必须指向已存在的分组
async fn ensure_group_exists<'e, E>(executor: E, group_id: Option<i64>) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let Some(group_id) = group_id else {
        return Ok(());
    };

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_groups WHERE id = ?")
        .bind(group_id)
        .fetch_one(executor)
        .await?;

    if exists == 0 {
        return Err(AppError::validation("Select a valid choice"));
    }
    Ok(())
}
