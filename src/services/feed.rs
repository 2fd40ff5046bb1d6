use crate::{
    error::Result,
    models::{group::Group, post::PostView, user::*},
    services::{post::POST_VIEW_SELECT, Database, FollowService, GroupService, UserService},
    utils::pagination::{paginate, Page},
};
use sqlx::Sqlite;
use std::sync::Arc;
use tracing::debug;

/// 信息流范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// 全部帖子
    Global,
    /// 某个分组的帖子
    Group(i64),
    /// 某个作者的帖子
    Author(i64),
    /// 某个用户关注的作者们的帖子
    FollowedBy(i64),
}

impl FeedScope {
    fn filter(&self) -> (&'static str, Option<i64>) {
        match self {
            FeedScope::Global => ("", None),
            FeedScope::Group(id) => ("WHERE p.group_id = ?", Some(*id)),
            FeedScope::Author(id) => ("WHERE p.author_id = ?", Some(*id)),
            FeedScope::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)",
                Some(*id),
            ),
        }
    }
}

/// 信息流组装：按创建时间倒序分页
#[derive(Clone)]
pub struct FeedService {
    db: Arc<Database>,
    user_service: UserService,
    group_service: GroupService,
    follow_service: FollowService,
    per_page: usize,
}

impl FeedService {
    pub async fn new(
        db: Arc<Database>,
        user_service: UserService,
        group_service: GroupService,
        follow_service: FollowService,
        per_page: usize,
    ) -> Result<Self> {
        Ok(Self {
            db,
            user_service,
            group_service,
            follow_service,
            per_page,
        })
    }

    /// 按范围取一页帖子
    pub async fn feed(&self, scope: FeedScope, page: Option<&str>) -> Result<Page<PostView>> {
        debug!("Fetching {:?} feed, page {:?}", scope, page);
        let (filter, param) = scope.filter();

        let count_sql = format!("SELECT COUNT(*) FROM posts p {}", filter);
        let mut count_query = sqlx::query_scalar::<Sqlite, i64>(&count_sql);
        if let Some(param) = param {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.db.pool).await?.max(0) as usize;

        let window = paginate(total, self.per_page, page);

        let list_sql = format!(
            "{} {} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
            POST_VIEW_SELECT, filter
        );
        let mut list_query = sqlx::query_as::<Sqlite, PostView>(&list_sql);
        if let Some(param) = param {
            list_query = list_query.bind(param);
        }
        let items = list_query
            .bind(window.limit() as i64)
            .bind(window.offset() as i64)
            .fetch_all(&self.db.pool)
            .await?;

        Ok(Page::new(items, window))
    }

    pub async fn global_feed(&self, page: Option<&str>) -> Result<Page<PostView>> {
        self.feed(FeedScope::Global, page).await
    }

    /// 分组信息流，slug 不存在时返回 NotFound
    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<(Group, Page<PostView>)> {
        let group = self.group_service.require_by_slug(slug).await?;
        let posts = self.feed(FeedScope::Group(group.id), page).await?;
        Ok((group, posts))
    }

    /// 作者主页信息流，附带访问者是否已关注该作者
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&User>,
        page: Option<&str>,
    ) -> Result<(Profile, Page<PostView>)> {
        let author = self.user_service.require_by_username(username).await?;
        let posts = self.feed(FeedScope::Author(author.id), page).await?;

        let is_following = match viewer {
            Some(viewer) => self.follow_service.is_following(viewer.id, author.id).await?,
            None => false,
        };
        let is_self = viewer.map_or(false, |viewer| viewer.id == author.id);

        let profile = Profile {
            post_count: posts.total as i64,
            author,
            is_following,
            is_self,
        };
        Ok((profile, posts))
    }

    /// 关注信息流：访问者关注的作者们的帖子
    pub async fn follow_feed(&self, viewer: &User, page: Option<&str>) -> Result<Page<PostView>> {
        self.feed(FeedScope::FollowedBy(viewer.id), page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{group::CreateGroupRequest, post::PostForm};
    use crate::services::testing::{fixture, Fixture};

    #[tokio::test]
    async fn test_thirteen_posts_paginate_ten_and_three() {
        let Fixture { posts, feeds, author, group, .. } = fixture().await;
        let mut ids = Vec::new();
        for n in 0..13 {
            let post = posts
                .create_post(&author, PostForm::new(format!("post {}", n)).with_group(group.id))
                .await
                .unwrap();
            ids.push(post.id);
        }
        ids.reverse();

        for feed in [
            feeds.global_feed(None).await.unwrap(),
            feeds.group_feed(&group.slug, None).await.unwrap().1,
            feeds.profile_feed(&author.username, None, None).await.unwrap().1,
        ] {
            assert_eq!(feed.len(), 10);
            assert_eq!(feed.num_pages, 2);
            let page_ids: Vec<i64> = feed.items.iter().map(|p| p.id).collect();
            assert_eq!(page_ids, ids[..10].to_vec());
        }

        let second = feeds.global_feed(Some("2")).await.unwrap();
        assert_eq!(second.len(), 3);
        let page_ids: Vec<i64> = second.items.iter().map(|p| p.id).collect();
        assert_eq!(page_ids, ids[10..].to_vec());

        // 超出范围返回最后一页
        let beyond = feeds.global_feed(Some("7")).await.unwrap();
        assert_eq!(beyond.number, 2);
        assert_eq!(beyond.len(), 3);
    }

    #[tokio::test]
    async fn test_post_only_in_its_group() {
        let Fixture { posts, feeds, groups, author, group, .. } = fixture().await;
        let other = groups
            .create_group(CreateGroupRequest {
                title: "Other".to_string(),
                slug: Some("other".to_string()),
                description: String::new(),
            })
            .await
            .unwrap();

        let post = posts.create_post(&author, PostForm::new("in A").with_group(group.id)).await.unwrap();

        let (_, in_a) = feeds.group_feed(&group.slug, None).await.unwrap();
        assert!(in_a.items.iter().any(|p| p.id == post.id));

        let (_, in_b) = feeds.group_feed(&other.slug, None).await.unwrap();
        assert!(in_b.items.iter().all(|p| p.id != post.id));
    }

    #[tokio::test]
    async fn test_unknown_scopes_not_found() {
        let Fixture { feeds, .. } = fixture().await;
        assert!(matches!(feeds.group_feed("nope", None).await.unwrap_err(), AppError::NotFound(_)));
        assert!(matches!(
            feeds.profile_feed("nobody", None, None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_profile_is_following_flag() {
        let Fixture { feeds, follows, author, reader, .. } = fixture().await;

        let (profile, _) = feeds.profile_feed(&author.username, None, None).await.unwrap();
        assert!(!profile.is_following);

        let (profile, _) = feeds.profile_feed(&author.username, Some(&reader), None).await.unwrap();
        assert!(!profile.is_following);
        assert!(!profile.is_self);

        follows.follow(&reader, &author.username).await.unwrap();
        let (profile, _) = feeds.profile_feed(&author.username, Some(&reader), None).await.unwrap();
        assert!(profile.is_following);

        let (profile, _) = feeds.profile_feed(&author.username, Some(&author), None).await.unwrap();
        assert!(profile.is_self);
    }

    #[tokio::test]
    async fn test_follow_feed() {
        let Fixture { posts, feeds, follows, author, reader, .. } = fixture().await;

        assert!(feeds.follow_feed(&reader, None).await.unwrap().is_empty());

        let post = posts.create_post(&author, PostForm::new("followed")).await.unwrap();
        assert!(feeds.follow_feed(&reader, None).await.unwrap().is_empty());

        follows.follow(&reader, &author.username).await.unwrap();
        let feed = feeds.follow_feed(&reader, None).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.items[0].id, post.id);

        // 作者自己的关注流不包含自己的帖子
        assert!(feeds.follow_feed(&author, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_deletion_keeps_posts() {
        let Fixture { posts, feeds, groups, author, group, .. } = fixture().await;
        let post = posts.create_post(&author, PostForm::new("orphan").with_group(group.id)).await.unwrap();

        groups.delete_group(&group.slug).await.unwrap();

        let view = posts.get_post(post.id).await.unwrap();
        assert_eq!(view.group_id, None);
        assert_eq!(feeds.global_feed(None).await.unwrap().total, 1);
    }
}
