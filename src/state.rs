use crate::{
    config::Config,
    error::Result,
    services::{
        database::Database,
        auth::AuthService,
        user::UserService,
        group::GroupService,
        post::PostService,
        comment::CommentService,
        follow::FollowService,
        feed::FeedService,
    },
    templates::Templates,
    utils::cache::Cache,
};
use std::sync::Arc;
use std::time::Duration;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 分组服务
    pub group_service: GroupService,

    /// 帖子服务
    pub post_service: PostService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 关注服务
    pub follow_service: FollowService,

    /// 信息流服务
    pub feed_service: FeedService,

    /// 页面模板
    pub templates: Templates,

    /// 首页渲染结果缓存
    pub index_cache: Cache<String>,
}

impl AppState {
    /// 连接数据库并初始化所有服务
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(&config).await?);
        db.verify_connection().await?;
        Self::with_database(config, db).await
    }

    pub async fn with_database(config: Config, db: Arc<Database>) -> Result<Self> {
        let index_cache = Cache::new(Duration::from_secs(config.index_cache_ttl));

        let auth_service = AuthService::new(&config).await?;
        let user_service = UserService::new(db.clone()).await?;
        let group_service = GroupService::new(db.clone()).await?;
        let post_service = PostService::new(db.clone(), index_cache.clone()).await?;
        let comment_service = CommentService::new(db.clone()).await?;
        let follow_service = FollowService::new(db.clone(), user_service.clone()).await?;
        let feed_service = FeedService::new(
            db.clone(),
            user_service.clone(),
            group_service.clone(),
            follow_service.clone(),
            config.posts_per_page,
        )
        .await?;
        let templates = Templates::new()?;

        Ok(Self {
            config,
            db,
            auth_service,
            user_service,
            group_service,
            post_service,
            comment_service,
            follow_service,
            feed_service,
            templates,
            index_cache,
        })
    }
}
