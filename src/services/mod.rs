pub mod database;
pub mod auth;
pub mod user;
pub mod group;
pub mod post;
pub mod comment;
pub mod follow;
pub mod feed;

// 重新导出常用类型
pub use database::Database;
pub use auth::AuthService;
pub use user::UserService;
pub use group::GroupService;
pub use post::PostService;
pub use comment::CommentService;
pub use follow::FollowService;
pub use feed::{FeedScope, FeedService};
