use crate::{
    error::Result,
    state::AppState,
    utils::{http::{found, profile_url}, middleware::RequireAuth},
};
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile/:username/follow/", get(profile_follow))
        .route("/profile/:username/unfollow/", get(profile_unfollow))
}

/// 关注作者
/// GET /profile/:username/follow/
async fn profile_follow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Response> {
    debug!("User {} following user {}", user.username, username);

    state.follow_service.follow(&user, &username).await?;

    Ok(found(&profile_url(&username)))
}

/// 取消关注作者
/// GET /profile/:username/unfollow/
async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Response> {
    debug!("User {} unfollowing user {}", user.username, username);

    state.follow_service.unfollow(&user, &username).await?;

    Ok(found(&profile_url(&username)))
}
