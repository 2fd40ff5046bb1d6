use crate::{
    error::Result,
    state::AppState,
    utils::{
        cache::index_page_key,
        middleware::{OptionalAuth, RequireAuth},
    },
};
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, Uri},
    response::Html,
    routing::get,
    Router,
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// `page` 查询参数。重复出现时取最后一个，无法解析的查询串视为未提供。
#[derive(Debug, Default)]
pub struct PageParam(pub Option<String>);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for PageParam
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let pairs = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        Ok(PageParam(last_page(pairs)))
    }
}

fn last_page(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .filter(|(key, _)| key == "page")
        .map(|(_, value)| value)
        .last()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route("/follow/", get(follow_index))
}

/// 首页：全部帖子，渲染结果按完整请求地址缓存
/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    PageParam(page): PageParam,
) -> Result<Html<String>> {
    let key = index_page_key(uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"));

    if let Some(html) = state.index_cache.get(&key) {
        debug!("Index cache hit: {}", key);
        return Ok(Html(html));
    }

    // 查询前记录缓存代数，期间若被清空则不回写旧渲染
    let generation = state.index_cache.generation();
    let page = state.feed_service.global_feed(page.as_deref()).await?;
    let html = state.templates.render(
        "index",
        &json!({
            "title": "Latest posts",
            "page": page,
        }),
    )?;

    if !state.index_cache.set_if_generation(key, html.clone(), generation) {
        debug!("Index cache cleared during render, result not stored");
    }
    Ok(Html(html))
}

/// 分组信息流
/// GET /group/:slug/
pub async fn group_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    PageParam(page): PageParam,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Html<String>> {
    let (group, page) = state.feed_service.group_feed(&slug, page.as_deref()).await?;

    let html = state.templates.render(
        "group_list",
        &json!({
            "title": group.title,
            "group": group,
            "page": page,
            "viewer": viewer,
        }),
    )?;
    Ok(Html(html))
}

/// 作者主页
/// GET /profile/:username/
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    PageParam(page): PageParam,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Html<String>> {
    let (profile, page) = state
        .feed_service
        .profile_feed(&username, viewer.as_ref(), page.as_deref())
        .await?;

    let html = state.templates.render(
        "profile",
        &json!({
            "title": format!("Profile of {}", profile.author.username),
            "profile": profile,
            "page": page,
            "viewer": viewer,
        }),
    )?;
    Ok(Html(html))
}

/// 关注的作者们的帖子
/// GET /follow/
pub async fn follow_index(
    State(state): State<Arc<AppState>>,
    RequireAuth(viewer): RequireAuth,
    PageParam(page): PageParam,
) -> Result<Html<String>> {
    let page = state.feed_service.follow_feed(&viewer, page.as_deref()).await?;

    let html = state.templates.render(
        "follow",
        &json!({
            "title": "Following",
            "page": page,
            "viewer": viewer,
        }),
    )?;
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_last_page_wins() {
        assert_eq!(last_page(pairs(&[])), None);
        assert_eq!(last_page(pairs(&[("sort", "new")])), None);
        assert_eq!(last_page(pairs(&[("page", "3")])).as_deref(), Some("3"));
        assert_eq!(
            last_page(pairs(&[("page", "1"), ("q", "x"), ("page", "2")])).as_deref(),
            Some("2")
        );
    }
}
