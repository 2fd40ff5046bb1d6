use crate::{
    error::{AppError, Result},
    models::{comment::CommentForm, group::Group, post::*, user::User},
    state::AppState,
    utils::{
        http::{found, post_detail_url, profile_url},
        middleware::{OptionalAuth, RequireAuth},
    },
};
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts/:post_id/", get(post_detail))
        .route("/create/", get(create_form).post(create_post))
        .route("/posts/:post_id/edit/", get(edit_form).post(edit_post))
        .route("/posts/:post_id/comment/", post(add_comment))
}

/// 路径中的帖子 ID 非数字时等同于不存在
fn parse_post_id(raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| AppError::not_found("Post"))
}

fn group_choices(groups: &[Group], selected: Option<&str>) -> Vec<Value> {
    groups
        .iter()
        .map(|group| {
            json!({
                "id": group.id,
                "title": group.title,
                "selected": selected == Some(group.id.to_string().as_str()),
            })
        })
        .collect()
}

/// 渲染创建/编辑表单
async fn render_form(
    state: &AppState,
    viewer: &User,
    form: &PostForm,
    errors: Vec<String>,
    editing: Option<i64>,
) -> Result<Response> {
    let groups = state.group_service.list_groups().await?;
    let title = if editing.is_some() { "Edit post" } else { "New post" };
    let html = state.templates.render(
        "create_post",
        &json!({
            "title": title,
            "is_edit": editing.is_some(),
            "post_id": editing,
            "form": form,
            "groups": group_choices(&groups, form.group.as_deref()),
            "errors": errors,
            "viewer": viewer,
        }),
    )?;
    Ok(Html(html).into_response())
}

/// 帖子详情
/// GET /posts/:post_id/
pub async fn post_detail(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Html<String>> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.post_service.get_post(post_id).await?;
    let comments = state.comment_service.get_post_comments(post_id).await?;
    let author_post_count = state.user_service.post_count(post.author_id).await?;
    let can_edit = viewer.as_ref().map_or(false, |viewer| viewer.id == post.author_id);
    let title: String = post.text.chars().take(30).collect();

    let html = state.templates.render(
        "post_detail",
        &json!({
            "title": title,
            "post": post,
            "comments": comments,
            "author_post_count": author_post_count,
            "can_edit": can_edit,
            "viewer": viewer,
        }),
    )?;
    Ok(Html(html))
}

/// 新建帖子表单
/// GET /create/
pub async fn create_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    render_form(&state, &user, &PostForm::default(), Vec::new(), None).await
}

/// 创建帖子，成功后跳转到作者主页
/// POST /create/
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    debug!("Creating post for user: {}", user.username);

    match state.post_service.create_post(&user, form.clone()).await {
        Ok(_) => Ok(found(&profile_url(&user.username))),
        Err(e) if e.is_validation() => render_form(&state, &user, &form, e.form_messages(), None).await,
        Err(e) => Err(e),
    }
}

/// 编辑表单；非作者跳转到详情页
/// GET /posts/:post_id/edit/
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.post_service.get_post(post_id).await?;

    if post.author_id != user.id {
        return Ok(found(&post_detail_url(post_id)));
    }

    render_form(&state, &user, &PostForm::from_post(&post), Vec::new(), Some(post_id)).await
}

/// 保存编辑，非作者静默跳转到详情页且不做修改
/// POST /posts/:post_id/edit/
pub async fn edit_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;

    match state.post_service.edit_post(&user, post_id, form.clone()).await {
        Ok(_) => Ok(found(&post_detail_url(post_id))),
        Err(AppError::Authorization(_)) => Ok(found(&post_detail_url(post_id))),
        Err(e) if e.is_validation() => {
            render_form(&state, &user, &form, e.form_messages(), Some(post_id)).await
        }
        Err(e) => Err(e),
    }
}

/// 添加评论；无效评论被丢弃，始终跳转到详情页
/// POST /posts/:post_id/comment/
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;

    match state.comment_service.add_comment(&user, post_id, form).await {
        Ok(_) => {}
        Err(e) if e.is_validation() => {
            debug!("Dropping invalid comment on post {}: {}", post_id, e);
        }
        Err(e) => return Err(e),
    }

    Ok(found(&post_detail_url(post_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_id() {
        assert_eq!(parse_post_id("12").unwrap(), 12);
        assert!(matches!(parse_post_id("abc").unwrap_err(), AppError::NotFound(_)));
    }

    #[test]
    fn test_group_choices_marks_selected() {
        let groups = vec![
            Group { id: 1, title: "A".into(), slug: "a".into(), description: String::new() },
            Group { id: 2, title: "B".into(), slug: "b".into(), description: String::new() },
        ];
        let choices = group_choices(&groups, Some("2"));
        assert_eq!(choices[0]["selected"], false);
        assert_eq!(choices[1]["selected"], true);
    }
}
