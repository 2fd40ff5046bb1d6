use crate::{
    error::AppError,
    models::user::User,
    services::auth::SESSION_COOKIE,
    state::AppState,
    utils::http::found,
};
use axum::{
    extract::State,
    headers::Cookie,
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
    TypedHeader,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 认证中间件
///
/// 从 `Authorization: Bearer` 头或 `session` cookie 中读取令牌；
/// 校验失败时请求按匿名处理。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    cookie: Option<TypedHeader<Cookie>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Response {
    let token = bearer_token(&headers).or_else(|| {
        cookie
            .as_ref()
            .and_then(|TypedHeader(cookie)| cookie.get(SESSION_COOKIE))
            .map(str::to_string)
    });

    if let Some(token) = token {
        match app_state.auth_service.verify_jwt(&token) {
            Ok(claims) => match app_state.user_service.get_or_create(&claims.sub).await {
                Ok(user) => {
                    debug!("Authenticated user: {} ({})", user.username, user.id);
                    request.extensions_mut().insert(user);
                }
                Err(e) => {
                    warn!("Token subject {:?} could not be provisioned, request stays anonymous: {}", claims.sub, e);
                }
            },
            Err(e) => {
                debug!("JWT verification failed: {}", e);
            }
        }
    }

    next.run(request).await
}

/// 请求日志中间件
pub async fn request_logging_middleware(
    request: Request<Body>,
    next: Next<Body>,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {} [{}]", method, uri, request_id);

    let response = next.run(request).await;

    let elapsed = start_time.elapsed();
    let status = response.status();

    info!(
        "Request completed: {} {} {} - {}ms [{}]",
        method,
        uri,
        status.as_u16(),
        elapsed.as_millis(),
        request_id
    );

    response
}

/// 请求 ID 中间件
pub async fn request_id_middleware(
    mut request: Request<Body>,
    next: Next<Body>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// 请求 ID 包装器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned();
        Ok(OptionalAuth(user))
    }
}

/// 必需认证提取器，未登录时 302 跳转到登录页并携带 `next`
pub struct RequireAuth(pub User);

#[async_trait::async_trait]
impl axum::extract::FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>().cloned() {
            Some(user) => Ok(RequireAuth(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!("Anonymous request to {} redirected to login", next);
                Err(found(&state.auth_service.login_redirect(next)))
            }
        }
    }
}
