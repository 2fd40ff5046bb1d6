use crate::{config::Config, error::{AppError, Result}};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 会话 cookie 名称
pub const SESSION_COOKIE: &str = "session";

/// 认证服务：校验身份提供方签发的 JWT
#[derive(Clone)]
pub struct AuthService {
    config: Config,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户名
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    /// 为用户名签发令牌
    pub fn issue_token(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiry_hours)).timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;
        Ok(token)
    }

    /// 登录跳转地址，`next` 中保留斜杠
    pub fn login_redirect(&self, next: &str) -> String {
        let next = urlencoding::encode(next).replace("%2F", "/");
        format!("{}?next={}", self.config.login_url, next)
    }
}
