use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub login_url: String,

    // Content settings
    pub posts_per_page: usize,

    // Cache configuration
    pub index_cache_ttl: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "yatube=debug,tower_http=debug".to_string(),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 5,
            jwt_secret: "development-secret".to_string(),
            jwt_expiry_hours: 24,
            login_url: "/auth/login/".to_string(),
            posts_per_page: crate::utils::pagination::POSTS_PER_PAGE,
            index_cache_ttl: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        // 生产环境必须显式配置密钥
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "development" => defaults.jwt_secret,
            Err(_) => anyhow::bail!("JWT_SECRET must be set"),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://yatube.db".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            jwt_secret,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()?,
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),

            posts_per_page: env::var("POSTS_PER_PAGE")
                .unwrap_or_else(|_| defaults.posts_per_page.to_string())
                .parse()?,

            index_cache_ttl: env::var("INDEX_CACHE_TTL")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_memory_database(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}
