use crate::config::Config;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use tracing::{error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// 创建新的数据库实例并执行迁移
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // 内存库只存在于单个连接中，必须固定该连接
        let pool_options = if config.is_memory_database() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.database_max_connections)
        };

        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// 执行内嵌迁移
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 开始事务
    pub async fn begin_transaction(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::new(&config).await.unwrap();
        assert!(db.verify_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_enforces_unique_follow() {
        let db = Database::new(&Config::default()).await.unwrap();
        sqlx::query("INSERT INTO users (username, created_at) VALUES ('a', '2022-01-01T00:00:00Z'), ('b', '2022-01-01T00:00:00Z')")
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO follows (user_id, author_id) VALUES (1, 2)")
            .execute(&db.pool)
            .await
            .unwrap();
        let duplicate = sqlx::query("INSERT INTO follows (user_id, author_id) VALUES (1, 2)")
            .execute(&db.pool)
            .await;
        assert!(duplicate.is_err());
    }
}
