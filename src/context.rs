//! 服务上下文
//!
//! 启动时构建一次，持有配置、缓存旁路连接与存储连接池，
//! 以引用形式交给各实体模型，不使用进程级全局变量。

use crate::cache::CacheClient;
use crate::config::{AppConfig, TtlPolicy};
use crate::conn::CachedConn;
use crate::error::ConfigResult;
use rat_logger::info;
use std::sync::Arc;

#[cfg(feature = "sqlite-support")]
use crate::error::ConfigError;
#[cfg(feature = "sqlite-support")]
use crate::model::{StudentModel, UserModel};
#[cfg(feature = "sqlite-support")]
use sqlx::SqlitePool;
#[cfg(feature = "sqlite-support")]
use sqlx::sqlite::SqlitePoolOptions;

/// 服务上下文
pub struct ServiceContext {
    config: AppConfig,
    conn: Arc<CachedConn>,
    #[cfg(feature = "sqlite-support")]
    pool: SqlitePool,
}

impl ServiceContext {
    /// 按配置建立缓存集群客户端与存储连接池
    pub async fn new(config: AppConfig) -> ConfigResult<Self> {
        config.validate()?;

        let cache = Arc::new(CacheClient::new(&config.cache).await?);
        let conn = Arc::new(CachedConn::new(cache, TtlPolicy::from(&config.ttl)));

        #[cfg(feature = "sqlite-support")]
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.dsn)
            .await
            .map_err(|e| ConfigError::Connection {
                message: format!("连接存储失败: {}", e),
            })?;

        info!(
            "服务上下文初始化完成: 缓存节点 {} 个, 存储连接池上限 {}",
            config.cache.nodes.len(),
            config.max_connections
        );

        Ok(Self {
            config,
            conn,
            #[cfg(feature = "sqlite-support")]
            pool,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn conn(&self) -> Arc<CachedConn> {
        self.conn.clone()
    }

    #[cfg(feature = "sqlite-support")]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[cfg(feature = "sqlite-support")]
    pub fn user_model(&self) -> UserModel {
        UserModel::new(self.conn.clone(), self.pool.clone())
    }

    #[cfg(feature = "sqlite-support")]
    pub fn student_model(&self) -> StudentModel {
        StudentModel::new(self.conn.clone(), self.pool.clone())
    }
}
