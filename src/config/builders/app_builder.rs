//! # 应用配置构建器模块
//!
//! 提供应用配置的构建器实现，支持链式调用和严格验证

use crate::config::core::{AppConfig, CacheConf, LoggingConfig, TtlConf};
use crate::error::ConfigResult;
use rat_logger::info;

/// 应用配置构建器
#[derive(Debug)]
pub struct AppConfigBuilder {
    dsn: Option<String>,
    max_connections: Option<u32>,
    cache: Option<CacheConf>,
    ttl: Option<TtlConf>,
    logging: Option<LoggingConfig>,
}

impl AppConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            dsn: None,
            max_connections: None,
            cache: None,
            ttl: None,
            logging: None,
        }
    }

    /// 设置存储连接串
    pub fn dsn<S: Into<String>>(mut self, dsn: S) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    /// 设置连接池最大连接数
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// 设置缓存集群配置
    pub fn cache(mut self, cache: CacheConf) -> Self {
        self.cache = Some(cache);
        self
    }

    /// 设置过期时间配置
    pub fn ttl(mut self, ttl: TtlConf) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// 设置日志配置
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// 构建应用配置
    ///
    /// # 错误
    ///
    /// 如果任何必需的配置项未设置，将返回错误
    pub fn build(self) -> ConfigResult<AppConfig> {
        let dsn = self
            .dsn
            .ok_or_else(|| crate::config_error!("存储连接串必须设置"))?;
        let max_connections = self
            .max_connections
            .ok_or_else(|| crate::config_error!("连接池最大连接数必须设置"))?;
        let cache = self
            .cache
            .ok_or_else(|| crate::config_error!("缓存集群配置必须设置"))?;
        let ttl = self
            .ttl
            .ok_or_else(|| crate::config_error!("过期时间配置必须设置"))?;
        let logging = self
            .logging
            .ok_or_else(|| crate::config_error!("日志配置必须设置"))?;

        let config = AppConfig {
            dsn,
            max_connections,
            cache,
            ttl,
            logging,
        };
        config.validate()?;

        info!(
            "创建应用配置: 缓存节点数={}, 连接数={}",
            config.cache.nodes.len(),
            config.max_connections
        );
        Ok(config)
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
