//! 基于 rat_memcache 的缓存节点
//!
//! L1 为内存缓存，配置了 L2 时启用磁盘缓存。

use super::node::CacheNode;
use crate::config::{CacheStrategy, MemCacheConf};
use crate::error::{CacheError, CacheResult, ConfigError, ConfigResult};
use async_trait::async_trait;
use bytes::Bytes;
use rat_logger::{debug, info};
use rat_memcache::types::EvictionStrategy;
use rat_memcache::{CacheOptions, RatMemCache, RatMemCacheBuilder};
use std::path::PathBuf;
use std::time::Duration;

/// rat_memcache 节点
pub struct MemCacheNode {
    name: String,
    cache: RatMemCache,
}

impl MemCacheNode {
    /// 按节点配置创建 rat_memcache 实例
    pub async fn new<S: Into<String>>(name: S, config: &MemCacheConf) -> ConfigResult<Self> {
        let name = name.into();
        debug!("创建缓存节点: name={}, 配置: {:?}", name, config);

        let l2 = config.l2.as_ref();
        let builder = RatMemCacheBuilder::new()
            .l1_config(rat_memcache::config::L1Config {
                max_memory: config.max_memory_mb * 1024 * 1024,
                max_entries: config.max_capacity,
                eviction_strategy: match config.strategy {
                    CacheStrategy::Lru => EvictionStrategy::Lru,
                    CacheStrategy::Lfu => EvictionStrategy::Lfu,
                    CacheStrategy::Fifo => EvictionStrategy::Fifo,
                },
            })
            .l2_config(rat_memcache::config::L2Config {
                enable_l2_cache: l2.is_some(),
                data_dir: l2.map(|c| PathBuf::from(&c.storage_path)),
                max_disk_size: l2
                    .map(|c| c.max_disk_mb as u64 * 1024 * 1024)
                    .unwrap_or(500 * 1024 * 1024),
                write_buffer_size: 64 * 1024 * 1024,
                max_write_buffer_number: 3,
                block_cache_size: 16 * 1024 * 1024,
                enable_lz4: l2.is_some(),
                compression_threshold: 1024,
                compression_max_threshold: 1024 * 10,
                compression_level: l2.map(|c| c.compression_level).unwrap_or(6),
                background_threads: 2,
                clear_on_startup: l2.map(|c| c.clear_on_startup).unwrap_or(false),
                cache_size_mb: l2.map(|c| c.max_disk_mb).unwrap_or(500),
                max_file_size_mb: l2.map(|c| c.max_disk_mb / 2).unwrap_or(250),
                smart_flush_enabled: true,
                smart_flush_base_interval_ms: 100,
                smart_flush_min_interval_ms: 20,
                smart_flush_max_interval_ms: 500,
                smart_flush_write_rate_threshold: 10000,
                smart_flush_accumulated_bytes_threshold: 4 * 1024 * 1024,
                cache_warmup_strategy: rat_memcache::config::CacheWarmupStrategy::Recent,
                zstd_compression_level: None,
                l2_write_strategy: "write_through".to_string(),
                l2_write_threshold: 1024,
                l2_write_ttl_threshold: 3600,
            })
            .ttl_config(rat_memcache::config::TtlConfig {
                expire_seconds: None,
                cleanup_interval: 60,
                max_cleanup_entries: 1000,
                lazy_expiration: true,
                active_expiration: true,
            })
            .performance_config(rat_memcache::config::PerformanceConfig {
                worker_threads: 4,
                enable_concurrency: true,
                read_write_separation: true,
                batch_size: 1000,
                enable_warmup: false,
                large_value_threshold: 10240,
            })
            .logging_config(rat_memcache::config::LoggingConfig {
                level: "WARN".to_string(),
                enable_colors: false,
                show_timestamp: true,
                enable_performance_logs: false,
                enable_audit_logs: false,
                enable_cache_logs: false,
                enable_logging: false,
                enable_async: false,
                batch_size: 2048,
                batch_interval_ms: 25,
                buffer_size: 16384,
            });

        let cache = builder.build().await.map_err(|e| ConfigError::Connection {
            message: format!("创建缓存节点 {} 失败: {}", name, e),
        })?;

        info!(
            "缓存节点初始化成功 - 名称: {}, L1容量: {}, L1内存: {}MB, L2磁盘: {}MB, 策略: {:?}",
            name,
            config.max_capacity,
            config.max_memory_mb,
            l2.map(|c| c.max_disk_mb).unwrap_or(0),
            config.strategy
        );

        Ok(Self { name, cache })
    }

    fn node_error(&self, e: impl std::fmt::Display) -> CacheError {
        CacheError::Connection {
            node: self.name.clone(),
            message: e.to_string(),
        }
    }
}

/// rat_memcache 以秒为粒度，向上取整且至少 1 秒
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

#[async_trait]
impl CacheNode for MemCacheNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        self.cache.get(key).await.map_err(|e| self.node_error(e))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> CacheResult<()> {
        let options = CacheOptions {
            ttl_seconds: Some(ttl_seconds(ttl)),
            ..Default::default()
        };
        self.cache
            .set_with_options(key.to_string(), value, &options)
            .await
            .map(|_| ())
            .map_err(|e| self.node_error(e))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.cache
            .delete(key)
            .await
            .map(|_| ())
            .map_err(|e| self.node_error(e))
    }
}
