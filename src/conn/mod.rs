//! 缓存旁路连接
//!
//! [`CachedConn`] 组合缓存集群客户端与调用方提供的存储操作，实现四个带索引的原语：
//! 插入、查找、更新、删除。对记录类型是泛型的，不感知具体实体。
//!
//! 一致性模型：
//! - 写操作只失效、不回写：存储写成功后删除操作涉及的全部缓存键
//! - 读操作未命中时按键单飞回源，记录写入缓存，不存在则写入较短过期的空值占位
//! - 缓存侧的任何失败只记录日志，调用者只会看到存储错误

mod find;
mod write;

use crate::cache::{CacheClient, CacheEntry};
use crate::config::TtlPolicy;
use crate::error::{CacheError, CacheResult, StoreError, StoreResult};
use bytes::Bytes;
use rat_logger::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// 缓存旁路连接
pub struct CachedConn {
    cache: Arc<CacheClient>,
    ttl: TtlPolicy,
    store_timeout: Option<Duration>,
}

impl CachedConn {
    pub fn new(cache: Arc<CacheClient>, ttl: TtlPolicy) -> Self {
        Self {
            cache,
            ttl,
            store_timeout: None,
        }
    }

    /// 为每次存储操作设置超时，超时按存储错误处理
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    pub fn cache(&self) -> &CacheClient {
        &self.cache
    }

    pub fn ttl(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// 执行一次存储操作
    pub(crate) async fn run_store<R, Fut>(&self, fut: Fut) -> StoreResult<R>
    where
        Fut: Future<Output = StoreResult<R>>,
    {
        match self.store_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::other(format!("存储操作超时({:?})", limit)))?,
            None => fut.await,
        }
    }

    /// 不经过缓存直接查询存储
    pub async fn query_no_cache<R, F, Fut>(&self, query: F) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
    {
        self.run_store(query()).await
    }

    /// 不触碰缓存直接执行存储写操作
    ///
    /// 调用者自行负责之后的缓存失效。
    pub async fn exec_no_cache<R, F, Fut>(&self, exec: F) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
    {
        self.run_store(exec()).await
    }

    /// 读取缓存中的记录，空值占位与未命中都返回 `None`
    pub async fn get_cache<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.cache.get(key).await? {
            Some(CacheEntry::Populated(payload)) => decode(&payload).map(Some),
            Some(CacheEntry::Negative) | None => Ok(None),
        }
    }

    /// 写入记录到缓存，用于预热
    pub async fn set_cache<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let payload = encode(value)?;
        self.cache
            .set(key, CacheEntry::Populated(payload), self.ttl.populated_ttl())
            .await
    }

    /// 删除缓存键，用于手工驱逐
    pub async fn del_cache<S: AsRef<str>>(&self, keys: &[S]) -> CacheResult<()> {
        self.cache.delete(keys).await
    }

    /// 回写缓存，失败只记录日志
    async fn write_back(&self, key: &str, entry: CacheEntry) {
        let ttl = if entry.is_negative() {
            self.ttl.not_found_ttl()
        } else {
            self.ttl.populated_ttl()
        };
        match self.cache.set(key, entry, ttl).await {
            Ok(()) => debug!("回源结果已写入缓存: key={}", key),
            Err(e) => warn!("回源结果写入缓存失败，调用者不受影响: key={}, 错误: {}", key, e),
        }
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> CacheResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| CacheError::Serialization {
            message: e.to_string(),
        })
}

pub(crate) fn decode<T: DeserializeOwned>(payload: &[u8]) -> CacheResult<T> {
    serde_json::from_slice(payload).map_err(|e| CacheError::Serialization {
        message: e.to_string(),
    })
}
