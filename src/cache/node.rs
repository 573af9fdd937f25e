//! 缓存节点抽象
//!
//! 集群客户端只依赖这个 trait，具体传输协议由实现决定。

use crate::error::CacheResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// 单个缓存节点
#[async_trait]
pub trait CacheNode: Send + Sync {
    /// 节点名称
    fn name(&self) -> &str;

    /// 读取键，不存在或已过期时返回 `None`
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    /// 写入键并设置过期时间
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> CacheResult<()>;

    /// 删除键，键不存在时视为成功
    async fn delete(&self, key: &str) -> CacheResult<()>;
}
