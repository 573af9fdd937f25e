//! 缓存集群客户端
//!
//! 在加权节点列表之上提供按键路由的 get/set/delete、单次操作超时、
//! 按键单飞以及统计。所有传输层失败都以 [`CacheError`] 返回，不会混入存储错误域。

use super::entry::CacheEntry;
use super::local::LocalCacheNode;
use super::memcache::MemCacheNode;
use super::node::CacheNode;
use super::ring::HashRing;
use super::single_flight::SingleFlight;
use super::stats::{CachePerformanceStats, CacheStats};
use crate::config::{CacheBackend, CacheConf};
use crate::error::{CacheError, CacheResult, ConfigResult, StoreError, StoreResult};
use bytes::Bytes;
use rat_logger::{debug, info};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 缓存集群客户端
pub struct CacheClient {
    nodes: Vec<Arc<dyn CacheNode>>,
    ring: HashRing,
    op_timeout: Duration,
    flight: SingleFlight<Bytes, StoreError>,
    stats: CachePerformanceStats,
}

impl CacheClient {
    /// 按集群配置创建客户端
    pub async fn new(conf: &CacheConf) -> ConfigResult<Self> {
        crate::config::builders::validate_cache_conf(conf)?;

        let mut nodes: Vec<(Arc<dyn CacheNode>, u32)> = Vec::with_capacity(conf.nodes.len());
        for node_conf in &conf.nodes {
            let node: Arc<dyn CacheNode> = match &node_conf.backend {
                CacheBackend::Local { max_entries } => {
                    Arc::new(LocalCacheNode::new(node_conf.name.clone(), *max_entries))
                }
                CacheBackend::MemCache(mem) => {
                    Arc::new(MemCacheNode::new(node_conf.name.clone(), mem).await?)
                }
            };
            nodes.push((node, node_conf.weight));
        }

        Self::from_nodes(nodes, conf.op_timeout())
    }

    /// 由已经构建好的节点创建客户端，用于接入自定义协议的节点
    pub fn from_nodes(
        nodes: Vec<(Arc<dyn CacheNode>, u32)>,
        op_timeout: Duration,
    ) -> ConfigResult<Self> {
        if nodes.is_empty() {
            return Err(crate::config_error!("至少需要一个缓存节点"));
        }
        if op_timeout.is_zero() {
            return Err(crate::config_error!("缓存操作超时不能为零"));
        }

        let weighted: Vec<(String, u32)> = nodes
            .iter()
            .map(|(node, weight)| (node.name().to_string(), *weight))
            .collect();
        let ring = HashRing::new(&weighted);
        if ring.is_empty() {
            return Err(crate::config_error!("所有缓存节点权重均为零"));
        }

        info!(
            "缓存集群客户端初始化完成: 节点={:?}, 超时={:?}",
            weighted, op_timeout
        );

        Ok(Self {
            nodes: nodes.into_iter().map(|(node, _)| node).collect(),
            ring,
            op_timeout,
            flight: SingleFlight::new(),
            stats: CachePerformanceStats::new(),
        })
    }

    /// 键所在节点的名称
    pub fn node_name_for(&self, key: &str) -> Option<&str> {
        self.ring
            .route(key)
            .and_then(|index| self.nodes.get(index))
            .map(|node| node.name())
    }

    fn node_for(&self, key: &str) -> CacheResult<&Arc<dyn CacheNode>> {
        self.ring
            .route(key)
            .and_then(|index| self.nodes.get(index))
            .ok_or(CacheError::NoNode)
    }

    async fn bounded<T, Fut>(&self, operation: &'static str, key: &str, fut: Fut) -> CacheResult<T>
    where
        Fut: Future<Output = CacheResult<T>>,
    {
        let result = match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                operation,
                key: key.to_string(),
            }),
        };
        if result.is_err() {
            self.stats.record_error();
        }
        result
    }

    /// 读取缓存条目
    pub async fn get(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let node = self.node_for(key)?;
        let start = Instant::now();
        let payload = self.bounded("get", key, node.get(key)).await?;
        self.stats.record_get_latency(start.elapsed());

        match payload {
            Some(payload) => {
                let entry = CacheEntry::from_payload(payload);
                self.stats.record_hit(entry.is_negative());
                Ok(Some(entry))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    /// 写入缓存条目
    pub async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> CacheResult<()> {
        let node = self.node_for(key)?;
        self.bounded("set", key, node.set(key, entry.into_payload(), ttl))
            .await?;
        self.stats.record_write();
        debug!("已写入缓存: key={}, ttl={:?}", key, ttl);
        Ok(())
    }

    /// 删除一组键
    ///
    /// 按节点分组并发删除，每个键都会尝试，返回遇到的第一个错误。
    /// 删除不存在的键不是错误。
    pub async fn delete<S: AsRef<str>>(&self, keys: &[S]) -> CacheResult<()> {
        let mut grouped: HashMap<usize, Vec<&str>> = HashMap::new();
        for key in keys {
            let key = key.as_ref();
            let index = self.ring.route(key).ok_or(CacheError::NoNode)?;
            let group = grouped.entry(index).or_default();
            if !group.contains(&key) {
                group.push(key);
            }
        }

        let tasks = grouped.into_iter().map(|(index, group)| async move {
            let node = &self.nodes[index];
            let mut first_error = None;
            for key in group {
                match self.bounded("delete", key, node.delete(key)).await {
                    Ok(()) => self.stats.record_delete(),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            first_error
        });

        match futures::future::join_all(tasks).await.into_iter().flatten().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 按键单飞执行 `resolve`，并发的同键调用共享同一个结果
    pub async fn single_flight<F, Fut>(&self, key: &str, resolve: F) -> StoreResult<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<Bytes>>,
    {
        self.flight.run(key, resolve).await
    }

    /// 正在回源的键数量
    pub fn in_flight(&self) -> usize {
        self.flight.in_flight()
    }

    /// 统计快照
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfBuilder;

    fn two_node_client() -> CacheClient {
        let nodes: Vec<(Arc<dyn CacheNode>, u32)> = vec![
            (Arc::new(LocalCacheNode::new("a", 1024)), 100),
            (Arc::new(LocalCacheNode::new("b", 1024)), 100),
        ];
        CacheClient::from_nodes(nodes, Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn test_new_from_conf() {
        let conf = CacheConfBuilder::new()
            .node("a", 100, CacheBackend::Local { max_entries: 64 })
            .node("b", 20, CacheBackend::Local { max_entries: 64 })
            .op_timeout_ms(100)
            .build()
            .unwrap();
        let client = CacheClient::new(&conf).await.unwrap();
        assert!(client.node_name_for("cache:user:id:1").is_some());
    }

    #[tokio::test]
    async fn test_set_get_across_nodes() {
        let client = two_node_client();
        let ttl = Duration::from_secs(60);
        for i in 0..20 {
            let key = format!("cache:user:id:{}", i);
            client
                .set(&key, CacheEntry::Populated(Bytes::from(i.to_string())), ttl)
                .await
                .unwrap();
        }
        for i in 0..20 {
            let key = format!("cache:user:id:{}", i);
            assert_eq!(
                client.get(&key).await.unwrap(),
                Some(CacheEntry::Populated(Bytes::from(i.to_string())))
            );
        }
        assert_eq!(client.stats().hits, 20);
    }

    #[tokio::test]
    async fn test_negative_entry_round_trip() {
        let client = two_node_client();
        client
            .set("cache:user:id:404", CacheEntry::Negative, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            client.get("cache:user:id:404").await.unwrap(),
            Some(CacheEntry::Negative)
        );
        assert_eq!(client.stats().negative_hits, 1);
    }

    #[tokio::test]
    async fn test_delete_many_is_idempotent() {
        let client = two_node_client();
        let ttl = Duration::from_secs(60);
        let keys: Vec<String> = (0..10).map(|i| format!("cache:user:mobile:{}", i)).collect();
        for key in &keys {
            client
                .set(key, CacheEntry::Populated(Bytes::from_static(b"{}")), ttl)
                .await
                .unwrap();
        }

        client.delete(&keys).await.unwrap();
        client.delete(&keys).await.unwrap();
        for key in &keys {
            assert_eq!(client.get(key).await.unwrap(), None);
        }
    }

    #[test]
    fn test_zero_weight_cluster_rejected() {
        let nodes: Vec<(Arc<dyn CacheNode>, u32)> =
            vec![(Arc::new(LocalCacheNode::new("a", 16)), 0)];
        assert!(CacheClient::from_nodes(nodes, Duration::from_millis(100)).is_err());
    }
}
