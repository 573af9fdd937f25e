//! 集成测试公共工具

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use rat_cacheaside::{
    CacheClient, CacheError, CacheNode, CacheResult, CachedConn, LocalCacheNode, StoreError,
    StoreResult, TtlPolicy,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// 可注入故障的缓存节点，正常时委托给进程内节点
///
/// 读、写、删三类操作可以分别设置故障。
pub struct FlakyNode {
    inner: LocalCacheNode,
    failing_gets: AtomicBool,
    failing_sets: AtomicBool,
    failing_deletes: AtomicBool,
}

impl FlakyNode {
    pub fn new() -> Self {
        Self {
            inner: LocalCacheNode::new("flaky", 1024),
            failing_gets: AtomicBool::new(false),
            failing_sets: AtomicBool::new(false),
            failing_deletes: AtomicBool::new(false),
        }
    }

    /// 所有操作同时失败或恢复
    pub fn set_failing(&self, failing: bool) {
        self.set_failing_gets(failing);
        self.set_failing_sets(failing);
        self.set_failing_deletes(failing);
    }

    pub fn set_failing_gets(&self, failing: bool) {
        self.failing_gets.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_sets(&self, failing: bool) {
        self.failing_sets.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_deletes(&self, failing: bool) {
        self.failing_deletes.store(failing, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> CacheResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::Connection {
                node: "flaky".to_string(),
                message: "连接被拒绝".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CacheNode for FlakyNode {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        Self::check(&self.failing_gets)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> CacheResult<()> {
        Self::check(&self.failing_sets)?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        Self::check(&self.failing_deletes)?;
        self.inner.delete(key).await
    }
}

/// 单节点缓存旁路连接，返回节点句柄用于注入故障
pub fn flaky_conn(ttl: TtlPolicy) -> (CachedConn, Arc<FlakyNode>) {
    let node = Arc::new(FlakyNode::new());
    let nodes: Vec<(Arc<dyn CacheNode>, u32)> = vec![(node.clone(), 100)];
    let client = CacheClient::from_nodes(nodes, Duration::from_millis(200)).unwrap();
    (CachedConn::new(Arc::new(client), ttl), node)
}

/// 无抖动的过期策略
pub fn fixed_ttl(expiry: Duration, not_found_expiry: Duration) -> TtlPolicy {
    TtlPolicy::new(expiry, not_found_expiry, 0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
}

pub fn book(id: i64, title: &str) -> Book {
    Book {
        id,
        title: title.to_string(),
    }
}

pub type StoreFuture<T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send>>;

/// 记录调用次数的存储桩
#[derive(Clone, Default)]
pub struct CountingStore {
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 返回固定结果的存储操作，`delay` 模拟存储耗时
    pub fn op<T: Send + 'static>(
        &self,
        result: StoreResult<T>,
        delay: Duration,
    ) -> impl FnOnce() -> StoreFuture<T> + use<T> {
        let calls = self.calls.clone();
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }) as StoreFuture<T>
        }
    }

    pub fn found(&self, record: Book) -> impl FnOnce() -> StoreFuture<Book> + use<> {
        self.op(Ok(record), Duration::ZERO)
    }

    pub fn missing(&self) -> impl FnOnce() -> StoreFuture<Book> + use<> {
        self.op(Err(StoreError::NotFound), Duration::ZERO)
    }

    pub fn failing<T: Send + 'static>(&self, message: &str) -> impl FnOnce() -> StoreFuture<T> + use<T> {
        self.op(Err(StoreError::other(message)), Duration::ZERO)
    }
}
