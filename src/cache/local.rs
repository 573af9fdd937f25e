//! 进程内缓存节点
//!
//! 适合单实例部署和测试。过期采用惰性检查，写满时先清理过期键，
//! 仍然写满则按写入顺序淘汰最早的键。

use super::node::CacheNode;
use crate::error::CacheResult;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 单条目过期时间上限
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

struct LocalEntry {
    value: Bytes,
    expire_at: Instant,
}

/// 进程内缓存节点
pub struct LocalCacheNode {
    name: String,
    max_entries: usize,
    entries: DashMap<String, LocalEntry>,
    /// 写入顺序，用于写满时淘汰
    order: Mutex<VecDeque<String>>,
}

impl LocalCacheNode {
    pub fn new<S: Into<String>>(name: S, max_entries: usize) -> Self {
        Self {
            name: name.into(),
            max_entries: max_entries.max(1),
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
        }
    }

    /// 当前条目数（含尚未清理的过期条目）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self) {
        if self.entries.len() < self.max_entries {
            return;
        }

        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expire_at > now);

        let mut order = self.order.lock();
        order.retain(|key| self.entries.contains_key(key));
        while self.entries.len() >= self.max_entries {
            match order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheNode for LocalCacheNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expire_at > Instant::now() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.expire_at <= Instant::now());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> CacheResult<()> {
        if !self.entries.contains_key(key) {
            self.make_room();
            let mut order = self.order.lock();
            order.push_back(key.to_string());
            // 惰性过期移除的键仍留在队列里
            if order.len() > self.max_entries * 2 {
                order.retain(|queued| queued == key || self.entries.contains_key(queued));
            }
        }
        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            LocalEntry {
                value,
                expire_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        if self.entries.remove(key).is_some() {
            self.order.lock().retain(|queued| queued != key);
        }
        Ok(())
    }
}
