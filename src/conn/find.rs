//! 带索引的查找

use super::{CachedConn, decode, encode};
use crate::cache::CacheEntry;
use crate::error::{StoreError, StoreResult};
use rat_logger::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

impl CachedConn {
    /// 按缓存键查找记录
    ///
    /// - 命中记录：直接反序列化返回，不访问存储
    /// - 命中空值占位：返回 `NotFound`，不访问存储
    /// - 未命中：按键单飞，只有一个调用者执行 `query`，结果写回缓存后分发给所有调用者
    /// - 读缓存失败：同样单飞回源，但不回写缓存
    pub async fn find_index<T, F, Fut>(&self, key: &str, query: F) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        match self.cache.get(key).await {
            Ok(Some(CacheEntry::Populated(payload))) => match decode::<T>(&payload) {
                Ok(record) => {
                    debug!("缓存命中: key={}", key);
                    return Ok(record);
                }
                Err(e) => {
                    warn!("缓存数据无法解析，按未命中处理: key={}, 错误: {}", key, e);
                    if let Err(e) = self.cache.delete(&[key]).await {
                        warn!("删除损坏的缓存数据失败: key={}, 错误: {}", key, e);
                    }
                }
            },
            Ok(Some(CacheEntry::Negative)) => {
                debug!("命中空值占位: key={}", key);
                return Err(StoreError::NotFound);
            }
            Ok(None) => {
                debug!("缓存未命中: key={}", key);
            }
            Err(e) => {
                warn!("读取缓存失败，直接回源且不回写: key={}, 错误: {}", key, e);
                return self.resolve(key, query, false).await;
            }
        }

        self.resolve(key, query, true).await
    }

    async fn resolve<T, F, Fut>(&self, key: &str, query: F, write_back: bool) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let payload = self
            .cache
            .single_flight(key, move || async move {
                if write_back {
                    // 前一个执行者可能刚刚写好缓存
                    if let Ok(Some(entry)) = self.cache.get(key).await {
                        match entry {
                            CacheEntry::Populated(payload) if decode::<T>(&payload).is_ok() => {
                                return Ok(payload);
                            }
                            CacheEntry::Populated(_) => {
                                debug!("缓存数据仍无法解析，继续回源: key={}", key);
                            }
                            CacheEntry::Negative => return Err(StoreError::NotFound),
                        }
                    }
                }

                match self.run_store(query()).await {
                    Ok(record) => {
                        let payload = encode(&record).map_err(StoreError::other)?;
                        if write_back {
                            self.write_back(key, CacheEntry::Populated(payload.clone()))
                                .await;
                        }
                        Ok(payload)
                    }
                    Err(StoreError::NotFound) => {
                        if write_back {
                            self.write_back(key, CacheEntry::Negative).await;
                        }
                        Err(StoreError::NotFound)
                    }
                    Err(e) => {
                        warn!("回源查询失败，不写缓存: key={}, 错误: {}", key, e);
                        Err(e)
                    }
                }
            })
            .await?;

        decode(&payload).map_err(|e| {
            StoreError::other(format!("记录反序列化失败: key={}, 错误: {}", key, e))
        })
    }
}
