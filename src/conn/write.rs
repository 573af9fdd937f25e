//! 带索引的写操作
//!
//! 插入、更新、删除共享同一个约定：先执行存储写，成功后尽力删除全部相关缓存键。
//! 存储写失败时缓存保持不变；缓存删除失败只记录日志，写操作仍然成功。

use super::CachedConn;
use crate::error::StoreResult;
use rat_logger::{debug, warn};
use std::fmt;
use std::future::Future;

#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKind::Insert => write!(f, "插入"),
            WriteKind::Update => write!(f, "更新"),
            WriteKind::Delete => write!(f, "删除"),
        }
    }
}

impl CachedConn {
    /// 插入记录并失效 `keys`
    pub async fn insert_index<R, F, Fut, S>(&self, exec: F, keys: &[S]) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
        S: AsRef<str>,
    {
        self.write_index(WriteKind::Insert, exec, keys).await
    }

    /// 插入记录，失效的键由写入结果计算
    ///
    /// 用于主键由存储分配的场景：新主键对应的缓存键也必须失效。
    pub async fn insert_index_with<R, F, Fut, K>(&self, exec: F, keys_of: K) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
        K: FnOnce(&R) -> Vec<String>,
    {
        let result = self.exec_store(WriteKind::Insert, exec).await?;
        let keys = keys_of(&result);
        self.invalidate(WriteKind::Insert, &keys).await;
        Ok(result)
    }

    /// 更新记录并失效 `keys`
    ///
    /// `keys` 应当是更新前与更新后两组索引键的并集，否则旧属性值对应的缓存
    /// 会一直保留到过期。
    pub async fn update_index<R, F, Fut, S>(&self, exec: F, keys: &[S]) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
        S: AsRef<str>,
    {
        self.write_index(WriteKind::Update, exec, keys).await
    }

    /// 删除记录并失效 `keys`
    pub async fn del_index<R, F, Fut, S>(&self, exec: F, keys: &[S]) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
        S: AsRef<str>,
    {
        self.write_index(WriteKind::Delete, exec, keys).await
    }

    async fn write_index<R, F, Fut, S>(&self, kind: WriteKind, exec: F, keys: &[S]) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
        S: AsRef<str>,
    {
        let result = self.exec_store(kind, exec).await?;
        self.invalidate(kind, keys).await;
        Ok(result)
    }

    async fn exec_store<R, F, Fut>(&self, kind: WriteKind, exec: F) -> StoreResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<R>>,
    {
        self.run_store(exec()).await.inspect_err(|e| {
            warn!("{}操作失败，缓存保持不变: {}", kind, e);
        })
    }

    async fn invalidate<S: AsRef<str>>(&self, kind: WriteKind, keys: &[S]) {
        if keys.is_empty() {
            return;
        }
        match self.cache.delete(keys).await {
            Ok(()) => debug!("{}后已失效缓存键: {:?}", kind, keys.iter().map(|k| k.as_ref()).collect::<Vec<_>>()),
            Err(e) => warn!(
                "{}成功但缓存失效失败，旧数据将在过期后消失: keys={:?}, 错误: {}",
                kind,
                keys.iter().map(|k| k.as_ref()).collect::<Vec<_>>(),
                e
            ),
        }
    }
}
