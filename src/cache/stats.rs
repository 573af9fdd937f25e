//! 缓存统计模块
//!
//! 高频计数使用原子变量，读取时生成快照

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 缓存性能计数器
#[derive(Debug, Default)]
pub struct CachePerformanceStats {
    /// 命中记录
    hits: AtomicU64,
    /// 命中空值占位
    negative_hits: AtomicU64,
    /// 未命中
    misses: AtomicU64,
    /// 写入次数
    writes: AtomicU64,
    /// 删除次数
    deletes: AtomicU64,
    /// 缓存错误次数（含超时）
    errors: AtomicU64,
    /// 总读取延迟（纳秒）
    total_get_latency_ns: AtomicU64,
    /// 读取次数
    get_count: AtomicU64,
}

impl CachePerformanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self, negative: bool) {
        if negative {
            self.negative_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_get_latency(&self, elapsed: Duration) {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        self.total_get_latency_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// 生成统计快照
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let negative_hits = self.negative_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let get_count = self.get_count.load(Ordering::Relaxed);
        let total = hits + negative_hits + misses;

        CacheStats {
            hits,
            negative_hits,
            misses,
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                (hits + negative_hits) as f64 / total as f64
            },
            avg_get_latency_ms: if get_count == 0 {
                0.0
            } else {
                (self.total_get_latency_ns.load(Ordering::Relaxed) as f64 / get_count as f64)
                    / 1_000_000.0
            },
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// 命中记录次数
    pub hits: u64,
    /// 命中空值占位次数
    pub negative_hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 写入次数
    pub writes: u64,
    /// 删除次数
    pub deletes: u64,
    /// 错误次数
    pub errors: u64,
    /// 命中率（含空值占位）
    pub hit_rate: f64,
    /// 平均读取延迟（毫秒）
    pub avg_get_latency_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CachePerformanceStats::new();
        stats.record_hit(false);
        stats.record_hit(true);
        stats.record_miss();
        stats.record_miss();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.negative_hits, 1);
        assert_eq!(snapshot.misses, 2);
        assert!((snapshot.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(CachePerformanceStats::new().snapshot(), CacheStats::default());
    }
}
