//! 缓存模块
//!
//! 缓存集群客户端及其组成部分：节点抽象与两种节点实现、加权一致性哈希、
//! 按键单飞、缓存条目编解码和统计。

pub mod client;
pub mod entry;
pub mod local;
pub mod memcache;
pub mod node;
pub mod ring;
pub mod single_flight;
pub mod stats;

pub use client::CacheClient;
pub use entry::{CacheEntry, NOT_FOUND_PLACEHOLDER};
pub use local::LocalCacheNode;
pub use memcache::MemCacheNode;
pub use node::CacheNode;
pub use ring::HashRing;
pub use single_flight::SingleFlight;
pub use stats::{CachePerformanceStats, CacheStats};
