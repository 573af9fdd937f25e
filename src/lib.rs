//! rat_cacheaside - 多索引缓存旁路数据访问层
//!
//! 在存储之前加一层按键寻址的缓存集群：
//! - 读：先查缓存，未命中时按键单飞回源，记录与“不存在”都会被缓存
//! - 写：先写存储，成功后失效记录的全部索引键
//! - 缓存故障只降级为直接访问存储，不会让调用失败
//!
//! 一条记录可以通过主键或任意唯一二级索引被查到，每个索引键各自缓存一份完整记录。

pub mod cache;
pub mod config;
pub mod conn;
pub mod context;
pub mod error;
pub mod logging;
pub mod model;

pub use cache::{CacheClient, CacheEntry, CacheNode, CacheStats, LocalCacheNode, MemCacheNode};
pub use config::{
    AppConfig, AppConfigBuilder, CacheBackend, CacheConf, CacheNodeConf, LogLevel, LoggingConfig,
    LoggingConfigBuilder, TtlConf, TtlPolicy,
};
pub use conn::CachedConn;
pub use context::ServiceContext;
pub use error::{CacheError, CacheResult, ConfigError, ConfigResult, StoreError, StoreResult};
pub use logging::init_logging;
pub use model::{IndexKeySet, IndexedRecord, KeyPrefix};

#[cfg(feature = "sqlite-support")]
pub use model::{Student, StudentModel, User, UserModel};

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
