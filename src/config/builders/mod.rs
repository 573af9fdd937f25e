//! # 配置构建器模块
//!
//! 提供所有配置类型的构建器实现，支持链式调用和严格验证

pub mod app_builder;
pub mod cache_builder;
pub mod logging_builder;
pub mod ttl_builder;

pub use app_builder::AppConfigBuilder;
pub use cache_builder::{CacheConfBuilder, validate_cache_conf};
pub use logging_builder::LoggingConfigBuilder;
pub use ttl_builder::{TtlConfBuilder, validate_ttl_conf};
