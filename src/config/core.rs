//! # 配置管理模块 - 核心配置类型
//!
//! 应用启动时构建一次，通过 [`crate::context::ServiceContext`] 显式传递，
//! 不存在包级全局配置。

use crate::error::{ConfigError, ConfigResult};
use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 存储连接串
    pub dsn: String,
    /// 存储连接池最大连接数
    pub max_connections: u32,
    /// 缓存集群配置
    pub cache: CacheConf,
    /// 过期时间配置
    #[serde(default)]
    pub ttl: TtlConf,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 缓存集群配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConf {
    /// 缓存节点列表，按权重分配流量
    pub nodes: Vec<CacheNodeConf>,
    /// 单次缓存操作超时（毫秒）
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

fn default_op_timeout_ms() -> u64 {
    500
}

impl CacheConf {
    /// 创建缓存集群配置构建器
    pub fn builder() -> super::builders::CacheConfBuilder {
        super::builders::CacheConfBuilder::new()
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// 单个缓存节点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheNodeConf {
    /// 节点名称，同时作为一致性哈希的虚拟节点种子
    pub name: String,
    /// 权重，决定流量占比
    pub weight: u32,
    /// 节点后端
    pub backend: CacheBackend,
}

/// 缓存节点后端
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheBackend {
    /// 进程内节点
    Local {
        /// 最大条目数
        max_entries: usize,
    },
    /// 基于 rat_memcache 的节点（L1 内存 + 可选 L2 磁盘）
    #[serde(rename = "memcache")]
    MemCache(MemCacheConf),
}

/// rat_memcache 节点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemCacheConf {
    /// 淘汰策略
    pub strategy: CacheStrategy,
    /// L1 最大条目数
    pub max_capacity: usize,
    /// L1 最大内存（MB）
    pub max_memory_mb: usize,
    /// L2 磁盘缓存（可选）
    pub l2: Option<L2CacheConf>,
}

/// 淘汰策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStrategy {
    /// LRU（最近最少使用）
    Lru,
    /// LFU（最少使用频率）
    Lfu,
    /// FIFO（先进先出）
    Fifo,
}

/// L2 缓存配置（磁盘缓存）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2CacheConf {
    /// 存储路径
    pub storage_path: String,
    /// 最大磁盘使用（MB）
    pub max_disk_mb: usize,
    /// 压缩级别
    pub compression_level: i32,
    /// 启动时清空缓存目录
    pub clear_on_startup: bool,
}

/// 过期时间配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlConf {
    /// 正常记录过期时间（秒）
    pub expiry_secs: u64,
    /// 空值占位过期时间（秒）
    pub not_found_expiry_secs: u64,
    /// 过期时间抖动比例
    #[serde(default = "default_deviation")]
    pub deviation: f64,
}

fn default_deviation() -> f64 {
    0.05
}

impl Default for TtlConf {
    fn default() -> Self {
        Self {
            expiry_secs: 7 * 24 * 3600,
            not_found_expiry_secs: 60,
            deviation: default_deviation(),
        }
    }
}

impl TtlConf {
    /// 创建过期时间配置构建器
    pub fn builder() -> super::builders::TtlConfBuilder {
        super::builders::TtlConfBuilder::new()
    }
}

/// 运行时过期策略
///
/// 写入缓存时在基准时长上叠加随机抖动，避免同一批写入的键同时过期。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtlPolicy {
    pub expiry: Duration,
    pub not_found_expiry: Duration,
    pub deviation: f64,
}

impl TtlPolicy {
    /// 抖动比例限制在 `[0, 0.99]`，非有限值按不抖动处理
    pub fn new(expiry: Duration, not_found_expiry: Duration, deviation: f64) -> Self {
        let deviation = if deviation.is_finite() {
            deviation.clamp(0.0, 0.99)
        } else {
            0.0
        };
        Self {
            expiry,
            not_found_expiry,
            deviation,
        }
    }

    /// 正常记录的过期时间（含抖动）
    pub fn populated_ttl(&self) -> Duration {
        self.around(self.expiry)
    }

    /// 空值占位的过期时间（含抖动）
    pub fn not_found_ttl(&self) -> Duration {
        self.around(self.not_found_expiry)
    }

    fn around(&self, base: Duration) -> Duration {
        if self.deviation <= 0.0 {
            return base;
        }
        use rand::Rng;
        let factor = rand::thread_rng().gen_range((1.0 - self.deviation)..=(1.0 + self.deviation));
        Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(base)
    }
}

impl From<&TtlConf> for TtlPolicy {
    fn from(conf: &TtlConf) -> Self {
        TtlPolicy::new(
            Duration::from_secs(conf.expiry_secs),
            Duration::from_secs(conf.not_found_expiry_secs),
            conf.deviation,
        )
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::from(&TtlConf::default())
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否输出到控制台，关闭时不安装日志处理器
    pub console: bool,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 错误级别
    Error,
    /// 警告级别
    Warn,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
    /// 跟踪级别
    Trace,
}

impl AppConfig {
    /// 创建应用配置构建器
    pub fn builder() -> super::builders::AppConfigBuilder {
        super::builders::AppConfigBuilder::new()
    }

    /// 从配置文件加载配置
    ///
    /// 扩展名为 `toml` 时按 TOML 解析，否则按 JSON 解析。
    pub fn from_file<P: AsRef<std::path::Path>>(config_path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(config_path.as_ref())?;

        let config: AppConfig = if is_toml(config_path.as_ref()) {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                message: format!("解析TOML配置文件失败: {}", e),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                message: format!("解析JSON配置文件失败: {}", e),
            })?
        };
        config.validate()?;

        info!("从文件加载配置: {:?}", config_path.as_ref());
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, config_path: P) -> ConfigResult<()> {
        let content = if is_toml(config_path.as_ref()) {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
                message: format!("序列化TOML配置失败: {}", e),
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
                message: format!("序列化JSON配置失败: {}", e),
            })?
        };

        std::fs::write(config_path.as_ref(), content)?;

        info!("保存配置到文件: {:?}", config_path.as_ref());
        Ok(())
    }

    /// 校验配置，文件加载与构建器共用
    pub fn validate(&self) -> ConfigResult<()> {
        if self.dsn.trim().is_empty() {
            return Err(crate::config_error!("存储连接串不能为空"));
        }
        if self.max_connections == 0 {
            return Err(crate::config_error!("连接池最大连接数不能为零"));
        }
        super::builders::validate_cache_conf(&self.cache)?;
        super::builders::validate_ttl_conf(&self.ttl)?;
        Ok(())
    }
}

fn is_toml(path: &std::path::Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}
