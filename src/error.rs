//! 错误类型定义
//!
//! 缓存旁路层有两个互相独立的错误域：
//! - [`StoreError`]：存储侧错误，`NotFound` 是正常结果，其余一律透传给调用者
//! - [`CacheError`]：缓存侧错误，只记录日志，永远不会让一次已经成功的写操作失败
//!
//! 另有 [`ConfigError`] 用于启动阶段的配置与初始化。

use thiserror::Error;

/// 存储操作错误
///
/// 需要 `Clone`，单飞回源时同一个结果要分发给所有等待者。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 记录不存在
    #[error("记录不存在")]
    NotFound,

    /// 其他存储错误（连接、约束、超时等）
    #[error("存储操作失败: {message}")]
    Other { message: String },
}

impl StoreError {
    /// 构造其他存储错误
    pub fn other(message: impl std::fmt::Display) -> Self {
        StoreError::Other {
            message: message.to_string(),
        }
    }

    /// 是否为记录不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

#[cfg(feature = "sqlite-support")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// 缓存操作错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// 节点连接或读写失败
    #[error("缓存节点 {node} 操作失败: {message}")]
    Connection { node: String, message: String },

    /// 操作超时
    #[error("缓存操作超时: {operation} {key}")]
    Timeout { operation: &'static str, key: String },

    /// 序列化失败
    #[error("缓存数据序列化失败: {message}")]
    Serialization { message: String },

    /// 没有可用节点
    #[error("没有可用的缓存节点")]
    NoNode,
}

/// 配置与初始化错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置项缺失或非法
    #[error("配置错误: {message}")]
    Invalid { message: String },

    /// 配置文件解析失败
    #[error("配置文件解析失败: {message}")]
    Parse { message: String },

    /// 文件读写失败
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 日志初始化失败
    #[error("日志初始化失败: {message}")]
    Logging { message: String },

    /// 存储或缓存连接建立失败
    #[error("连接初始化失败: {message}")]
    Connection { message: String },
}

/// 存储操作结果
pub type StoreResult<T> = Result<T, StoreError>;

/// 缓存操作结果
pub type CacheResult<T> = Result<T, CacheError>;

/// 配置结果
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 快速构造存储错误
#[macro_export]
macro_rules! store_error {
    (not_found) => {
        $crate::error::StoreError::NotFound
    };
    (other, $msg:expr) => {
        $crate::error::StoreError::Other {
            message: ($msg).to_string(),
        }
    };
}

/// 快速构造配置错误
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::ConfigError::Invalid {
            message: ($msg).to_string(),
        }
    };
}
