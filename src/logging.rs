//! 日志初始化
//!
//! 库本身从不安装日志处理器，由调用方在启动时调用 [`init_logging`]。

use crate::config::{LogLevel, LoggingConfig};
use crate::error::{ConfigError, ConfigResult};
use rat_logger::handler::term::TermConfig;
use rat_logger::{LevelFilter, LoggerBuilder};

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// 按配置初始化全局日志
///
/// `console` 关闭时不安装任何处理器，直接返回。
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<()> {
    if !config.console {
        return Ok(());
    }

    LoggerBuilder::new()
        .with_level(LevelFilter::from(config.level))
        .add_terminal_with_config(TermConfig::default())
        .init()
        .map_err(|e| ConfigError::Logging {
            message: e.to_string(),
        })
}
