//! # 过期时间配置构建器模块

use crate::config::core::TtlConf;
use crate::error::ConfigResult;
use rat_logger::info;

/// 过期时间配置构建器
#[derive(Debug)]
pub struct TtlConfBuilder {
    expiry_secs: Option<u64>,
    not_found_expiry_secs: Option<u64>,
    deviation: Option<f64>,
}

impl TtlConfBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            expiry_secs: None,
            not_found_expiry_secs: None,
            deviation: None,
        }
    }

    /// 设置正常记录过期时间（秒）
    pub fn expiry_secs(mut self, secs: u64) -> Self {
        self.expiry_secs = Some(secs);
        self
    }

    /// 设置空值占位过期时间（秒）
    pub fn not_found_expiry_secs(mut self, secs: u64) -> Self {
        self.not_found_expiry_secs = Some(secs);
        self
    }

    /// 设置过期时间抖动比例，取值 `[0, 1)`
    pub fn deviation(mut self, deviation: f64) -> Self {
        self.deviation = Some(deviation);
        self
    }

    /// 构建过期时间配置
    pub fn build(self) -> ConfigResult<TtlConf> {
        let expiry_secs = self
            .expiry_secs
            .ok_or_else(|| crate::config_error!("正常记录过期时间必须设置"))?;
        let not_found_expiry_secs = self
            .not_found_expiry_secs
            .ok_or_else(|| crate::config_error!("空值占位过期时间必须设置"))?;
        let deviation = self
            .deviation
            .ok_or_else(|| crate::config_error!("过期时间抖动比例必须设置"))?;

        let conf = TtlConf {
            expiry_secs,
            not_found_expiry_secs,
            deviation,
        };
        validate_ttl_conf(&conf)?;

        info!(
            "创建过期时间配置: 正常={}s, 空值={}s, 抖动={}",
            expiry_secs, not_found_expiry_secs, deviation
        );
        Ok(conf)
    }
}

impl Default for TtlConfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 正常记录过期时间上限（一年）
pub const MAX_EXPIRY_SECS: u64 = 365 * 24 * 3600;

/// 校验过期时间配置
///
/// 空值占位必须比正常记录更早过期。
pub fn validate_ttl_conf(conf: &TtlConf) -> ConfigResult<()> {
    if conf.expiry_secs == 0 {
        return Err(crate::config_error!("正常记录过期时间不能为零"));
    }
    if conf.expiry_secs > MAX_EXPIRY_SECS {
        return Err(crate::config_error!(format!(
            "正常记录过期时间不能超过{}s: {}",
            MAX_EXPIRY_SECS, conf.expiry_secs
        )));
    }
    if conf.not_found_expiry_secs == 0 {
        return Err(crate::config_error!("空值占位过期时间不能为零"));
    }
    if conf.not_found_expiry_secs >= conf.expiry_secs {
        return Err(crate::config_error!(format!(
            "空值占位过期时间({}s)必须小于正常记录过期时间({}s)",
            conf.not_found_expiry_secs, conf.expiry_secs
        )));
    }
    if !(0.0..1.0).contains(&conf.deviation) {
        return Err(crate::config_error!(format!(
            "过期时间抖动比例必须在[0, 1)之间: {}",
            conf.deviation
        )));
    }
    Ok(())
}
