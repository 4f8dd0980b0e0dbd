// crates/tw_config/src/error.rs

//! 配置层错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 配置结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 配置错误
///
/// 所有配置错误都是致命的：在构造阶段检出并中止运行，没有重试。
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 缺少必需的配置项
    #[error("缺少必需的配置项: {key}")]
    MissingKey {
        /// 配置键名
        key: &'static str,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidValue {
        /// 配置键名
        key: &'static str,
        /// 配置值
        value: String,
        /// 无效原因
        reason: String,
    },

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound {
        /// 文件路径
        path: PathBuf,
    },

    /// 配置文件读取失败
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析失败
    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// 配置值无效
    pub fn invalid_value(
        key: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
