// ==========================================
// 商机数据装载工具 - 配置层错误类型
// ==========================================

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
