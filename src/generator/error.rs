// ==========================================
// 商机数据装载工具 - 生成器错误类型
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("客户清单为空，无法生成有效的客户引用")]
    NoAccounts,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
