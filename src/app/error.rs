// ==========================================
// 商机数据装载工具 - 应用层错误类型
// ==========================================
// 职责: 汇总各层错误,供命令与菜单统一处理
// ==========================================

use crate::config::ConfigError;
use crate::engine::ChunkError;
use crate::generator::GeneratorError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use crate::salesforce::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("输出失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("无效输入: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// 连接/认证失败（需提示用户检查凭据）
    pub fn is_login_failure(&self) -> bool {
        match self {
            AppError::Remote(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
