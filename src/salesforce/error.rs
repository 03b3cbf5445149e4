// ==========================================
// 商机数据装载工具 - 远程调用错误类型
// ==========================================
// 分类:
// - Login: 连接/认证失败（致命,任何批次之前中止）
// - 其余: 单批次失败（记录后继续下一批）
// ==========================================

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    // ===== 连接错误（致命）=====
    #[error("Salesforce 登录失败: {0}")]
    Login(String),

    // ===== 传输错误 =====
    #[error("HTTP 请求失败: {0}")]
    Transport(String),

    #[error("HTTP 状态异常 {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ===== 远端业务错误 =====
    #[error("Apex 编译失败: {0}")]
    CompileFailed(String),

    #[error("Apex 执行异常: {0}")]
    ExecutionFailed(String),

    #[error("远端拒绝: {0}")]
    Rejected(String),

    // ===== 协议错误 =====
    #[error("请求体构造失败: {0}")]
    Payload(String),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("URL 无效: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RemoteError {
    /// 是否为致命错误（应中止整次运行）
    pub fn is_fatal(&self) -> bool {
        matches!(self, RemoteError::Login(_) | RemoteError::Config(_))
    }
}

// 实现 From<reqwest::Error>
impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::InvalidResponse(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

// 实现 From<url::ParseError>
impl From<url::ParseError> for RemoteError {
    fn from(err: url::ParseError) -> Self {
        RemoteError::InvalidUrl(err.to_string())
    }
}

// 实现 From<quick_xml::Error>
impl From<quick_xml::Error> for RemoteError {
    fn from(err: quick_xml::Error) -> Self {
        RemoteError::InvalidResponse(format!("XML: {}", err))
    }
}

/// Result 类型别名
pub type RemoteResult<T> = Result<T, RemoteError>;
