// ==========================================
// 商机数据装载工具 - Salesforce 连接配置
// ==========================================
// 来源: 环境变量（可由 .env 提供），缺省时回退到字面默认值
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use std::fmt;
use url::Url;

// ==========================================
// 环境变量键
// ==========================================
pub mod env_keys {
    pub const USERNAME: &str = "SF_USERNAME";
    pub const PASSWORD: &str = "SF_PASSWORD";
    pub const SECURITY_TOKEN: &str = "SF_SECURITY_TOKEN";
    pub const DOMAIN: &str = "SF_DOMAIN";
    pub const API_VERSION: &str = "SF_API_VERSION";
}

// ==========================================
// 字面默认值（占位凭据，仅用于提示）
// ==========================================
pub mod defaults {
    pub const USERNAME: &str = "your_username@example.com";
    pub const PASSWORD: &str = "your_password";
    pub const SECURITY_TOKEN: &str = "your_security_token";
    /// login = 生产环境, test = 沙箱
    pub const DOMAIN: &str = "login";
    pub const API_VERSION: &str = "59.0";
}

// ==========================================
// SalesforceConfig
// ==========================================
#[derive(Clone, PartialEq, Eq)]
pub struct SalesforceConfig {
    pub username: String,
    pub password: String,
    pub security_token: String,
    pub domain: String,
    pub api_version: String,
}

impl SalesforceConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取（便于测试注入）
    ///
    /// 空白值视为未设置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, fallback: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            username: read(env_keys::USERNAME, defaults::USERNAME),
            password: read(env_keys::PASSWORD, defaults::PASSWORD),
            security_token: read(env_keys::SECURITY_TOKEN, defaults::SECURITY_TOKEN),
            domain: read(env_keys::DOMAIN, defaults::DOMAIN),
            api_version: read(env_keys::API_VERSION, defaults::API_VERSION),
        }
    }

    /// 是否仍在使用占位凭据
    pub fn uses_placeholder_credentials(&self) -> bool {
        self.username == defaults::USERNAME
            || self.password == defaults::PASSWORD
            || self.security_token == defaults::SECURITY_TOKEN
    }

    /// 登录用密码（密码 + 安全令牌）
    pub fn password_with_token(&self) -> String {
        format!("{}{}", self.password, self.security_token)
    }

    /// 登录服务器根地址
    ///
    /// - "login" → https://login.salesforce.com
    /// - "test" → https://test.salesforce.com
    /// - "mycompany.my" → https://mycompany.my.salesforce.com
    /// - 完整 URL（http/https 开头）原样使用
    pub fn login_base_url(&self) -> ConfigResult<Url> {
        let domain = self.domain.trim();
        let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}.salesforce.com", domain)
        };

        Url::parse(&raw).map_err(|e| ConfigError::ConfigValueError {
            key: env_keys::DOMAIN.to_string(),
            value: domain.to_string(),
            message: e.to_string(),
        })
    }

    /// 环境变量设置提示（连接失败时输出）
    pub fn setup_hint() -> String {
        [
            "请设置以下环境变量:".to_string(),
            format!("  export {}='your_username@example.com'", env_keys::USERNAME),
            format!("  export {}='your_password'", env_keys::PASSWORD),
            format!("  export {}='your_token'", env_keys::SECURITY_TOKEN),
            format!("  export {}='test'  # 生产环境用 login", env_keys::DOMAIN),
        ]
        .join("\n")
    }
}

// 凭据不进日志
impl fmt::Debug for SalesforceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesforceConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("security_token", &"***")
            .field("domain", &self.domain)
            .field("api_version", &self.api_version)
            .finish()
    }
}
