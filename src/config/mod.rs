// ==========================================
// 商机数据装载工具 - 配置层
// ==========================================
// 职责: 连接凭据、上传参数、生成参数
// 来源: 环境变量 / .env / 命令行参数 / 字面默认值
// ==========================================

pub mod error;
pub mod generator_config;
pub mod salesforce_config;
pub mod upload_config;

pub use error::{ConfigError, ConfigResult};
pub use generator_config::GeneratorConfig;
pub use salesforce_config::{env_keys, SalesforceConfig};
pub use upload_config::{UploadConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_UPLOAD_CSV};
