// ==========================================
// 商机数据装载工具 - 上传配置
// ==========================================
// 各协议默认值:
// - apex-script: 10000 条/批, 批间 500ms
// - rest-json:   50000 条/批, 批间 2s
// - bulk-ingest: 10000 条/批, 批间 500ms
// 单次请求超时统一 300s
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::SubmitProtocol;
use std::path::PathBuf;
use std::time::Duration;

/// 默认上传文件
pub const DEFAULT_UPLOAD_CSV: &str = "generated_opportunities_enhanced.csv";

/// 单次请求超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub protocol: SubmitProtocol,
    pub csv_path: PathBuf,
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub request_timeout: Duration,
}

impl UploadConfig {
    /// 按协议取默认值
    pub fn for_protocol(protocol: SubmitProtocol) -> Self {
        let (batch_size, inter_batch_delay) = match protocol {
            SubmitProtocol::ApexScript => (10_000, Duration::from_millis(500)),
            SubmitProtocol::RestJson => (50_000, Duration::from_secs(2)),
            SubmitProtocol::BulkIngest => (10_000, Duration::from_millis(500)),
        };

        Self {
            protocol,
            csv_path: PathBuf::from(DEFAULT_UPLOAD_CSV),
            batch_size,
            inter_batch_delay,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = path.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::ConfigValueError {
                key: "batch_size".to_string(),
                value: "0".to_string(),
                message: "批次大小必须大于 0".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ConfigValueError {
                key: "request_timeout".to_string(),
                value: "0".to_string(),
                message: "请求超时必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::for_protocol(SubmitProtocol::RestJson)
    }
}
