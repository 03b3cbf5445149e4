// ==========================================
// 商机数据装载工具 - 应用状态
// ==========================================
// 职责: 持有台账仓储与 Salesforce 连接（首次使用时登录,之后复用）
// ==========================================

use crate::app::error::AppResult;
use crate::config::{SalesforceConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::repository::UploadLedgerRepository;
use crate::salesforce::{JobMonitor, SalesforceClient};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

/// 台账路径环境变量
pub const DB_PATH_ENV: &str = "OPPORTUNITY_LOADER_DB_PATH";

pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 上传台账
    pub ledger: Arc<UploadLedgerRepository>,

    /// Salesforce 连接配置
    pub sf_config: SalesforceConfig,

    /// 单次请求超时
    pub request_timeout: Duration,

    client: OnceCell<Arc<SalesforceClient>>,
}

impl AppState {
    /// 创建应用状态
    ///
    /// # 参数
    /// - db_path: 台账数据库路径（不存在则创建）
    /// - sf_config: Salesforce 连接配置
    pub fn new(db_path: String, sf_config: SalesforceConfig) -> AppResult<Self> {
        tracing::info!("初始化AppState，台账路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(crate::repository::RepositoryError::from)?;
        let ledger = Arc::new(UploadLedgerRepository::new(Arc::new(Mutex::new(conn))));

        Ok(Self {
            db_path,
            ledger,
            sf_config,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            client: OnceCell::new(),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 已登录的客户端（首次调用时登录）
    pub async fn client(&self) -> AppResult<Arc<SalesforceClient>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                if self.sf_config.uses_placeholder_credentials() {
                    tracing::warn!("使用占位凭据登录,大概率失败");
                }
                SalesforceClient::connect(&self.sf_config, self.request_timeout)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(client))
    }

    pub async fn monitor(&self) -> AppResult<JobMonitor> {
        Ok(JobMonitor::new(self.client().await?))
    }
}

/// 获取默认台账路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./opportunity_loader.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("opportunity-loader");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("opportunity_loader.db");
        }
    }

    path.to_string_lossy().to_string()
}
