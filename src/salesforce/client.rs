// ==========================================
// 商机数据装载工具 - Salesforce REST 客户端
// ==========================================
// 职责: 持有已登录会话,封装各类远程调用
// - tooling/executeAnonymous（匿名 Apex）
// - apexrest（自定义 REST 端点）
// - query（SOQL）
// - jobs/ingest（Bulk API 2.0）
// 约定: 所有请求带 Bearer 会话;非 2xx 统一转为 HttpStatus
// ==========================================

use crate::config::SalesforceConfig;
use crate::salesforce::bulk_ingest::{CreateIngestJobRequest, IngestJobInfo, IngestStateChange};
use crate::salesforce::error::{RemoteError, RemoteResult};
use crate::salesforce::session::{login, SalesforceSession};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// 错误响应体在错误信息中保留的最大字符数
const ERROR_BODY_LIMIT: usize = 500;

// ==========================================
// 响应类型
// ==========================================

/// executeAnonymous 响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecuteAnonymousResult {
    pub compiled: bool,
    pub success: bool,
    pub compile_problem: Option<String>,
    pub exception_message: Option<String>,
    pub line: Option<i64>,
    pub column: Option<i64>,
}

/// SOQL 查询响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<R> {
    pub total_size: u64,
    pub done: bool,
    #[serde(default = "Vec::new")]
    pub records: Vec<R>,
}

// ==========================================
// SalesforceClient
// ==========================================
#[derive(Debug, Clone)]
pub struct SalesforceClient {
    http: reqwest::Client,
    session: SalesforceSession,
    api_version: String,
}

impl SalesforceClient {
    /// 构造 HTTP 客户端（每个请求带固定超时）
    pub fn build_http(timeout: Duration) -> RemoteResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("opportunity-loader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))
    }

    /// 登录并返回客户端
    ///
    /// # 参数
    /// - config: Salesforce 连接配置
    /// - timeout: 单次请求超时
    ///
    /// # 返回
    /// - Err(RemoteError::Login): 认证失败（调用方应中止）
    pub async fn connect(config: &SalesforceConfig, timeout: Duration) -> RemoteResult<Self> {
        let http = Self::build_http(timeout)?;
        let session = login(&http, config).await?;
        Ok(Self::new(http, session, config.api_version.clone()))
    }

    pub fn new(http: reqwest::Client, session: SalesforceSession, api_version: impl Into<String>) -> Self {
        Self {
            http,
            session,
            api_version: api_version.into(),
        }
    }

    pub fn session(&self) -> &SalesforceSession {
        &self.session
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    // ==========================================
    // URL 拼接
    // ==========================================

    /// {instance}/services/data/v{ver}/{path}
    fn data_url(&self, path: &str) -> RemoteResult<Url> {
        Ok(self
            .session
            .instance_url
            .join(&format!("services/data/v{}/{}", self.api_version, path))?)
    }

    /// {instance}/services/apexrest/{path}
    fn apex_rest_url(&self, path: &str) -> RemoteResult<Url> {
        Ok(self
            .session
            .instance_url
            .join(&format!("services/apexrest/{}", path))?)
    }

    /// 非 2xx → HttpStatus（响应体截断保留）
    async fn ensure_success(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        })
    }

    async fn send_json<R: DeserializeOwned>(request: reqwest::RequestBuilder) -> RemoteResult<R> {
        let response = Self::ensure_success(request.send().await?).await?;
        Ok(response.json::<R>().await?)
    }

    // ==========================================
    // 远程调用
    // ==========================================

    /// 执行匿名 Apex（只返回远端结果,不做成功判定）
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn execute_anonymous(&self, body: &str) -> RemoteResult<ExecuteAnonymousResult> {
        let mut url = self.data_url("tooling/executeAnonymous/")?;
        url.query_pairs_mut().append_pair("anonymousBody", body);

        debug!("执行匿名 Apex");
        Self::send_json(self.http.get(url).bearer_auth(&self.session.session_id)).await
    }

    /// POST JSON 到 apexrest 端点
    #[instrument(skip(self, body))]
    pub async fn post_apex_rest<B, R>(&self, path: &str, body: &B) -> RemoteResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.apex_rest_url(path)?;
        Self::send_json(
            self.http
                .post(url)
                .bearer_auth(&self.session.session_id)
                .json(body),
        )
        .await
    }

    /// SOQL 查询（单页）
    #[instrument(skip(self))]
    pub async fn query<R: DeserializeOwned>(&self, soql: &str) -> RemoteResult<QueryResponse<R>> {
        let mut url = self.data_url("query")?;
        url.query_pairs_mut().append_pair("q", soql);

        Self::send_json(self.http.get(url).bearer_auth(&self.session.session_id)).await
    }

    // ==========================================
    // Bulk API 2.0
    // ==========================================

    #[instrument(skip(self, request))]
    pub async fn create_ingest_job(
        &self,
        request: &CreateIngestJobRequest,
    ) -> RemoteResult<IngestJobInfo> {
        let url = self.data_url("jobs/ingest")?;
        Self::send_json(
            self.http
                .post(url)
                .bearer_auth(&self.session.session_id)
                .json(request),
        )
        .await
    }

    #[instrument(skip(self, csv), fields(csv_len = csv.len()))]
    pub async fn upload_ingest_data(&self, job_id: &str, csv: String) -> RemoteResult<()> {
        let url = self.data_url(&format!("jobs/ingest/{}/batches", job_id))?;
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.session.session_id)
            .header(CONTENT_TYPE, "text/csv")
            .body(csv)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// 数据上传完毕,交由远端排队处理
    #[instrument(skip(self))]
    pub async fn close_ingest_job(&self, job_id: &str) -> RemoteResult<IngestJobInfo> {
        self.change_ingest_state(job_id, &IngestStateChange::UPLOAD_COMPLETE)
            .await
    }

    #[instrument(skip(self))]
    pub async fn abort_ingest_job(&self, job_id: &str) -> RemoteResult<IngestJobInfo> {
        self.change_ingest_state(job_id, &IngestStateChange::ABORTED)
            .await
    }

    async fn change_ingest_state(
        &self,
        job_id: &str,
        change: &IngestStateChange,
    ) -> RemoteResult<IngestJobInfo> {
        let url = self.data_url(&format!("jobs/ingest/{}", job_id))?;
        Self::send_json(
            self.http
                .patch(url)
                .bearer_auth(&self.session.session_id)
                .json(change),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn ingest_job_info(&self, job_id: &str) -> RemoteResult<IngestJobInfo> {
        let url = self.data_url(&format!("jobs/ingest/{}", job_id))?;
        Self::send_json(self.http.get(url).bearer_auth(&self.session.session_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SalesforceClient {
        let session = SalesforceSession::new(
            Url::parse("https://na1.salesforce.com").unwrap(),
            "sid",
        );
        SalesforceClient::new(reqwest::Client::new(), session, "59.0")
    }

    #[test]
    fn test_data_url() {
        let url = client().data_url("jobs/ingest/750A/batches").unwrap();
        assert_eq!(
            url.as_str(),
            "https://na1.salesforce.com/services/data/v59.0/jobs/ingest/750A/batches"
        );
    }

    #[test]
    fn test_apex_rest_url() {
        let url = client().apex_rest_url("api/opportunity/bulk").unwrap();
        assert_eq!(
            url.as_str(),
            "https://na1.salesforce.com/services/apexrest/api/opportunity/bulk"
        );
    }

    #[test]
    fn test_execute_anonymous_result_defaults() {
        let result: ExecuteAnonymousResult = serde_json::from_str(
            r#"{"compiled":false,"success":false,"compileProblem":"Unexpected token","line":1,"column":5}"#,
        )
        .unwrap();
        assert!(!result.compiled);
        assert_eq!(result.compile_problem.as_deref(), Some("Unexpected token"));
        assert!(result.exception_message.is_none());
    }

    #[test]
    fn test_query_response() {
        let response: QueryResponse<serde_json::Value> =
            serde_json::from_str(r#"{"totalSize":42,"done":true,"records":[]}"#).unwrap();
        assert_eq!(response.total_size, 42);
        assert!(response.records.is_empty());
    }
}
