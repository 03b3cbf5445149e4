// ==========================================
// 商机数据装载工具 - 批次提交策略
// ==========================================
// 三种协议共用一个 trait,由上传编排器统一驱动:
// - ApexScriptSubmitter: 匿名 Apex（addRecord 脚本,结束时 flush）
// - RestJsonSubmitter:   自定义 Apex REST 端点（JSON 数组）
// - BulkIngestSubmitter: Bulk API 2.0 导入作业（每批一个作业）
// 任何失败只影响当前批次,不重试
// ==========================================

use crate::domain::types::SubmitProtocol;
use crate::domain::upload::{Batch, BatchAcceptance};
use crate::salesforce::apex::{build_add_record_script, APEX_FLUSH_SCRIPT, REST_ENDPOINT_PATH};
use crate::salesforce::bulk_ingest::{build_ingest_csv, CreateIngestJobRequest};
use crate::salesforce::client::{ExecuteAnonymousResult, SalesforceClient};
use crate::salesforce::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// RemoteSubmitter Trait
// ==========================================
#[async_trait]
pub trait RemoteSubmitter: Send + Sync {
    /// 提交协议
    fn protocol(&self) -> SubmitProtocol;

    /// 提交一个批次
    ///
    /// # 返回
    /// - Ok(BatchAcceptance): 远端确认受理
    /// - Err(RemoteError): 传输失败、非 2xx 或远端报告失败
    async fn submit(&self, batch: &Batch<'_>) -> RemoteResult<BatchAcceptance>;

    /// 全部批次结束后的收尾动作（默认无）
    async fn finish(&self) -> RemoteResult<()> {
        Ok(())
    }
}

// ==========================================
// ApexScriptSubmitter
// ==========================================
pub struct ApexScriptSubmitter {
    client: Arc<SalesforceClient>,
}

impl ApexScriptSubmitter {
    pub fn new(client: Arc<SalesforceClient>) -> Self {
        Self { client }
    }

    /// compiled && success 才算成功
    fn check(result: ExecuteAnonymousResult) -> RemoteResult<()> {
        if !result.compiled {
            return Err(RemoteError::CompileFailed(
                result
                    .compile_problem
                    .unwrap_or_else(|| "未知编译错误".to_string()),
            ));
        }
        if !result.success {
            return Err(RemoteError::ExecutionFailed(
                result
                    .exception_message
                    .unwrap_or_else(|| "未知执行异常".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSubmitter for ApexScriptSubmitter {
    fn protocol(&self) -> SubmitProtocol {
        SubmitProtocol::ApexScript
    }

    async fn submit(&self, batch: &Batch<'_>) -> RemoteResult<BatchAcceptance> {
        let script = build_add_record_script(batch.records);
        debug!(batch = batch.number, script_len = script.len(), "匿名 Apex 脚本已构造");

        Self::check(self.client.execute_anonymous(&script).await?)?;
        Ok(BatchAcceptance {
            records_accepted: batch.len(),
            job_id: None,
        })
    }

    async fn finish(&self) -> RemoteResult<()> {
        info!("执行 Apex 收尾 flush");
        Self::check(self.client.execute_anonymous(APEX_FLUSH_SCRIPT).await?)
    }
}

// ==========================================
// RestJsonSubmitter
// ==========================================

/// REST 端点请求元素
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestOpportunity<'a> {
    pub external_id: &'a str,
    pub stage_name: &'a str,
    pub amount: f64,
    pub account_id: &'a str,
    pub name: &'a str,
}

/// REST 端点响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestUploadResponse {
    pub success: bool,
    pub message: Option<String>,
    pub record_count: usize,
    pub batch_job_id: Option<String>,
}

pub struct RestJsonSubmitter {
    client: Arc<SalesforceClient>,
}

impl RestJsonSubmitter {
    pub fn new(client: Arc<SalesforceClient>) -> Self {
        Self { client }
    }

    pub fn payload<'a>(batch: &Batch<'a>) -> Vec<RestOpportunity<'a>> {
        batch
            .records
            .iter()
            .map(|r| RestOpportunity {
                external_id: &r.external_id,
                stage_name: &r.stage_name,
                amount: r.amount,
                account_id: &r.account_id,
                name: &r.name,
            })
            .collect()
    }
}

#[async_trait]
impl RemoteSubmitter for RestJsonSubmitter {
    fn protocol(&self) -> SubmitProtocol {
        SubmitProtocol::RestJson
    }

    async fn submit(&self, batch: &Batch<'_>) -> RemoteResult<BatchAcceptance> {
        let payload = Self::payload(batch);
        let response: RestUploadResponse = self
            .client
            .post_apex_rest(REST_ENDPOINT_PATH, &payload)
            .await?;

        if !response.success {
            return Err(RemoteError::Rejected(
                response.message.unwrap_or_else(|| "未知错误".to_string()),
            ));
        }

        Ok(BatchAcceptance {
            records_accepted: response.record_count,
            job_id: response.batch_job_id,
        })
    }
}

// ==========================================
// BulkIngestSubmitter
// ==========================================
pub struct BulkIngestSubmitter {
    client: Arc<SalesforceClient>,
}

impl BulkIngestSubmitter {
    pub fn new(client: Arc<SalesforceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSubmitter for BulkIngestSubmitter {
    fn protocol(&self) -> SubmitProtocol {
        SubmitProtocol::BulkIngest
    }

    async fn submit(&self, batch: &Batch<'_>) -> RemoteResult<BatchAcceptance> {
        let csv = build_ingest_csv(batch.records)?;
        let job = self
            .client
            .create_ingest_job(&CreateIngestJobRequest::opportunity_upsert())
            .await?;
        debug!(batch = batch.number, job_id = %job.id, "导入作业已创建");

        // 上传或关闭失败时中止作业
        let uploaded = match self.client.upload_ingest_data(&job.id, csv).await {
            Ok(()) => self.client.close_ingest_job(&job.id).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = uploaded {
            if let Err(abort_err) = self.client.abort_ingest_job(&job.id).await {
                warn!(job_id = %job.id, error = %abort_err, "中止导入作业失败");
            }
            return Err(e);
        }

        Ok(BatchAcceptance {
            records_accepted: batch.len(),
            job_id: Some(job.id),
        })
    }
}

/// 按协议构造提交器
pub fn submitter_for(
    protocol: SubmitProtocol,
    client: Arc<SalesforceClient>,
) -> Box<dyn RemoteSubmitter> {
    match protocol {
        SubmitProtocol::ApexScript => Box::new(ApexScriptSubmitter::new(client)),
        SubmitProtocol::RestJson => Box::new(RestJsonSubmitter::new(client)),
        SubmitProtocol::BulkIngest => Box::new(BulkIngestSubmitter::new(client)),
    }
}
