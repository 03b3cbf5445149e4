// ==========================================
// 商机数据装载工具 - 远端作业监控
// ==========================================
// 只读查询:
// - AsyncApexJob（OpportunityBulkAPIBatch 批处理作业）
// - Bulk API 2.0 导入作业状态
// - 已上传商机数（External_Id__c 非空）
// ==========================================

use crate::salesforce::bulk_ingest::IngestJobInfo;
use crate::salesforce::client::SalesforceClient;
use crate::salesforce::error::RemoteResult;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// 远端批处理 Apex 类名
pub const BATCH_APEX_CLASS: &str = "OpportunityBulkAPIBatch";

/// 默认展示的最近作业数
pub const DEFAULT_JOB_LIMIT: usize = 10;

const ASYNC_JOB_FIELDS: &str = "Id, ApexClass.Name, Status, NumberOfErrors, JobItemsProcessed, TotalJobItems, CreatedDate";

const UPLOADED_COUNT_SOQL: &str = "SELECT COUNT() FROM Opportunity WHERE External_Id__c != null";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApexClassRef {
    pub name: String,
}

/// AsyncApexJob 查询结果行
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AsyncApexJob {
    pub id: String,
    #[serde(default)]
    pub apex_class: Option<ApexClassRef>,
    pub status: String,
    #[serde(default)]
    pub number_of_errors: u64,
    #[serde(default)]
    pub job_items_processed: u64,
    #[serde(default)]
    pub total_job_items: u64,
    pub created_date: String,
}

/// SOQL 字符串字面量转义
fn escape_soql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn recent_batch_jobs_soql(limit: usize) -> String {
    format!(
        "SELECT {} FROM AsyncApexJob WHERE ApexClass.Name = '{}' ORDER BY CreatedDate DESC LIMIT {}",
        ASYNC_JOB_FIELDS, BATCH_APEX_CLASS, limit
    )
}

pub fn batch_jobs_by_ids_soql(ids: &[String]) -> String {
    let quoted = ids
        .iter()
        .map(|id| format!("'{}'", escape_soql(id)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {} FROM AsyncApexJob WHERE Id IN ({}) ORDER BY CreatedDate DESC",
        ASYNC_JOB_FIELDS, quoted
    )
}

pub struct JobMonitor {
    client: Arc<SalesforceClient>,
}

impl JobMonitor {
    pub fn new(client: Arc<SalesforceClient>) -> Self {
        Self { client }
    }

    /// 最近的批处理作业（新的在前）
    #[instrument(skip(self))]
    pub async fn recent_batch_jobs(&self, limit: usize) -> RemoteResult<Vec<AsyncApexJob>> {
        let response = self
            .client
            .query::<AsyncApexJob>(&recent_batch_jobs_soql(limit))
            .await?;
        Ok(response.records)
    }

    /// 按作业 ID 查询（台账中记录的 batchJobId）
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn batch_jobs_by_ids(&self, ids: &[String]) -> RemoteResult<Vec<AsyncApexJob>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .query::<AsyncApexJob>(&batch_jobs_by_ids_soql(ids))
            .await?;
        Ok(response.records)
    }

    pub async fn ingest_job_status(&self, job_id: &str) -> RemoteResult<IngestJobInfo> {
        self.client.ingest_job_info(job_id).await
    }

    /// 已带外部 ID 的商机数
    #[instrument(skip(self))]
    pub async fn count_uploaded(&self) -> RemoteResult<u64> {
        let response = self
            .client
            .query::<serde_json::Value>(UPLOADED_COUNT_SOQL)
            .await?;
        Ok(response.total_size)
    }
}
