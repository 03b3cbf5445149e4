// ==========================================
// 商机数据装载工具 - Bulk API 2.0 导入作业
// ==========================================
// 流程: 创建 upsert 作业 → PUT CSV 数据 → PATCH UploadComplete
// 外部 ID 字段: External_Id__c
// ==========================================

use crate::domain::opportunity::{format_amount, OpportunityRecord};
use crate::salesforce::error::{RemoteError, RemoteResult};
use serde::{Deserialize, Serialize};

/// 导入对象
pub const INGEST_OBJECT: &str = "Opportunity";

/// upsert 外部 ID 字段
pub const EXTERNAL_ID_FIELD: &str = "External_Id__c";

/// 导入 CSV 表头（Salesforce 字段 API 名）
pub const INGEST_CSV_HEADER: [&str; 6] = [
    EXTERNAL_ID_FIELD,
    "Name",
    "AccountId",
    "Amount",
    "StageName",
    "CloseDate",
];

// ==========================================
// 作业请求/响应
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    pub object: String,
    pub external_id_field_name: String,
    pub content_type: String,
    pub operation: String,
    pub line_ending: String,
}

impl CreateIngestJobRequest {
    /// Opportunity 按 External_Id__c upsert
    pub fn opportunity_upsert() -> Self {
        Self {
            object: INGEST_OBJECT.to_string(),
            external_id_field_name: EXTERNAL_ID_FIELD.to_string(),
            content_type: "CSV".to_string(),
            operation: "upsert".to_string(),
            line_ending: "LF".to_string(),
        }
    }
}

/// 作业状态变更请求体
#[derive(Debug, Clone, Serialize)]
pub struct IngestStateChange {
    pub state: &'static str,
}

impl IngestStateChange {
    pub const UPLOAD_COMPLETE: IngestStateChange = IngestStateChange {
        state: "UploadComplete",
    };
    pub const ABORTED: IngestStateChange = IngestStateChange { state: "Aborted" };
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJobInfo {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl IngestJobInfo {
    /// 终态: JobComplete / Failed / Aborted
    pub fn is_terminal(&self) -> bool {
        matches!(self.state.as_str(), "JobComplete" | "Failed" | "Aborted")
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state.as_str(), "Failed" | "Aborted")
    }
}

/// 构造一个批次的导入 CSV（LF 行尾,日期 ISO）
pub fn build_ingest_csv(records: &[OpportunityRecord]) -> RemoteResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let payload_err = |e: csv::Error| RemoteError::Payload(e.to_string());

    writer.write_record(INGEST_CSV_HEADER).map_err(payload_err)?;
    for record in records {
        writer
            .write_record([
                record.external_id.as_str(),
                record.name.as_str(),
                record.account_id.as_str(),
                format_amount(record.amount).as_str(),
                record.stage_name.as_str(),
                record.close_date.format("%Y-%m-%d").to_string().as_str(),
            ])
            .map_err(payload_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RemoteError::Payload(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| RemoteError::Payload(e.to_string()))
}
