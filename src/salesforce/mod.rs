// ==========================================
// 商机数据装载工具 - Salesforce 远程层
// ==========================================
// 职责: 登录、批次提交、作业监控
// 红线: 连接失败致命;单批次失败只记录不中止
// ==========================================

pub mod apex;
pub mod bulk_ingest;
pub mod client;
pub mod error;
pub mod monitor;
pub mod session;
pub mod submitter;

pub use apex::{build_add_record_script, escape_apex_string, REST_ENDPOINT_APEX_SOURCE};
pub use bulk_ingest::{build_ingest_csv, CreateIngestJobRequest, IngestJobInfo};
pub use client::{ExecuteAnonymousResult, QueryResponse, SalesforceClient};
pub use error::{RemoteError, RemoteResult};
pub use monitor::{AsyncApexJob, JobMonitor, DEFAULT_JOB_LIMIT};
pub use session::{login, SalesforceSession};
pub use submitter::{
    submitter_for, ApexScriptSubmitter, BulkIngestSubmitter, RemoteSubmitter, RestJsonSubmitter,
};
