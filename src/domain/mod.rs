// ==========================================
// 商机数据装载工具 - 领域模型层
// ==========================================
// 职责: 定义商机记录、批次、上传结果等实体
// 红线: 不含数据访问逻辑,不含远程调用
// ==========================================

pub mod opportunity;
pub mod types;
pub mod upload;

// 重导出核心类型
pub use opportunity::{OpportunityRecord, OPPORTUNITY_CSV_HEADER};
pub use types::{CloseDateFormat, SubmitProtocol};
pub use upload::{Batch, BatchAcceptance, UploadOutcome, UploadRun, UploadSummary};
