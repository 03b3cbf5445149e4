// ==========================================
// 商机数据装载工具 - 引擎层
// ==========================================
// 职责: 分批、驱动提交、累计进度
// 红线: 引擎不直接发 HTTP,不拼 SQL
// ==========================================

pub mod batch_chunker;
pub mod progress_reporter;
pub mod upload_orchestrator;

// 重导出核心引擎
pub use batch_chunker::{
    chunk_count, chunk_ranges, chunk_records, ChunkError, ChunkRange, ChunkResult,
};
pub use progress_reporter::ProgressReporter;
pub use upload_orchestrator::UploadOrchestrator;
