// ==========================================
// 商机数据装载工具 - 核心库
// ==========================================
// 技术栈: Rust + tokio + reqwest + SQLite
// 系统定位: 测试数据生成 + Salesforce 分批上传
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 生成层 - 合成测试数据
pub mod generator;

// 导入层 - CSV/Excel 读写
pub mod importer;

// 引擎层 - 分批、上传循环、进度统计
pub mod engine;

// 远程层 - Salesforce 会话与提交协议
pub mod salesforce;

// 配置层 - 环境变量与默认值
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 数据仓储层 - 上传台账
pub mod repository;

// 日志系统
pub mod logging;

// 应用层 - 命令与交互菜单
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CloseDateFormat, SubmitProtocol};

// 领域实体
pub use domain::{Batch, BatchAcceptance, OpportunityRecord, UploadOutcome, UploadRun, UploadSummary};

// 引擎
pub use engine::{chunk_ranges, chunk_records, ChunkRange, ProgressReporter, UploadOrchestrator};

// 生成器
pub use generator::OpportunityGenerator;

// 远程提交
pub use salesforce::{
    ApexScriptSubmitter, BulkIngestSubmitter, RemoteSubmitter, RestJsonSubmitter,
    SalesforceClient, SalesforceSession,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商机数据装载工具";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
