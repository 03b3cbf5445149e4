// ==========================================
// 商机数据装载工具 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod upload_ledger_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use upload_ledger_repo::UploadLedgerRepository;
