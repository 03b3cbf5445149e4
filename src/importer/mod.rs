// ==========================================
// 商机数据装载工具 - 导入层
// ==========================================
// 职责: 外部表格读写
// 支持: 客户清单 (CSV/Excel)、商机 CSV (读 + 写)
// ==========================================

pub mod account_reader;
pub mod error;
pub mod file_parser;
pub mod opportunity_csv;

// 重导出核心类型
pub use account_reader::{read_account_ids, ACCOUNT_ID_COLUMN};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
pub use opportunity_csv::{
    parse_close_date, read_opportunities, read_opportunities_from, write_opportunities,
    OpportunityCsvWriter,
};
