// ==========================================
// 商机数据装载工具 - 生成层
// ==========================================
// 职责: 从客户清单合成大规模商机测试数据
// ==========================================

pub mod error;
pub mod opportunity_generator;

pub use error::{GeneratorError, GeneratorResult};
pub use opportunity_generator::{
    external_id_for, generate_to_csv, GenerationReport, OpportunityGenerator,
};
