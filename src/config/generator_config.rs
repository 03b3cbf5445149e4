// ==========================================
// 商机数据装载工具 - 数据生成配置
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::CloseDateFormat;
use std::path::PathBuf;

pub const DEFAULT_ACCOUNTS_FILE: &str = "Accounts.csv";
pub const DEFAULT_OUTPUT_FILE: &str = "generated_opportunities_enhanced.csv";
pub const DEFAULT_RECORD_COUNT: usize = 2_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub accounts_path: PathBuf,          // 客户清单（Id 列）
    pub output_path: PathBuf,            // 输出 CSV（覆盖）
    pub record_count: usize,             // 生成条数
    pub amount_min: f64,                 // 金额下限（含）
    pub amount_max: f64,                 // 金额上限（含）
    pub close_date_window_days: i64,     // 成交日期偏移上限（含）
    pub stage_name: String,              // 固定阶段
    pub forecast_category: String,       // 固定预测类别
    pub date_format: CloseDateFormat,    // 输出日期格式
    pub seed: Option<u64>,               // 随机种子（None = 系统熵）
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            accounts_path: PathBuf::from(DEFAULT_ACCOUNTS_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            record_count: DEFAULT_RECORD_COUNT,
            amount_min: 1.0,
            amount_max: 1000.0,
            close_date_window_days: 90,
            stage_name: "Discovery".to_string(),
            forecast_category: "Pipeline".to_string(),
            date_format: CloseDateFormat::DayMonthYear,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.amount_min.is_finite() && self.amount_max.is_finite())
            || self.amount_min < 0.0
            || self.amount_min > self.amount_max
        {
            return Err(ConfigError::ConfigValueError {
                key: "amount_range".to_string(),
                value: format!("[{}, {}]", self.amount_min, self.amount_max),
                message: "金额区间必须非负且下限不大于上限".to_string(),
            });
        }
        if self.close_date_window_days < 0 {
            return Err(ConfigError::ConfigValueError {
                key: "close_date_window_days".to_string(),
                value: self.close_date_window_days.to_string(),
                message: "日期窗口不能为负".to_string(),
            });
        }
        Ok(())
    }
}
