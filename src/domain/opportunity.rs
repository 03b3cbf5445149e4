// ==========================================
// 商机数据装载工具 - 商机记录实体
// ==========================================
// 对齐: generated_opportunities_enhanced.csv 列定义
// 说明: 唯一性与外键有效性由远端校验,本地不做约束
// ==========================================

use crate::domain::types::CloseDateFormat;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 商机 CSV 表头（上传侧列集合,顺序固定）
pub const OPPORTUNITY_CSV_HEADER: [&str; 7] = [
    "ExternalId",
    "Name",
    "Account",
    "Amount",
    "StageName",
    "ForecastCategory",
    "CloseDate",
];

// ==========================================
// OpportunityRecord - 商机记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub external_id: String,       // 外部 ID（幂等 upsert 键）
    pub name: String,              // 显示名称
    pub account_id: String,        // 客户 ID（外键）
    pub amount: f64,               // 金额（两位小数,非负）
    pub stage_name: String,        // 阶段
    pub forecast_category: String, // 预测类别
    pub close_date: NaiveDate,     // 预计成交日期
}

impl OpportunityRecord {
    /// 按表头顺序输出一行
    pub fn to_row(&self, date_format: CloseDateFormat) -> Vec<String> {
        vec![
            self.external_id.clone(),
            self.name.clone(),
            self.account_id.clone(),
            format_amount(self.amount),
            self.stage_name.clone(),
            self.forecast_category.clone(),
            self.close_date.format(date_format.pattern()).to_string(),
        ]
    }
}

/// 金额输出为最短可回读表示（12.5 而非 12.50）
pub fn format_amount(amount: f64) -> String {
    format!("{}", amount)
}

/// 四舍五入到两位小数
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OpportunityRecord {
        OpportunityRecord {
            external_id: "externalOpp0000001".to_string(),
            name: "name_externalOpp0000001".to_string(),
            account_id: "001000000000001AAA".to_string(),
            amount: 12.5,
            stage_name: "Discovery".to_string(),
            forecast_category: "Pipeline".to_string(),
            close_date: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
        }
    }

    #[test]
    fn test_to_row_european_date() {
        let row = sample().to_row(CloseDateFormat::DayMonthYear);
        assert_eq!(row.len(), OPPORTUNITY_CSV_HEADER.len());
        assert_eq!(row[3], "12.5");
        assert_eq!(row[6], "07/03/2026");
    }

    #[test]
    fn test_to_row_iso_date() {
        let row = sample().to_row(CloseDateFormat::Iso);
        assert_eq!(row[6], "2026-03-07");
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(999.999), 1000.0);
        assert_eq!(round_to_cents(1.0), 1.0);
        assert_eq!(round_to_cents(3.14159), 3.14);
    }
}
