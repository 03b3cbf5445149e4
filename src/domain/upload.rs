// ==========================================
// 商机数据装载工具 - 上传批次与结果
// ==========================================
// Batch: 一次远程调用提交的连续记录切片（临时对象）
// UploadOutcome: 单批次结果
// UploadSummary: 全部批次汇总
// UploadRun: 台账中的一次上传运行
// ==========================================

use crate::domain::opportunity::OpportunityRecord;
use crate::domain::types::SubmitProtocol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ==========================================
// Batch - 上传批次
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub number: usize,                    // 批次序号（从 1 开始）
    pub total: usize,                     // 批次总数
    pub offset: usize,                    // 首条记录在全集中的下标（从 0 开始）
    pub records: &'a [OpportunityRecord], // 批次内记录
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 首行行号（从 1 开始,用于日志）
    pub fn first_row(&self) -> usize {
        self.offset + 1
    }

    /// 末行行号（含）
    pub fn last_row(&self) -> usize {
        self.offset + self.records.len()
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total
    }
}

// ==========================================
// BatchAcceptance - 远端受理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAcceptance {
    pub records_accepted: usize, // 远端确认处理的记录数
    pub job_id: Option<String>,  // 远端异步作业 ID（若有）
}

// ==========================================
// UploadOutcome - 单批次上传结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub batch_number: usize,       // 批次序号
    pub first_row: usize,          // 首行行号
    pub last_row: usize,           // 末行行号
    pub success: bool,             // 是否成功
    pub records_accepted: usize,   // 远端受理记录数（失败时为 0）
    pub job_id: Option<String>,    // 远端作业 ID
    pub error: Option<String>,     // 失败原因
}

impl UploadOutcome {
    pub fn accepted(batch: &Batch<'_>, acceptance: BatchAcceptance) -> Self {
        Self {
            batch_number: batch.number,
            first_row: batch.first_row(),
            last_row: batch.last_row(),
            success: true,
            records_accepted: acceptance.records_accepted,
            job_id: acceptance.job_id,
            error: None,
        }
    }

    pub fn failed(batch: &Batch<'_>, error: impl Into<String>) -> Self {
        Self {
            batch_number: batch.number,
            first_row: batch.first_row(),
            last_row: batch.last_row(),
            success: false,
            records_accepted: 0,
            job_id: None,
            error: Some(error.into()),
        }
    }

    /// 批次内记录数
    pub fn batch_len(&self) -> usize {
        if self.last_row < self.first_row {
            0
        } else {
            self.last_row - self.first_row + 1
        }
    }
}

// ==========================================
// UploadSummary - 上传汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total_records: usize,     // 文件记录总数
    pub total_batches: usize,     // 批次总数
    pub batches_attempted: usize, // 已尝试批次
    pub batches_succeeded: usize, // 成功批次
    pub records_processed: usize, // 远端确认处理的记录数
    pub records_failed: usize,    // 失败批次中的记录数
    pub job_ids: Vec<String>,     // 远端作业 ID 列表
    pub elapsed: Duration,        // 耗时
}

impl UploadSummary {
    pub fn batches_failed(&self) -> usize {
        self.batches_attempted - self.batches_succeeded
    }

    pub fn is_complete_success(&self) -> bool {
        self.batches_attempted == self.total_batches && self.batches_failed() == 0
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "上传完成")?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "成功批次: {}/{}",
            self.batches_succeeded, self.total_batches
        )?;
        writeln!(f, "失败批次: {}", self.batches_failed())?;
        writeln!(
            f,
            "已处理记录: {}/{}",
            self.records_processed, self.total_records
        )?;
        writeln!(f, "失败记录: {}", self.records_failed)?;
        writeln!(f, "创建作业数: {}", self.job_ids.len())?;
        for (idx, job_id) in self.job_ids.iter().enumerate() {
            writeln!(f, "  {}. {}", idx + 1, job_id)?;
        }
        writeln!(f, "耗时: {:.1}s", self.elapsed.as_secs_f64())?;
        write!(f, "{}", rule)
    }
}

// ==========================================
// UploadRun - 上传运行（台账）
// ==========================================
// 对齐: upload_run 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRun {
    pub run_id: String,                       // 运行 ID（UUID）
    pub protocol: SubmitProtocol,             // 提交协议
    pub source_file: String,                  // 源 CSV 路径
    pub total_records: usize,                 // 记录总数
    pub batch_size: usize,                    // 批次大小
    pub started_at: DateTime<Utc>,            // 开始时间
    pub finished_at: Option<DateTime<Utc>>,   // 结束时间（未结束为 None）
    pub batches_attempted: usize,             // 已尝试批次
    pub batches_succeeded: usize,             // 成功批次
    pub records_processed: usize,             // 已处理记录
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records(n: usize) -> Vec<OpportunityRecord> {
        (0..n)
            .map(|i| OpportunityRecord {
                external_id: format!("externalOpp{:07}", i + 1),
                name: format!("name_externalOpp{:07}", i + 1),
                account_id: "001A".to_string(),
                amount: 10.0,
                stage_name: "Discovery".to_string(),
                forecast_category: "Pipeline".to_string(),
                close_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_batch_row_numbers() {
        let all = records(25);
        let batch = Batch {
            number: 3,
            total: 3,
            offset: 20,
            records: &all[20..],
        };
        assert_eq!(batch.first_row(), 21);
        assert_eq!(batch.last_row(), 25);
        assert!(batch.is_last());
    }

    #[test]
    fn test_failed_outcome_accepts_nothing() {
        let all = records(4);
        let batch = Batch {
            number: 1,
            total: 2,
            offset: 0,
            records: &all[..2],
        };
        let outcome = UploadOutcome::failed(&batch, "HTTP 500");
        assert!(!outcome.success);
        assert_eq!(outcome.records_accepted, 0);
        assert_eq!(outcome.batch_len(), 2);
        assert_eq!(outcome.error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_summary_display_lists_jobs() {
        let summary = UploadSummary {
            total_records: 10,
            total_batches: 2,
            batches_attempted: 2,
            batches_succeeded: 1,
            records_processed: 5,
            records_failed: 5,
            job_ids: vec!["707xx0000001".to_string()],
            elapsed: Duration::from_millis(1500),
        };
        let text = summary.to_string();
        assert!(text.contains("成功批次: 1/2"));
        assert!(text.contains("1. 707xx0000001"));
        assert!(!summary.is_complete_success());
    }
}
