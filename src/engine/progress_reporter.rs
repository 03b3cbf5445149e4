// ==========================================
// 商机数据装载工具 - 进度统计
// ==========================================
// 只做累计与输出,不影响控制流
// ==========================================

use crate::domain::upload::{UploadOutcome, UploadSummary};
use std::time::Instant;
use tracing::{info, warn};

pub struct ProgressReporter {
    summary: UploadSummary,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(total_records: usize, total_batches: usize) -> Self {
        Self {
            summary: UploadSummary {
                total_records,
                total_batches,
                ..UploadSummary::default()
            },
            started: Instant::now(),
        }
    }

    /// 累计一个批次结果
    pub fn record(&mut self, outcome: &UploadOutcome) {
        let s = &mut self.summary;
        s.batches_attempted += 1;

        if outcome.success {
            s.batches_succeeded += 1;
            s.records_processed += outcome.records_accepted;
            if let Some(job_id) = &outcome.job_id {
                s.job_ids.push(job_id.clone());
            }
            info!(
                batch = outcome.batch_number,
                total_batches = s.total_batches,
                accepted = outcome.records_accepted,
                job_id = outcome.job_id.as_deref().unwrap_or("N/A"),
                processed = s.records_processed,
                total_records = s.total_records,
                "✓ 批次上传成功"
            );
        } else {
            s.records_failed += outcome.batch_len();
            warn!(
                batch = outcome.batch_number,
                total_batches = s.total_batches,
                rows = %format!("{}-{}", outcome.first_row, outcome.last_row),
                error = outcome.error.as_deref().unwrap_or("未知错误"),
                "✗ 批次上传失败"
            );
        }
    }

    /// 当前汇总（含耗时）
    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            elapsed: self.started.elapsed(),
            ..self.summary.clone()
        }
    }

    /// 结束统计,输出最终日志
    pub fn finish(self) -> UploadSummary {
        let summary = self.summary();
        info!(
            batches_succeeded = summary.batches_succeeded,
            batches_failed = summary.batches_failed(),
            total_batches = summary.total_batches,
            records_processed = summary.records_processed,
            records_failed = summary.records_failed,
            jobs = summary.job_ids.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "上传结束"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(number: usize, success: bool, rows: (usize, usize), job: Option<&str>) -> UploadOutcome {
        UploadOutcome {
            batch_number: number,
            first_row: rows.0,
            last_row: rows.1,
            success,
            records_accepted: if success { rows.1 - rows.0 + 1 } else { 0 },
            job_id: job.map(str::to_string),
            error: (!success).then(|| "HTTP 500".to_string()),
        }
    }

    #[test]
    fn test_accumulates_success_and_failure() {
        let mut reporter = ProgressReporter::new(25, 3);
        reporter.record(&outcome(1, true, (1, 10), Some("707A")));
        reporter.record(&outcome(2, false, (11, 20), None));
        reporter.record(&outcome(3, true, (21, 25), None));

        let summary = reporter.finish();
        assert_eq!(summary.batches_attempted, 3);
        assert_eq!(summary.batches_succeeded, 2);
        assert_eq!(summary.batches_failed(), 1);
        assert_eq!(summary.records_processed, 15);
        assert_eq!(summary.records_failed, 10);
        assert_eq!(summary.job_ids, vec!["707A".to_string()]);
    }

    #[test]
    fn test_empty_run_summary() {
        let summary = ProgressReporter::new(0, 0).finish();
        assert_eq!(summary.batches_attempted, 0);
        assert!(summary.is_complete_success());
    }
}
