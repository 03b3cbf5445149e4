// ==========================================
// 商机数据装载工具 - 上传编排器
// ==========================================
// 单线顺序执行:
// 分批 → 逐批提交 → 归类结果 → 累计进度（+ 台账）→ 非末批等待固定间隔
// 全部批次后调用提交器收尾（失败仅告警）
// 红线: 单批次失败不中止;不重试
// ==========================================

use crate::config::UploadConfig;
use crate::domain::opportunity::OpportunityRecord;
use crate::domain::upload::{UploadOutcome, UploadRun, UploadSummary};
use crate::engine::batch_chunker::{chunk_records, ChunkResult};
use crate::engine::progress_reporter::ProgressReporter;
use crate::repository::UploadLedgerRepository;
use crate::salesforce::RemoteSubmitter;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct UploadOrchestrator<'a> {
    submitter: &'a dyn RemoteSubmitter,
    config: UploadConfig,
    ledger: Option<&'a UploadLedgerRepository>,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(submitter: &'a dyn RemoteSubmitter, config: UploadConfig) -> Self {
        Self {
            submitter,
            config,
            ledger: None,
        }
    }

    /// 挂接上传台账
    pub fn with_ledger(mut self, ledger: &'a UploadLedgerRepository) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// 执行一次完整上传
    ///
    /// # 参数
    /// - records: 全部待上传记录（保持文件顺序）
    ///
    /// # 返回
    /// - Ok(UploadSummary): 全部批次已尝试（不论成败）
    /// - Err(ChunkError): 批次大小非法,未发起任何调用
    #[instrument(skip(self, records), fields(
        protocol = %self.submitter.protocol(),
        total_records = records.len(),
        batch_size = self.config.batch_size
    ))]
    pub async fn run(&self, records: &[OpportunityRecord]) -> ChunkResult<UploadSummary> {
        let batches = chunk_records(records, self.config.batch_size)?;
        let total_batches = batches.len();

        info!(
            total_records = records.len(),
            total_batches,
            "开始上传"
        );

        let run_id = self.start_ledger_run(records.len());
        let mut reporter = ProgressReporter::new(records.len(), total_batches);

        for batch in &batches {
            info!(
                batch = batch.number,
                total_batches,
                rows = %format!("{}-{}", batch.first_row(), batch.last_row()),
                "提交批次"
            );

            let outcome = match self.submitter.submit(batch).await {
                Ok(acceptance) => UploadOutcome::accepted(batch, acceptance),
                Err(e) => UploadOutcome::failed(batch, e.to_string()),
            };

            reporter.record(&outcome);
            if let (Some(ledger), Some(run_id)) = (self.ledger, run_id.as_deref()) {
                if let Err(e) = ledger.record_batch(run_id, &outcome) {
                    warn!(run_id, batch = batch.number, error = %e, "台账写入批次失败");
                }
            }

            if !batch.is_last() && !self.config.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
        }

        if let Err(e) = self.submitter.finish().await {
            warn!(error = %e, "上传收尾失败");
        }

        let summary = reporter.finish();
        if let (Some(ledger), Some(run_id)) = (self.ledger, run_id.as_deref()) {
            if let Err(e) = ledger.finish_run(run_id, &summary, Utc::now()) {
                warn!(run_id, error = %e, "台账结束运行失败");
            }
        }

        Ok(summary)
    }

    /// 登记运行,失败则本次不写台账
    fn start_ledger_run(&self, total_records: usize) -> Option<String> {
        let ledger = self.ledger?;
        let run = UploadRun {
            run_id: Uuid::new_v4().to_string(),
            protocol: self.submitter.protocol(),
            source_file: self.config.csv_path.display().to_string(),
            total_records,
            batch_size: self.config.batch_size,
            started_at: Utc::now(),
            finished_at: None,
            batches_attempted: 0,
            batches_succeeded: 0,
            records_processed: 0,
        };

        match ledger.start_run(&run) {
            Ok(()) => {
                info!(run_id = %run.run_id, "台账已登记运行");
                Some(run.run_id)
            }
            Err(e) => {
                warn!(error = %e, "台账登记运行失败,本次不写台账");
                None
            }
        }
    }
}
