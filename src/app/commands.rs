// ==========================================
// 商机数据装载工具 - 应用命令
// ==========================================
// 职责: 命令行子命令与交互菜单共用的操作
// 输出: 面向用户的文本写入 out,运行日志走 tracing
// ==========================================

use crate::app::error::{AppError, AppResult};
use crate::app::state::AppState;
use crate::config::{GeneratorConfig, UploadConfig};
use crate::domain::types::SubmitProtocol;
use crate::domain::upload::UploadSummary;
use crate::engine::{chunk_count, UploadOrchestrator};
use crate::generator::{generate_to_csv, GenerationReport};
use crate::importer::read_opportunities;
use crate::repository::UploadLedgerRepository;
use crate::salesforce::{submitter_for, JobMonitor, REST_ENDPOINT_APEX_SOURCE};
use std::io::Write;
use tracing::info;

fn rule() -> String {
    "=".repeat(60)
}

// ==========================================
// 数据生成
// ==========================================

pub fn generate<W: Write>(config: &GeneratorConfig, out: &mut W) -> AppResult<GenerationReport> {
    let report = generate_to_csv(config)?;

    writeln!(out, "{}", rule())?;
    writeln!(out, "商机数据生成完成")?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "客户数: {}", report.account_count)?;
    writeln!(out, "生成记录: {}", report.records_written)?;
    writeln!(out, "输出文件: {}", report.output_path.display())?;
    writeln!(out, "耗时: {:.1}s", report.elapsed.as_secs_f64())?;
    Ok(report)
}

// ==========================================
// 上传
// ==========================================

/// 读取 CSV 并分批上传
///
/// 文件读取在登录之前完成;登录失败直接返回（不提交任何批次）
pub async fn upload_csv<W: Write>(
    state: &AppState,
    config: &UploadConfig,
    out: &mut W,
) -> AppResult<UploadSummary> {
    config.validate()?;

    writeln!(out, "{}", rule())?;
    writeln!(out, "开始上传（协议: {}）", config.protocol)?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "读取 CSV: {}", config.csv_path.display())?;

    let records = read_opportunities(&config.csv_path)?;
    let total_batches = chunk_count(records.len(), config.batch_size)?;
    writeln!(out, "记录总数: {}", records.len())?;
    writeln!(
        out,
        "分 {} 批,每批最多 {} 条",
        total_batches, config.batch_size
    )?;
    out.flush()?;

    let client = state.client().await?;
    let submitter = submitter_for(config.protocol, client);
    let summary = UploadOrchestrator::new(submitter.as_ref(), config.clone())
        .with_ledger(state.ledger.as_ref())
        .run(&records)
        .await?;

    writeln!(out, "{}", summary)?;
    write_next_steps(config.protocol, out)?;
    Ok(summary)
}

fn write_next_steps<W: Write>(protocol: SubmitProtocol, out: &mut W) -> AppResult<()> {
    writeln!(out, "后续检查:")?;
    match protocol {
        SubmitProtocol::ApexScript => {
            writeln!(out, "1. 在 Salesforce 中查询 External_Id__c 非空的商机数")?;
        }
        SubmitProtocol::RestJson => {
            writeln!(out, "1. 批处理作业: Setup → Apex Jobs（或 jobs 命令）")?;
            writeln!(out, "2. Bulk API 作业: Setup → Bulk Data Load Jobs")?;
        }
        SubmitProtocol::BulkIngest => {
            writeln!(out, "1. 导入作业: Setup → Bulk Data Load Jobs（或 jobs --run 命令）")?;
        }
    }
    writeln!(out, "已上传数量: progress 命令")?;
    Ok(())
}

// ==========================================
// 监控
// ==========================================

/// 最近的批处理作业
pub async fn show_batch_jobs<W: Write>(
    monitor: &JobMonitor,
    limit: usize,
    out: &mut W,
) -> AppResult<()> {
    let jobs = monitor.recent_batch_jobs(limit).await?;

    writeln!(out, "{}", rule())?;
    writeln!(out, "最近的批处理作业")?;
    writeln!(out, "{}", rule())?;

    if jobs.is_empty() {
        writeln!(out, "未找到批处理作业")?;
        return Ok(());
    }
    for job in &jobs {
        writeln!(out, "作业 ID: {}", job.id)?;
        writeln!(out, "  状态: {}", job.status)?;
        writeln!(out, "  进度: {}/{}", job.job_items_processed, job.total_job_items)?;
        writeln!(out, "  错误数: {}", job.number_of_errors)?;
        writeln!(out, "  创建时间: {}", job.created_date)?;
    }
    Ok(())
}

/// 已上传商机数
pub async fn show_upload_progress<W: Write>(monitor: &JobMonitor, out: &mut W) -> AppResult<u64> {
    let count = monitor.count_uploaded().await?;

    writeln!(out, "{}", rule())?;
    writeln!(out, "带外部 ID 的商机数: {}", count)?;
    writeln!(out, "{}", rule())?;
    Ok(count)
}

/// 本地台账中的最近运行
pub fn show_recent_runs<W: Write>(
    ledger: &UploadLedgerRepository,
    limit: usize,
    out: &mut W,
) -> AppResult<()> {
    let runs = ledger.recent_runs(limit)?;

    writeln!(out, "{}", rule())?;
    writeln!(out, "最近的上传运行")?;
    writeln!(out, "{}", rule())?;

    if runs.is_empty() {
        writeln!(out, "暂无上传记录")?;
        return Ok(());
    }
    for run in &runs {
        let finished = run
            .finished_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "未结束".to_string());
        writeln!(out, "运行 ID: {}", run.run_id)?;
        writeln!(out, "  协议: {}  文件: {}", run.protocol, run.source_file)?;
        writeln!(
            out,
            "  批次: {}/{} 成功  记录: {}/{}",
            run.batches_succeeded, run.batches_attempted, run.records_processed, run.total_records
        )?;
        writeln!(
            out,
            "  开始: {}  结束: {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            finished
        )?;
    }
    Ok(())
}

/// 台账中某次运行产生的远端作业状态
pub async fn show_run_jobs<W: Write>(
    ledger: &UploadLedgerRepository,
    monitor: &JobMonitor,
    run_id: &str,
    out: &mut W,
) -> AppResult<()> {
    let run = ledger
        .find_run(run_id)?
        .ok_or_else(|| AppError::InvalidInput(format!("未知运行 ID: {}", run_id)))?;
    let job_ids = ledger.job_ids_for_run(run_id)?;
    info!(run_id, protocol = %run.protocol, jobs = job_ids.len(), "查询运行作业");

    writeln!(out, "{}", rule())?;
    writeln!(out, "运行 {} 的远端作业（{}）", run_id, run.protocol)?;
    writeln!(out, "{}", rule())?;

    if job_ids.is_empty() {
        writeln!(out, "该运行未记录作业 ID")?;
        return Ok(());
    }

    match run.protocol {
        SubmitProtocol::BulkIngest => {
            for job_id in &job_ids {
                let info = monitor.ingest_job_status(job_id).await?;
                let marker = if info.is_failed() {
                    "✗ 已终止"
                } else if info.is_terminal() {
                    "✓ 已完成"
                } else {
                    "… 处理中"
                };
                writeln!(out, "作业 ID: {}", info.id)?;
                writeln!(out, "  状态: {} ({})", info.state, marker)?;
                writeln!(
                    out,
                    "  已处理: {}  失败: {}",
                    info.number_records_processed, info.number_records_failed
                )?;
                if let Some(message) = &info.error_message {
                    writeln!(out, "  错误: {}", message)?;
                }
            }
        }
        _ => {
            for job in monitor.batch_jobs_by_ids(&job_ids).await? {
                writeln!(out, "作业 ID: {}", job.id)?;
                writeln!(out, "  状态: {}", job.status)?;
                writeln!(out, "  进度: {}/{}", job.job_items_processed, job.total_job_items)?;
                writeln!(out, "  错误数: {}", job.number_of_errors)?;
            }
        }
    }
    Ok(())
}

/// 输出 REST 端点 Apex 源码及部署步骤
pub fn show_endpoint_source<W: Write>(out: &mut W) -> AppResult<()> {
    writeln!(out, "{}", rule())?;
    writeln!(out, "重要: 请先将以下 Apex REST 类部署到 Salesforce")?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "1. Setup → Apex Classes → New")?;
    writeln!(out, "2. 粘贴以下代码:")?;
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "{}", REST_ENDPOINT_APEX_SOURCE)?;
    writeln!(out, "{}", "-".repeat(60))?;
    writeln!(out, "3. 保存后再执行上传")?;
    Ok(())
}
