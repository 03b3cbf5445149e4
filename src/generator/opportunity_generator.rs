// ==========================================
// 商机数据装载工具 - 商机测试数据生成器
// ==========================================
// 每列独立随机抽样:
// - ExternalId: externalOpp{序号:07}，序号 1..=N
// - Name:       name_{ExternalId}
// - Account:    从客户清单有放回均匀抽样
// - Amount:     [min, max] 均匀分布，保留两位小数
// - CloseDate:  生成日 + [0, window] 天
// - StageName / ForecastCategory: 常量
// ==========================================

use crate::config::GeneratorConfig;
use crate::domain::opportunity::{round_to_cents, OpportunityRecord};
use crate::generator::error::{GeneratorError, GeneratorResult};
use crate::importer::{read_account_ids, OpportunityCsvWriter};
use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// 外部 ID
pub fn external_id_for(index: usize) -> String {
    format!("externalOpp{:07}", index)
}

// ==========================================
// OpportunityGenerator
// ==========================================
pub struct OpportunityGenerator {
    accounts: Vec<String>,
    rng: StdRng,
    today: NaiveDate,
    amount_min: f64,
    amount_max: f64,
    window_days: i64,
    stage_name: String,
    forecast_category: String,
}

impl OpportunityGenerator {
    /// 创建生成器
    ///
    /// # 错误
    /// - NoAccounts: 客户清单为空（快速失败,不生成无效引用）
    /// - Config: 金额区间/日期窗口非法
    pub fn new(
        accounts: Vec<String>,
        config: &GeneratorConfig,
        today: NaiveDate,
    ) -> GeneratorResult<Self> {
        if accounts.is_empty() {
            return Err(GeneratorError::NoAccounts);
        }
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            accounts,
            rng,
            today,
            amount_min: config.amount_min,
            amount_max: config.amount_max,
            window_days: config.close_date_window_days,
            stage_name: config.stage_name.clone(),
            forecast_category: config.forecast_category.clone(),
        })
    }

    /// 生成第 index 条（index 从 1 开始）
    pub fn record(&mut self, index: usize) -> OpportunityRecord {
        let external_id = external_id_for(index);

        // accounts 非空由构造函数保证
        let account_id = self
            .accounts
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();

        let amount = round_to_cents(self.rng.gen_range(self.amount_min..=self.amount_max));
        let offset = self.rng.gen_range(0..=self.window_days);

        OpportunityRecord {
            name: format!("name_{}", external_id),
            external_id,
            account_id,
            amount,
            stage_name: self.stage_name.clone(),
            forecast_category: self.forecast_category.clone(),
            close_date: self.today + Duration::days(offset),
        }
    }

    /// 惰性生成 1..=count（大数据量直接流式落盘）
    pub fn records(&mut self, count: usize) -> impl Iterator<Item = OpportunityRecord> + '_ {
        (1..=count).map(move |index| self.record(index))
    }

    /// 一次性生成 count 条
    pub fn generate(&mut self, count: usize) -> Vec<OpportunityRecord> {
        self.records(count).collect()
    }
}

// ==========================================
// 生成报告
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub output_path: PathBuf,
    pub account_count: usize,
    pub records_written: usize,
    pub elapsed: std::time::Duration,
}

/// 读取客户清单 → 生成 → 写出 CSV（覆盖）
#[instrument(skip(config), fields(accounts = %config.accounts_path.display(), output = %config.output_path.display()))]
pub fn generate_to_csv(config: &GeneratorConfig) -> GeneratorResult<GenerationReport> {
    let start = Instant::now();

    let accounts = read_account_ids(&config.accounts_path)?;
    let account_count = accounts.len();
    info!(account_count, record_count = config.record_count, "开始生成商机数据");

    let today = Local::now().date_naive();
    let mut generator = OpportunityGenerator::new(accounts, config, today)?;

    let mut writer = OpportunityCsvWriter::create(&config.output_path, config.date_format)?;
    for (idx, record) in generator.records(config.record_count).enumerate() {
        writer.write(&record)?;
        if (idx + 1) % 500_000 == 0 {
            debug!(written = idx + 1, "生成进度");
        }
    }
    let records_written = writer.finish()?;

    let elapsed = start.elapsed();
    info!(records_written, elapsed_ms = elapsed.as_millis() as u64, "商机数据生成完成");

    Ok(GenerationReport {
        output_path: config.output_path.clone(),
        account_count,
        records_written,
        elapsed,
    })
}
