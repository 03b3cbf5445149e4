// ==========================================
// 商机数据装载工具 - 商机 CSV 读写
// ==========================================
// 列: ExternalId, Name, Account, Amount, StageName, ForecastCategory, CloseDate
// 日期: 读取兼容 DD/MM/YYYY 与 YYYY-MM-DD，写出按配置
// 写出: 覆盖同名文件
// ==========================================

use crate::domain::opportunity::{OpportunityRecord, OPPORTUNITY_CSV_HEADER};
use crate::domain::types::CloseDateFormat;
use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Writer};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

// ==========================================
// 原始行（全部按字符串读取,再逐字段转换）
// ==========================================
#[derive(Debug, Deserialize)]
struct RawOpportunityRow {
    #[serde(rename = "ExternalId")]
    external_id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "StageName")]
    stage_name: String,
    #[serde(rename = "ForecastCategory", default)]
    forecast_category: String,
    #[serde(rename = "CloseDate")]
    close_date: String,
}

impl RawOpportunityRow {
    fn into_record(self, row: usize) -> ImportResult<OpportunityRecord> {
        let external_id = self.external_id.trim().to_string();
        if external_id.is_empty() {
            warn!(row, "ExternalId 为空,交由远端校验");
        }

        let amount_text = self.amount.trim();
        let amount: f64 = amount_text
            .parse()
            .map_err(|e: std::num::ParseFloatError| ImportError::TypeConversionError {
                row,
                field: "Amount".to_string(),
                message: format!("{} ({})", e, amount_text),
            })?;
        if !amount.is_finite() || amount < 0.0 {
            warn!(row, amount = amount_text, "金额非正常值,交由远端校验");
        }

        let close_date = parse_close_date(self.close_date.trim()).ok_or_else(|| {
            ImportError::DateFormatError {
                row,
                field: "CloseDate".to_string(),
                value: self.close_date.clone(),
            }
        })?;

        Ok(OpportunityRecord {
            external_id,
            name: self.name.trim().to_string(),
            account_id: self.account.trim().to_string(),
            amount,
            stage_name: self.stage_name.trim().to_string(),
            forecast_category: self.forecast_category.trim().to_string(),
            close_date,
        })
    }
}

/// 解析成交日期（DD/MM/YYYY 优先，其次 ISO）
pub fn parse_close_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, CloseDateFormat::DayMonthYear.pattern())
        .or_else(|_| NaiveDate::parse_from_str(value, CloseDateFormat::Iso.pattern()))
        .ok()
}

// ==========================================
// 读取
// ==========================================

/// 从文件读取全部商机记录
pub fn read_opportunities<P: AsRef<Path>>(path: P) -> ImportResult<Vec<OpportunityRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let records = read_opportunities_from(file)?;

    info!(file = %path.display(), total = records.len(), "商机 CSV 读取完成");
    Ok(records)
}

/// 从任意 Reader 读取商机记录（表头必需）
pub fn read_opportunities_from<R: Read>(reader: R) -> ImportResult<Vec<OpportunityRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for required in OPPORTUNITY_CSV_HEADER
        .iter()
        .filter(|col| **col != "ForecastCategory")
    {
        if !headers.iter().any(|h| h == *required) {
            return Err(ImportError::MissingColumn((*required).to_string()));
        }
    }

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize::<RawOpportunityRow>().enumerate() {
        let row_number = idx + 1;
        let raw = result?;
        records.push(raw.into_record(row_number)?);
    }

    debug!(total = records.len(), "商机行解析完成");
    Ok(records)
}

// ==========================================
// 写出
// ==========================================

fn write_err(e: csv::Error) -> ImportError {
    ImportError::FileWriteError(e.to_string())
}

/// 商机 CSV 写出器
pub struct OpportunityCsvWriter<W: Write> {
    writer: Writer<W>,
    date_format: CloseDateFormat,
    written: usize,
}

impl OpportunityCsvWriter<File> {
    /// 创建文件写出器（覆盖已有文件）
    pub fn create<P: AsRef<Path>>(path: P, date_format: CloseDateFormat) -> ImportResult<Self> {
        let file = File::create(path.as_ref())
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::new(file, date_format)
    }
}

impl<W: Write> OpportunityCsvWriter<W> {
    /// 包装任意 Writer 并写出表头
    pub fn new(inner: W, date_format: CloseDateFormat) -> ImportResult<Self> {
        let mut writer = Writer::from_writer(inner);
        writer
            .write_record(OPPORTUNITY_CSV_HEADER)
            .map_err(write_err)?;
        Ok(Self {
            writer,
            date_format,
            written: 0,
        })
    }

    pub fn write(&mut self, record: &OpportunityRecord) -> ImportResult<()> {
        self.writer
            .write_record(record.to_row(self.date_format))
            .map_err(write_err)?;
        self.written += 1;
        Ok(())
    }

    /// 刷新并返回写出行数
    pub fn finish(mut self) -> ImportResult<usize> {
        self.writer
            .flush()
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        Ok(self.written)
    }

    /// 刷新并取回内部 Writer
    pub fn into_inner(self) -> ImportResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| ImportError::FileWriteError(e.error().to_string()))
    }
}

/// 将记录写出到文件（覆盖）
pub fn write_opportunities<P, I>(
    path: P,
    records: I,
    date_format: CloseDateFormat,
) -> ImportResult<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = OpportunityRecord>,
{
    let mut writer = OpportunityCsvWriter::create(path.as_ref(), date_format)?;
    for record in records {
        writer.write(&record)?;
    }
    let written = writer.finish()?;

    info!(file = %path.as_ref().display(), written, "商机 CSV 写出完成");
    Ok(written)
}
