// ==========================================
// 商机数据装载工具 - 文件解析器实现
// ==========================================
// 用途: 将参考表（客户清单）解析为原始行记录
// 支持: Excel (.xlsx) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 原始行记录（列名 → 值）
pub type RawRow = HashMap<String, String>;

/// 小写扩展名（无扩展名为空串）
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// 按表头组装行;全空白行返回 None
fn assemble_row<I>(headers: &[String], cells: I) -> Option<RawRow>
where
    I: IntoIterator<Item = String>,
{
    let row: RawRow = headers
        .iter()
        .cloned()
        .zip(cells.into_iter().map(|cell| cell.trim().to_string()))
        .collect();
    if row.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row)
    }
}

fn ensure_file(path: &Path, expected: &str) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let ext = extension_of(path);
    if ext != expected {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表（跳过全空白行）
    /// - Err: 文件不存在、扩展名不符、解析失败
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从任意输入流解析（首行为表头,去掉 UTF-8 BOM）
    pub fn parse_reader<R: Read>(&self, input: R) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(row) = assemble_row(&headers, record.iter().map(str::to_string)) {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_file(file_path, "csv")?;
        self.parse_reader(File::open(file_path)?)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读第一个工作表,首行为表头
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_file(file_path, "xlsx")?;

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        Ok(sheet_rows
            .filter_map(|cells| assemble_row(&headers, cells.iter().map(|c| c.to_string())))
            .collect())
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_raw_records(path),
            "xlsx" => ExcelParser.parse_to_raw_records(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["Id,Name", "001A,Acme", "001B,Globex"]);

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Id"), Some(&"001A".to_string()));
        assert_eq!(records[1].get("Name"), Some(&"Globex".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_records(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let temp_file = csv_file(&["Id,Name", "001A,Acme", ",", "001B,Globex"]);

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_csv_reader_strips_bom_and_pads_short_rows() {
        let input = "\u{feff}Id,Name\n001A\n001B,Globex\n";
        let records = CsvParser.parse_reader(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Id"), Some(&"001A".to_string()));
        assert_eq!(records[0].get("Name"), None);
    }

    #[test]
    fn test_csv_parser_rejects_wrong_extension() {
        let mut temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(temp_file, "Id").unwrap();
        let result = CsvParser.parse_to_raw_records(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser.parse("accounts.json");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "json"));
    }
}
