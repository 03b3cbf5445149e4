// ==========================================
// 商机数据装载工具 - 客户清单读取
// ==========================================
// 输入: Accounts.csv / Accounts.xlsx，必需列 `Id`
// 输出: 去重后的客户 ID（保持首次出现顺序）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// 客户 ID 列名
pub const ACCOUNT_ID_COLUMN: &str = "Id";

/// 读取客户 ID 列表
pub fn read_account_ids<P: AsRef<Path>>(path: P) -> ImportResult<Vec<String>> {
    let path = path.as_ref();
    let rows = UniversalFileParser.parse(path)?;
    let ids = collect_account_ids(&rows)?;

    info!(
        file = %path.display(),
        rows = rows.len(),
        unique_ids = ids.len(),
        "客户清单读取完成"
    );
    Ok(ids)
}

/// 从原始行中提取去重的客户 ID
pub fn collect_account_ids(rows: &[RawRow]) -> ImportResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for row in rows {
        let id = row
            .get(ACCOUNT_ID_COLUMN)
            .ok_or_else(|| ImportError::MissingColumn(ACCOUNT_ID_COLUMN.to_string()))?;

        if id.is_empty() {
            debug!("跳过空客户 ID");
            continue;
        }

        if seen.insert(id.clone()) {
            ids.push(id.clone());
        }
    }

    Ok(ids)
}
