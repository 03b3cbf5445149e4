// ==========================================
// 商机数据装载工具 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout
// - 台账表按需创建（CREATE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 上传台账表结构
const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS upload_run (
  run_id TEXT PRIMARY KEY,
  protocol TEXT NOT NULL CHECK(protocol IN ('apex-script', 'rest-json', 'bulk-ingest')),
  source_file TEXT NOT NULL,
  total_records INTEGER NOT NULL,
  batch_size INTEGER NOT NULL,
  started_at TEXT NOT NULL,
  finished_at TEXT,
  batches_attempted INTEGER NOT NULL DEFAULT 0,
  batches_succeeded INTEGER NOT NULL DEFAULT 0,
  records_processed INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS upload_batch (
  run_id TEXT NOT NULL REFERENCES upload_run(run_id) ON DELETE CASCADE,
  batch_number INTEGER NOT NULL,
  first_row INTEGER NOT NULL,
  last_row INTEGER NOT NULL,
  success INTEGER NOT NULL,
  records_accepted INTEGER NOT NULL DEFAULT 0,
  job_id TEXT,
  error TEXT,
  recorded_at TEXT NOT NULL,
  PRIMARY KEY (run_id, batch_number)
);

CREATE INDEX IF NOT EXISTS idx_upload_run_started_at ON upload_run(started_at DESC);
CREATE INDEX IF NOT EXISTS idx_upload_batch_job_id ON upload_batch(job_id);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建台账表并登记 schema_version（幂等）
pub fn init_ledger_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(LEDGER_SCHEMA)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_ledger_schema(&conn).unwrap();
        init_ledger_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let conn = open_sqlite_connection(path.to_str().unwrap()).unwrap();
        init_ledger_schema(&conn).unwrap();

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
