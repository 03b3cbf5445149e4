// ==========================================
// 商机数据装载工具 - 上传台账仓储
// ==========================================
// 表: upload_run（一次运行）/ upload_batch（单批次结果）
// 用途: 记录每次上传的批次结果与远端作业 ID,供事后查询
// 约束: 台账写入失败不影响上传本身（由调用方降级为告警）
// ==========================================

use crate::domain::types::SubmitProtocol;
use crate::domain::upload::{UploadOutcome, UploadRun, UploadSummary};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct UploadLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UploadLedgerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_schema() {
            tracing::warn!(error = %e, "上传台账建表失败");
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        crate::db::init_ledger_schema(&conn)?;
        Ok(())
    }

    /// 登记一次新运行
    pub fn start_run(&self, run: &UploadRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO upload_run (
              run_id, protocol, source_file, total_records, batch_size,
              started_at, finished_at,
              batches_attempted, batches_succeeded, records_processed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                run.run_id,
                run.protocol.as_str(),
                run.source_file,
                run.total_records as i64,
                run.batch_size as i64,
                format_ts(run.started_at),
                run.finished_at.map(format_ts),
                run.batches_attempted as i64,
                run.batches_succeeded as i64,
                run.records_processed as i64,
            ],
        )?;

        Ok(())
    }

    /// 记录单批次结果,同时累加运行计数
    pub fn record_batch(&self, run_id: &str, outcome: &UploadOutcome) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO upload_batch (
              run_id, batch_number, first_row, last_row,
              success, records_accepted, job_id, error, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                run_id,
                outcome.batch_number as i64,
                outcome.first_row as i64,
                outcome.last_row as i64,
                if outcome.success { 1 } else { 0 },
                outcome.records_accepted as i64,
                outcome.job_id,
                outcome.error,
                format_ts(Utc::now()),
            ],
        )?;

        tx.execute(
            r#"
            UPDATE upload_run
            SET batches_attempted = batches_attempted + 1,
                batches_succeeded = batches_succeeded + ?2,
                records_processed = records_processed + ?3
            WHERE run_id = ?1
            "#,
            params![
                run_id,
                if outcome.success { 1 } else { 0 },
                outcome.records_accepted as i64,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// 结束运行（以汇总为准回写计数）
    pub fn finish_run(
        &self,
        run_id: &str,
        summary: &UploadSummary,
        finished_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let updated = conn.execute(
            r#"
            UPDATE upload_run
            SET finished_at = ?2,
                batches_attempted = ?3,
                batches_succeeded = ?4,
                records_processed = ?5
            WHERE run_id = ?1
            "#,
            params![
                run_id,
                format_ts(finished_at),
                summary.batches_attempted as i64,
                summary.batches_succeeded as i64,
                summary.records_processed as i64,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "upload_run".to_string(),
                id: run_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_run(&self, run_id: &str) -> RepositoryResult<Option<UploadRun>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!("{} WHERE run_id = ?1", SELECT_RUN))?;
        match stmt.query_row(params![run_id], map_run) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 最近的运行（新的在前）
    pub fn recent_runs(&self, limit: usize) -> RepositoryResult<Vec<UploadRun>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY started_at DESC, rowid DESC LIMIT ?1",
            SELECT_RUN
        ))?;
        let runs = stmt
            .query_map(params![limit as i64], map_run)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }

    /// 运行中产生的远端作业 ID（按批次顺序）
    pub fn job_ids_for_run(&self, run_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT job_id FROM upload_batch
            WHERE run_id = ?1 AND job_id IS NOT NULL
            ORDER BY batch_number
            "#,
        )?;
        let ids = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(ids)
    }

    pub fn batch_outcomes(&self, run_id: &str) -> RepositoryResult<Vec<UploadOutcome>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_number, first_row, last_row, success, records_accepted, job_id, error
            FROM upload_batch
            WHERE run_id = ?1
            ORDER BY batch_number
            "#,
        )?;
        let outcomes = stmt
            .query_map(params![run_id], |row| {
                Ok(UploadOutcome {
                    batch_number: row.get::<_, i64>(0)? as usize,
                    first_row: row.get::<_, i64>(1)? as usize,
                    last_row: row.get::<_, i64>(2)? as usize,
                    success: row.get::<_, i64>(3)? != 0,
                    records_accepted: row.get::<_, i64>(4)? as usize,
                    job_id: row.get(5)?,
                    error: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(outcomes)
    }
}

const SELECT_RUN: &str = r#"
SELECT run_id, protocol, source_file, total_records, batch_size,
       started_at, finished_at,
       batches_attempted, batches_succeeded, records_processed
FROM upload_run
"#;

/// 固定精度的 UTC 时间戳（字符串排序即时间排序）
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, value: &str) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_run(row: &Row) -> SqliteResult<UploadRun> {
    let protocol_str: String = row.get(1)?;
    let started_at_str: String = row.get(5)?;
    let finished_at_str: Option<String> = row.get(6)?;

    let protocol: SubmitProtocol = protocol_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;
    let started_at = parse_ts(5, &started_at_str)?;
    let finished_at = finished_at_str
        .as_deref()
        .map(|s| parse_ts(6, s))
        .transpose()?;

    Ok(UploadRun {
        run_id: row.get(0)?,
        protocol,
        source_file: row.get(2)?,
        total_records: row.get::<_, i64>(3)? as usize,
        batch_size: row.get::<_, i64>(4)? as usize,
        started_at,
        finished_at,
        batches_attempted: row.get::<_, i64>(7)? as usize,
        batches_succeeded: row.get::<_, i64>(8)? as usize,
        records_processed: row.get::<_, i64>(9)? as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn setup_repo() -> UploadLedgerRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        UploadLedgerRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn make_run(run_id: &str, started_at: DateTime<Utc>) -> UploadRun {
        UploadRun {
            run_id: run_id.to_string(),
            protocol: SubmitProtocol::RestJson,
            source_file: "generated_opportunities_enhanced.csv".to_string(),
            total_records: 25,
            batch_size: 10,
            started_at,
            finished_at: None,
            batches_attempted: 0,
            batches_succeeded: 0,
            records_processed: 0,
        }
    }

    fn outcome(number: usize, rows: (usize, usize), job_id: Option<&str>) -> UploadOutcome {
        UploadOutcome {
            batch_number: number,
            first_row: rows.0,
            last_row: rows.1,
            success: job_id.is_some(),
            records_accepted: if job_id.is_some() { rows.1 - rows.0 + 1 } else { 0 },
            job_id: job_id.map(str::to_string),
            error: job_id.is_none().then(|| "HTTP 500".to_string()),
        }
    }

    #[test]
    fn test_start_and_find_run() {
        let repo = setup_repo();
        let run = make_run("run-1", Utc::now());
        repo.start_run(&run).unwrap();

        let found = repo.find_run("run-1").unwrap().unwrap();
        assert_eq!(found.protocol, SubmitProtocol::RestJson);
        assert_eq!(found.total_records, 25);
        assert!(found.finished_at.is_none());
        assert!(repo.find_run("missing").unwrap().is_none());
    }

    #[test]
    fn test_record_batches_accumulates_counts() {
        let repo = setup_repo();
        repo.start_run(&make_run("run-1", Utc::now())).unwrap();

        repo.record_batch("run-1", &outcome(1, (1, 10), Some("707A"))).unwrap();
        repo.record_batch("run-1", &outcome(2, (11, 20), None)).unwrap();
        repo.record_batch("run-1", &outcome(3, (21, 25), Some("707C"))).unwrap();

        let run = repo.find_run("run-1").unwrap().unwrap();
        assert_eq!(run.batches_attempted, 3);
        assert_eq!(run.batches_succeeded, 2);
        assert_eq!(run.records_processed, 15);

        assert_eq!(
            repo.job_ids_for_run("run-1").unwrap(),
            vec!["707A".to_string(), "707C".to_string()]
        );

        let outcomes = repo.batch_outcomes("run-1").unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_duplicate_batch_rejected() {
        let repo = setup_repo();
        repo.start_run(&make_run("run-1", Utc::now())).unwrap();
        repo.record_batch("run-1", &outcome(1, (1, 10), Some("707A"))).unwrap();

        let err = repo
            .record_batch("run-1", &outcome(1, (1, 10), Some("707A")))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_batch_for_unknown_run_rejected() {
        let repo = setup_repo();
        let err = repo
            .record_batch("ghost", &outcome(1, (1, 10), None))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_finish_run() {
        let repo = setup_repo();
        repo.start_run(&make_run("run-1", Utc::now())).unwrap();

        let summary = UploadSummary {
            total_records: 25,
            total_batches: 3,
            batches_attempted: 3,
            batches_succeeded: 3,
            records_processed: 25,
            ..UploadSummary::default()
        };
        repo.finish_run("run-1", &summary, Utc::now()).unwrap();

        let run = repo.find_run("run-1").unwrap().unwrap();
        assert!(run.finished_at.is_some());
        assert_eq!(run.records_processed, 25);

        assert!(matches!(
            repo.finish_run("missing", &summary, Utc::now()),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_recent_runs_newest_first() {
        let repo = setup_repo();
        let now = Utc::now();
        repo.start_run(&make_run("old", now - Duration::hours(2))).unwrap();
        repo.start_run(&make_run("new", now)).unwrap();
        repo.start_run(&make_run("mid", now - Duration::hours(1))).unwrap();

        let runs = repo.recent_runs(2).unwrap();
        let ids: Vec<&str> = runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }
}
