// ==========================================
// 商机数据装载工具 - Apex 脚本与端点源码
// ==========================================
// 匿名 Apex: 每条记录一行 OpportunityBulkUploader.addRecord(...)
// REST 端点: OpportunityBulkRestAPI（需先部署到组织）
// ==========================================

use crate::domain::opportunity::{format_amount, OpportunityRecord};

/// 收尾脚本（把 Apex 侧缓冲区中剩余的记录提交掉）
pub const APEX_FLUSH_SCRIPT: &str = "OpportunityBulkUploader.flush();";

/// 批量 REST 端点相对路径（apexrest 之下）
pub const REST_ENDPOINT_PATH: &str = "api/opportunity/bulk";

/// 批量 REST 端点的 Apex 类源码（endpoint 命令输出,供手工部署）
pub const REST_ENDPOINT_APEX_SOURCE: &str = r#"@RestResource(urlMapping='/api/opportunity/bulk/*')
global class OpportunityBulkRestAPI {

    @HttpPost
    global static Response uploadOpportunities(List<OppRecord> records) {
        try {
            OpportunityBulkAPIUploader uploader = new OpportunityBulkAPIUploader();

            for (OppRecord rec : records) {
                uploader.addRecord(
                    rec.externalId,
                    rec.stageName,
                    rec.amount,
                    rec.accountId,
                    rec.name
                );
            }

            Id jobId = uploader.executeUpload();

            return new Response(
                true,
                'Success',
                records.size(),
                jobId != null ? String.valueOf(jobId) : null
            );

        } catch (Exception e) {
            return new Response(false, e.getMessage(), 0, null);
        }
    }

    global class OppRecord {
        global String externalId;
        global String stageName;
        global Decimal amount;
        global String accountId;
        global String name;
    }

    global class Response {
        global Boolean success;
        global String message;
        global Integer recordCount;
        global String batchJobId;

        global Response(Boolean success, String message, Integer count, String jobId) {
            this.success = success;
            this.message = message;
            this.recordCount = count;
            this.batchJobId = jobId;
        }
    }
}"#;

/// 转义 Apex 单引号字符串字面量（先反斜杠,再单引号）
pub fn escape_apex_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// 单条记录的 addRecord 调用
fn add_record_line(record: &OpportunityRecord) -> String {
    format!(
        "OpportunityBulkUploader.addRecord('{}', '{}', {}, '{}', '{}');",
        escape_apex_string(&record.external_id),
        escape_apex_string(&record.stage_name),
        format_amount(record.amount),
        escape_apex_string(&record.account_id),
        escape_apex_string(&record.name),
    )
}

/// 构造一个批次的匿名 Apex 脚本（每条记录一行,\n 分隔）
pub fn build_add_record_script(records: &[OpportunityRecord]) -> String {
    records
        .iter()
        .map(add_record_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(external_id: &str, name: &str, amount: f64) -> OpportunityRecord {
        OpportunityRecord {
            external_id: external_id.to_string(),
            name: name.to_string(),
            account_id: "001000000000001AAA".to_string(),
            amount,
            stage_name: "Discovery".to_string(),
            forecast_category: "Pipeline".to_string(),
            close_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        }
    }

    #[test]
    fn test_escape_quote_and_backslash() {
        assert_eq!(escape_apex_string("O'Brien"), "O\\'Brien");
        assert_eq!(escape_apex_string("a\\b"), "a\\\\b");
        // 反斜杠先转义,避免把 \' 再拆开
        assert_eq!(escape_apex_string("\\'"), "\\\\\\'");
    }

    #[test]
    fn test_script_one_line_per_record() {
        let records = vec![
            record("externalOpp0000001", "name_externalOpp0000001", 12.5),
            record("externalOpp0000002", "O'Neil deal", 1000.0),
        ];
        let script = build_add_record_script(&records);
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "OpportunityBulkUploader.addRecord('externalOpp0000001', 'Discovery', 12.5, '001000000000001AAA', 'name_externalOpp0000001');"
        );
        assert!(lines[1].contains("'O\\'Neil deal'"));
        assert!(lines[1].contains(", 1000, "));
    }

    #[test]
    fn test_empty_batch_gives_empty_script() {
        assert!(build_add_record_script(&[]).is_empty());
    }

    #[test]
    fn test_endpoint_source_mapping() {
        assert!(REST_ENDPOINT_APEX_SOURCE.contains("urlMapping='/api/opportunity/bulk/*'"));
        assert!(REST_ENDPOINT_APEX_SOURCE.contains("global Integer recordCount;"));
    }
}
