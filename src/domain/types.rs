// ==========================================
// 商机数据装载工具 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 提交协议 (Submit Protocol)
// ==========================================
// 三种远程调用方式互斥,由同一个上传循环驱动
// 序列化格式: kebab-case (与命令行参数、台账一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitProtocol {
    ApexScript, // 匿名 Apex 脚本 (tooling/executeAnonymous)
    RestJson,   // Apex REST 端点 (JSON 数组)
    BulkIngest, // Bulk API 2.0 ingest job
}

impl SubmitProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitProtocol::ApexScript => "apex-script",
            SubmitProtocol::RestJson => "rest-json",
            SubmitProtocol::BulkIngest => "bulk-ingest",
        }
    }
}

impl fmt::Display for SubmitProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmitProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apex-script" | "apex" => Ok(SubmitProtocol::ApexScript),
            "rest-json" | "rest" => Ok(SubmitProtocol::RestJson),
            "bulk-ingest" | "bulk" => Ok(SubmitProtocol::BulkIngest),
            other => Err(format!(
                "未知提交协议: {}（可选 apex-script / rest-json / bulk-ingest）",
                other
            )),
        }
    }
}

// ==========================================
// 成交日期格式 (Close Date Format)
// ==========================================
// 生成阶段使用 日/月/年,Bulk API 阶段使用 ISO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CloseDateFormat {
    #[default]
    DayMonthYear, // %d/%m/%Y
    Iso,          // %Y-%m-%d
}

impl CloseDateFormat {
    /// chrono 格式串
    pub fn pattern(&self) -> &'static str {
        match self {
            CloseDateFormat::DayMonthYear => "%d/%m/%Y",
            CloseDateFormat::Iso => "%Y-%m-%d",
        }
    }
}

impl FromStr for CloseDateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dmy" | "european" | "%d/%m/%y" => Ok(CloseDateFormat::DayMonthYear),
            "iso" | "%y-%m-%d" => Ok(CloseDateFormat::Iso),
            other => Err(format!("未知日期格式: {}（可选 dmy / iso）", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parse_aliases() {
        assert_eq!("apex".parse::<SubmitProtocol>(), Ok(SubmitProtocol::ApexScript));
        assert_eq!("REST-JSON".parse::<SubmitProtocol>(), Ok(SubmitProtocol::RestJson));
        assert_eq!("bulk".parse::<SubmitProtocol>(), Ok(SubmitProtocol::BulkIngest));
        assert!("soap".parse::<SubmitProtocol>().is_err());
    }

    #[test]
    fn test_protocol_display_matches_parse() {
        for protocol in [
            SubmitProtocol::ApexScript,
            SubmitProtocol::RestJson,
            SubmitProtocol::BulkIngest,
        ] {
            assert_eq!(protocol.to_string().parse::<SubmitProtocol>(), Ok(protocol));
        }
    }

    #[test]
    fn test_close_date_format_pattern() {
        assert_eq!(CloseDateFormat::default().pattern(), "%d/%m/%Y");
        assert_eq!("iso".parse::<CloseDateFormat>().unwrap().pattern(), "%Y-%m-%d");
    }
}
