// ==========================================
// 商机数据装载工具 - Salesforce 会话
// ==========================================
// 登录方式: SOAP partner API (username + password + security token)
// 输出: instance_url + session_id（后续 REST 调用使用 Bearer）
// ==========================================

use crate::config::SalesforceConfig;
use crate::salesforce::error::{RemoteError, RemoteResult};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, instrument};
use url::Url;

// ==========================================
// SalesforceSession
// ==========================================
#[derive(Clone, PartialEq, Eq)]
pub struct SalesforceSession {
    pub instance_url: Url,  // 实例根地址（如 https://na1.salesforce.com）
    pub session_id: String, // 会话 ID
}

impl SalesforceSession {
    pub fn new(instance_url: Url, session_id: impl Into<String>) -> Self {
        Self {
            instance_url,
            session_id: session_id.into(),
        }
    }

    /// 由登录响应中的 serverUrl 推导实例根地址
    pub fn from_server_url(server_url: &str, session_id: impl Into<String>) -> RemoteResult<Self> {
        let parsed = Url::parse(server_url)?;
        let origin = parsed.origin().ascii_serialization();
        Ok(Self::new(Url::parse(&origin)?, session_id))
    }

    /// 实例主机名（日志展示）
    pub fn instance_host(&self) -> &str {
        self.instance_url.host_str().unwrap_or("unknown")
    }
}

// 会话 ID 不进日志
impl std::fmt::Debug for SalesforceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceSession")
            .field("instance_url", &self.instance_url.as_str())
            .field("session_id", &"***")
            .finish()
    }
}

// ==========================================
// SOAP 登录
// ==========================================

/// 登录响应中关心的字段
#[derive(Debug, Default, PartialEq, Eq)]
struct LoginResponse {
    server_url: Option<String>,
    session_id: Option<String>,
    fault: Option<String>,
}

fn build_login_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        escape(username),
        escape(password)
    )
}

/// 解析登录响应（按本地名匹配,忽略命名空间前缀）
fn parse_login_response(xml: &str) -> RemoteResult<LoginResponse> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut parsed = LoginResponse::default();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                match current.as_deref() {
                    Some("serverUrl") => parsed.server_url = Some(text),
                    Some("sessionId") => parsed.session_id = Some(text),
                    Some("faultstring") => parsed.fault = Some(text),
                    _ => {}
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}

/// 登录 Salesforce
///
/// 任何失败都归类为 RemoteError::Login（致命）
#[instrument(skip(http, config), fields(username = %config.username, domain = %config.domain))]
pub async fn login(
    http: &reqwest::Client,
    config: &SalesforceConfig,
) -> RemoteResult<SalesforceSession> {
    let base = config.login_base_url()?;
    let url = base.join(&format!("services/Soap/u/{}", config.api_version))?;

    let envelope = build_login_envelope(&config.username, &config.password_with_token());
    let response = http
        .post(url)
        .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(envelope)
        .send()
        .await
        .map_err(|e| RemoteError::Login(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::Login(e.to_string()))?;

    let parsed = parse_login_response(&body).map_err(|e| RemoteError::Login(e.to_string()))?;
    if let Some(fault) = parsed.fault {
        return Err(RemoteError::Login(fault));
    }
    if !status.is_success() {
        return Err(RemoteError::Login(format!("HTTP {}", status.as_u16())));
    }

    let server_url = parsed
        .server_url
        .ok_or_else(|| RemoteError::Login("登录响应缺少 serverUrl".to_string()))?;
    let session_id = parsed
        .session_id
        .ok_or_else(|| RemoteError::Login("登录响应缺少 sessionId".to_string()))?;

    let session = SalesforceSession::from_server_url(&server_url, session_id)
        .map_err(|e| RemoteError::Login(e.to_string()))?;
    info!(instance = %session.instance_url, "已连接 Salesforce");
    Ok(session)
}
