//! Network transport
//!
//! Services talk to the backends only through [`IssueTransport`], so tests
//! swap in an in-memory transport instead of intercepting HTTP.

use crate::config::Config;
use crate::issue::{Issue, NewIssue, StagedImage};
use crate::session::CurrentUser;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the OTP endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Reply of the OTP endpoints; verification may hand back a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OtpResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<CurrentUser>,
}

#[async_trait]
pub trait IssueTransport: Send + Sync {
    /// `GET /api/issues`
    async fn list_issues(&self) -> Result<Vec<Issue>>;

    /// `POST /api/issues`; the backend may or may not echo the record
    async fn create_issue(&self, issue: &NewIssue, token: Option<&str>) -> Result<Option<Issue>>;

    /// Host one image and return its URL
    async fn upload_image(&self, image: &StagedImage) -> Result<String>;

    /// `GET /api/issues/assigned-to-me`
    async fn assigned_to_me(&self, token: &str) -> Result<Vec<Issue>>;

    async fn verify_otp(&self, request: &OtpRequest) -> Result<OtpResponse>;

    async fn resend_otp(&self, request: &OtpRequest) -> Result<OtpResponse>;

    /// Relay a chat message through bup-api
    async fn chat(&self, message: &str) -> Result<String>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    api_base: String,
    chat_base: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Self {
        Self {
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            chat_base: config.chat_base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.api_base, path)
    }

    fn chat_url(&self, path: &str) -> String {
        format!("{}{}", self.chat_base, path)
    }
}

#[async_trait]
impl IssueTransport for HttpTransport {
    async fn list_issues(&self) -> Result<Vec<Issue>> {
        let response = self.http.get(self.api_url("/issues")).send().await?;
        let body = read_json(response, "Failed to load issues").await?;
        parse_issue_list(body)
    }

    async fn create_issue(&self, issue: &NewIssue, token: Option<&str>) -> Result<Option<Issue>> {
        let mut request = self.http.post(self.api_url("/issues")).json(issue);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = read_json(request.send().await?, "Failed to submit issue").await?;
        Ok(parse_created_issue(body))
    }

    async fn upload_image(&self, image: &StagedImage) -> Result<String> {
        let response = self
            .http
            .post(self.chat_url("/upload"))
            .header(CONTENT_TYPE, image.content_type.as_str())
            .body(image.bytes.clone())
            .send()
            .await?;
        let body = read_json(response, "Image upload failed").await?;
        body.get("url")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| Error::UnexpectedResponse("upload reply has no url".into()))
    }

    async fn assigned_to_me(&self, token: &str) -> Result<Vec<Issue>> {
        let response = self
            .http
            .get(self.api_url("/issues/assigned-to-me"))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        let body = read_json(response, "Failed to load schedule").await?;
        match body.get("issues") {
            Some(issues) => parse_issue_list(issues.clone()),
            None => Err(Error::UnexpectedResponse(
                "assigned issues reply has no issues field".into(),
            )),
        }
    }

    async fn verify_otp(&self, request: &OtpRequest) -> Result<OtpResponse> {
        let response = self
            .http
            .post(self.api_url("/users/verify-otp"))
            .json(request)
            .send()
            .await?;
        let body = read_json(response, "OTP verification failed").await?;
        parse_otp_response(body)
    }

    async fn resend_otp(&self, request: &OtpRequest) -> Result<OtpResponse> {
        let response = self
            .http
            .post(self.api_url("/users/resend-otp"))
            .json(request)
            .send()
            .await?;
        let body = read_json(response, "Failed to resend OTP").await?;
        parse_otp_response(body)
    }

    async fn chat(&self, message: &str) -> Result<String> {
        let response = self
            .http
            .post(self.chat_url("/chat"))
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;
        let body = read_json(response, "Failed to get a reply from the assistant").await?;
        body.get("reply")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| Error::UnexpectedResponse("chat reply has no reply field".into()))
    }
}

/// Read a JSON body, turning non-2xx into [`Error::Api`]
async fn read_json(response: reqwest::Response, fallback: &str) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: server_message(&text).unwrap_or_else(|| fallback.to_string()),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| Error::UnexpectedResponse(e.to_string()))
}

/// `message` (or `error`) from an error body, if any
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(String::from)
}

/// Anything but a JSON array is an error
///
/// Records that do not parse are skipped with a warning; the rest of the
/// collection still loads.
pub fn parse_issue_list(body: Value) -> Result<Vec<Issue>> {
    match body {
        Value::Array(records) => Ok(records
            .into_iter()
            .filter_map(|record| {
                let id = record
                    .get("_id")
                    .or_else(|| record.get("id"))
                    .and_then(Value::as_str)
                    .unwrap_or("?")
                    .to_string();
                match serde_json::from_value::<Issue>(record) {
                    Ok(issue) => Some(issue),
                    Err(e) => {
                        tracing::warn!(%id, "skipping unreadable issue record: {}", e);
                        None
                    }
                }
            })
            .collect()),
        other => Err(Error::UnexpectedResponse(format!(
            "expected a list of issues, got {}",
            json_kind(&other)
        ))),
    }
}

/// An empty body means no message; anything unreadable is an error
pub fn parse_otp_response(body: Value) -> Result<OtpResponse> {
    if body.is_null() {
        return Ok(OtpResponse::default());
    }
    serde_json::from_value(body)
        .map_err(|e| Error::UnexpectedResponse(format!("unreadable OTP reply: {}", e)))
}

fn parse_created_issue(body: Value) -> Option<Issue> {
    let record = body.get("issue").cloned().unwrap_or(body);
    serde_json::from_value(record).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Priority, Status};
    use serde_json::json;

    #[test]
    fn test_non_array_is_error() {
        let err = parse_issue_list(json!({"message": "ok"})).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(ref m) if m.contains("an object")));
        assert!(parse_issue_list(Value::Null).is_err());
    }

    #[test]
    fn test_array_parses() {
        let issues = parse_issue_list(json!([
            {"_id": "1", "category": "Plumbing", "status": "scheduled"},
            {"_id": "2", "category": "Electrical"}
        ]))
        .unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1].id, "2");
    }

    #[test]
    fn test_one_bad_record_does_not_sink_the_list() {
        let issues = parse_issue_list(json!([
            {"_id": "1", "category": "Plumbing", "status": "scheduled"},
            {"_id": "2", "category": "Electrical", "status": "assigned"},
            {"_id": "3", "category": "HVAC", "priority": "High", "status": "In Progress"}
        ]))
        .unwrap();

        let ids: Vec<&str> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(issues[1].priority, Priority::High);
        assert_eq!(issues[1].status, Status::InProgress);
    }

    #[test]
    fn test_otp_reply_parsing() {
        assert_eq!(parse_otp_response(Value::Null).unwrap(), OtpResponse::default());

        let ok = parse_otp_response(json!({
            "message": "verified",
            "token": "t",
            "user": {"_id": "u1", "name": "Nusrat", "email": "n@campus.edu", "role": "technician"}
        }))
        .unwrap();
        assert_eq!(ok.token.as_deref(), Some("t"));
        assert_eq!(ok.user.map(|u| u.id).as_deref(), Some("u1"));

        let err = parse_otp_response(json!({"token": "t", "user": {"name": "no id"}})).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(ref m) if m.contains("OTP")));
    }

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(r#"{"message": "Room is required"}"#).as_deref(),
            Some("Room is required")
        );
        assert_eq!(
            server_message(r#"{"error": "Invalid OTP"}"#).as_deref(),
            Some("Invalid OTP")
        );
        assert_eq!(server_message("<html>502</html>"), None);
        assert_eq!(server_message(r#"{"message": ""}"#), None);
    }

    #[test]
    fn test_created_issue_wrapped_or_bare() {
        let bare = parse_created_issue(json!({"_id": "9", "category": "HVAC"}));
        assert_eq!(bare.map(|i| i.id).as_deref(), Some("9"));

        let wrapped = parse_created_issue(json!({"message": "created", "issue": {"_id": "7", "category": "HVAC"}}));
        assert_eq!(wrapped.map(|i| i.id).as_deref(), Some("7"));

        assert!(parse_created_issue(json!({"message": "created"})).is_none());
    }

    #[test]
    fn test_urls() {
        let config = Config {
            api_base_url: "http://localhost:3000/".into(),
            ..Config::default()
        };
        let transport = HttpTransport::new(&config);
        assert_eq!(
            transport.api_url("/issues/assigned-to-me"),
            "http://localhost:3000/api/issues/assigned-to-me"
        );
        assert_eq!(transport.chat_url("/chat"), "http://localhost:5000/chat");
    }
}
