//! REST API seams for the portal's chat endpoints.
//!
//! DESIGN
//! ======
//! [`MessagesApi`] and [`ChatForms`] are the async traits the engine and
//! composer depend on, so tests substitute in-memory fakes. [`HttpChatApi`]
//! is the `reqwest` implementation; endpoint formatting and body parsing
//! are pure helpers for testability.
//!
//! ERROR HANDLING
//! ==============
//! Any non-success status becomes [`SyncError::Status`] without reading the
//! body as JSON. A form response with `success: false` becomes
//! [`SyncError::Rejected`] carrying the server's error text.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};

use super::types::{MessagesPage, NewerPage, NewerQuery, OlderPage, OlderQuery, PollDraft, SubmitResponse, VoteTally};
use crate::config::SyncConfig;
use crate::error::SyncError;

const MESSAGES_PATH: &str = "/chat/api/messages/";
const SEND_MESSAGE_PATH: &str = "/chat/send/";
const CREATE_POLL_PATH: &str = "/chat/poll/create/";
const CSRF_HEADER: &str = "x-csrftoken";
const AJAX_HEADER: &str = "x-requested-with";

// =============================================================================
// TRAITS
// =============================================================================

/// Paged access to chat items. Enables mocking in tests.
#[async_trait::async_trait]
pub trait MessagesApi: Send + Sync {
    /// Items strictly newer than `query.after`, oldest first.
    async fn fetch_newer(&self, query: NewerQuery) -> Result<NewerPage, SyncError>;

    /// One page of items older than `query.before`, newest first.
    async fn fetch_older(&self, query: OlderQuery) -> Result<OlderPage, SyncError>;
}

/// Form-submission endpoints used by the composer.
#[async_trait::async_trait]
pub trait ChatForms: Send + Sync {
    async fn send_message(&self, content: &str) -> Result<SubmitResponse, SyncError>;

    async fn create_poll(&self, draft: &PollDraft) -> Result<SubmitResponse, SyncError>;

    /// Toggle the viewer's vote on `option_id`.
    async fn vote(&self, poll_id: i64, option_id: i64) -> Result<VoteTally, SyncError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Session credentials issued by the portal's login flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
}

pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    /// Build a client for `config.base_url` carrying the session cookie and CSRF header.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &SyncConfig, session: &Session) -> Result<Self, SyncError> {
        let headers = default_headers(session)?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| SyncError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    async fn get_messages(&self, query: &[(&'static str, String)]) -> Result<MessagesPage, SyncError> {
        let url = messages_endpoint(&self.base_url);
        let text = read_success_body(self.http.get(url).query(query)).await?;
        parse_messages_page(&text)
    }
}

#[async_trait::async_trait]
impl MessagesApi for HttpChatApi {
    async fn fetch_newer(&self, query: NewerQuery) -> Result<NewerPage, SyncError> {
        let page = self.get_messages(&query.query_pairs()).await?;
        Ok(page.into_newer())
    }

    async fn fetch_older(&self, query: OlderQuery) -> Result<OlderPage, SyncError> {
        let page = self.get_messages(&query.query_pairs()).await?;
        Ok(page.into_older())
    }
}

#[async_trait::async_trait]
impl ChatForms for HttpChatApi {
    async fn send_message(&self, content: &str) -> Result<SubmitResponse, SyncError> {
        let url = format!("{}{SEND_MESSAGE_PATH}", self.base_url);
        let text = read_success_body(self.http.post(url).form(&[("content", content)])).await?;
        parse_submit_response(&text)
    }

    async fn create_poll(&self, draft: &PollDraft) -> Result<SubmitResponse, SyncError> {
        let url = format!("{}{CREATE_POLL_PATH}", self.base_url);
        let text = read_success_body(self.http.post(url).form(&poll_form(draft))).await?;
        parse_submit_response(&text)
    }

    async fn vote(&self, poll_id: i64, option_id: i64) -> Result<VoteTally, SyncError> {
        let url = vote_endpoint(&self.base_url, poll_id, option_id);
        let text = read_success_body(self.http.post(url)).await?;
        serde_json::from_str(&text).map_err(|e| SyncError::Parse(e.to_string()))
    }
}

async fn read_success_body(request: reqwest::RequestBuilder) -> Result<String, SyncError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Status { status: status.as_u16() });
    }
    Ok(response.text().await?)
}

// =============================================================================
// PURE HELPERS
// =============================================================================

fn default_headers(session: &Session) -> Result<HeaderMap, SyncError> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(AJAX_HEADER), HeaderValue::from_static("XMLHttpRequest"));
    if let Some(cookie) = cookie_header(session) {
        headers.insert(COOKIE, header_value(&cookie)?);
    }
    if let Some(token) = &session.csrf_token {
        headers.insert(HeaderName::from_static(CSRF_HEADER), header_value(token)?);
    }
    Ok(headers)
}

fn header_value(raw: &str) -> Result<HeaderValue, SyncError> {
    HeaderValue::from_str(raw).map_err(|e| SyncError::Config(format!("invalid credential header: {e}")))
}

fn cookie_header(session: &Session) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(id) = &session.session_id {
        parts.push(format!("sessionid={id}"));
    }
    if let Some(token) = &session.csrf_token {
        parts.push(format!("csrftoken={token}"));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

fn messages_endpoint(base_url: &str) -> String {
    format!("{base_url}{MESSAGES_PATH}")
}

fn vote_endpoint(base_url: &str, poll_id: i64, option_id: i64) -> String {
    format!("{base_url}/chat/poll/{poll_id}/vote/{option_id}/")
}

/// Form fields for the poll endpoint: `question`, `multiple_choice`, `option1..option4`.
fn poll_form(draft: &PollDraft) -> Vec<(String, String)> {
    let mut fields = vec![("question".to_owned(), draft.question.clone())];
    if draft.multiple_choice {
        fields.push(("multiple_choice".to_owned(), "on".to_owned()));
    }
    for (index, option) in draft.options.iter().enumerate() {
        fields.push((format!("option{}", index + 1), option.clone()));
    }
    fields
}

fn parse_messages_page(text: &str) -> Result<MessagesPage, SyncError> {
    serde_json::from_str(text).map_err(|e| SyncError::Parse(e.to_string()))
}

fn parse_submit_response(text: &str) -> Result<SubmitResponse, SyncError> {
    let body: SubmitResponse = serde_json::from_str(text).map_err(|e| SyncError::Parse(e.to_string()))?;
    if !body.success {
        return Err(SyncError::Rejected(body.error.unwrap_or_else(|| "unknown error".to_owned())));
    }
    Ok(body)
}
