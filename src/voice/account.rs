//! REST Account Client
//!
//! Thin wrapper over the telephony REST API: authenticated requests under
//! `/Accounts/{sid}`, plus the dialer operations built on them.

use super::AccountError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default REST API root (includes the API version)
pub const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com/2008-08-01";

/// Methods the REST API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether parameters travel in the request body rather than the query
    fn sends_form(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(AccountError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Outcome of [`Account::hangup_all`]
#[derive(Debug, Default)]
pub struct HangupReport {
    /// SIDs that were redirected to the hangup document
    pub ended: Vec<String>,
    /// SIDs that could not be ended, with the reason
    pub failed: Vec<(String, AccountError)>,
}

impl HangupReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// REST account for placing and managing calls
#[derive(Debug, Clone)]
pub struct Account {
    sid: String,
    token: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl Account {
    /// Create an account client against the default API root
    pub fn new(sid: impl Into<String>, token: impl Into<String>) -> Result<Self, AccountError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            sid: sid.into(),
            token: token.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            http_client,
        })
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` under this account. GET/DELETE vars go in the query.
    pub fn resource_url(
        &self,
        path: &str,
        method: HttpMethod,
        vars: &[(&str, &str)],
    ) -> Result<String, AccountError> {
        if path.is_empty() {
            return Err(AccountError::InvalidPath(path.to_string()));
        }

        let mut uri = if path.starts_with('/') {
            format!("{}/Accounts/{}{}", self.base_url, self.sid, path)
        } else {
            format!("{}/Accounts/{}/{}", self.base_url, self.sid, path)
        };

        if !method.sends_form() && !vars.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(vars)
                .finish();
            match uri.find('?') {
                Some(_) => {
                    if !uri.ends_with('&') {
                        uri.push('&');
                    }
                }
                None => uri.push('?'),
            }
            uri.push_str(&query);
        }
        Ok(uri)
    }

    /// Issue an authenticated request and return the response body
    pub async fn request(
        &self,
        path: &str,
        method: HttpMethod,
        vars: &[(&str, &str)],
    ) -> Result<String, AccountError> {
        let uri = self.resource_url(path, method, vars)?;
        debug!(method = %method, uri = %uri, "REST request");

        let mut request = self
            .http_client
            .request(method.into(), &uri)
            .basic_auth(&self.sid, Some(&self.token));
        if method.sends_form() && !vars.is_empty() {
            request = request.form(vars);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(method = %method, uri = %uri, status = status.as_u16(), "REST request failed");
            return Err(AccountError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Start an outbound call from `caller` to `called`, driven by the
    /// call-control document at `url`
    pub async fn place_call(
        &self,
        caller: &str,
        called: &str,
        url: &str,
    ) -> Result<String, AccountError> {
        info!(called = %called, "Placing outbound call");
        self.request(
            "Calls",
            HttpMethod::Post,
            &[("Caller", caller), ("Called", called), ("Url", url)],
        )
        .await
    }

    /// SIDs of calls currently in progress
    pub async fn in_progress_call_sids(&self) -> Result<Vec<String>, AccountError> {
        let listing = self.request("Calls?Status=1", HttpMethod::Get, &[]).await?;
        Ok(extract_sids(&listing))
    }

    /// Redirect a live call to the document at `hangup_url`
    pub async fn end_call(&self, sid: &str, hangup_url: &str) -> Result<String, AccountError> {
        info!(sid = %sid, "Ending call");
        self.request(
            &format!("Calls/{}", sid),
            HttpMethod::Post,
            &[("CurrentUrl", hangup_url)],
        )
        .await
    }

    /// End every in-progress call. A call that cannot be ended is recorded
    /// in the report and the remaining calls are still attempted; only a
    /// failure to list the calls is an error.
    pub async fn hangup_all(&self, hangup_url: &str) -> Result<HangupReport, AccountError> {
        let mut report = HangupReport::default();
        for sid in self.in_progress_call_sids().await? {
            match self.end_call(&sid, hangup_url).await {
                Ok(_) => report.ended.push(sid),
                Err(e) => {
                    warn!(sid = %sid, error = %e, "Failed to end call");
                    report.failed.push((sid, e));
                }
            }
        }
        Ok(report)
    }
}

/// Text of every `<Sid>` element in an XML listing
pub fn extract_sids(xml: &str) -> Vec<String> {
    static SID: OnceLock<Regex> = OnceLock::new();
    let re = SID.get_or_init(|| Regex::new(r"<Sid>\s*([^<]*?)\s*</Sid>").expect("valid regex"));
    re.captures_iter(xml)
        .map(|c| c[1].to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
