//! HTTP API transport
//!
//! Builds the request headers every API call carries, sends the request and
//! maps the response status onto [`ErrorKind`].

use super::credential::ResolvedCredential;
use crate::error::{ErrorKind, TransportError};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde_json::Value;

/// API version this client speaks
pub const API_VERSION: &str = "8";

pub const DEFAULT_API_URL: &str = "https://api.goabstract.com";
pub const DEFAULT_PREVIEWS_URL: &str = "https://previews.goabstract.com";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Upper bound on the buffer reserved up front for a download
const MAX_PREALLOCATE: usize = 8 << 20;

/// Download progress callback: bytes received so far, advertised total
pub type Progress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Sanitize response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Fresh trace correlation id, one per request
fn trace_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("Root=1-{:08x}-{}", Utc::now().timestamp(), &random[..24])
}

/// One API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Per-request header overrides; `None` drops the header entirely
    pub headers: Vec<(String, Option<String>)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn header(mut self, name: &str, value: Option<&str>) -> Self {
        self.headers.push((name.to_string(), value.map(str::to_string)));
        self
    }

    /// Path with the encoded query string appended
    fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        if self.path.contains('?') {
            format!("{}&{}", self.path, query)
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}

/// HTTP transport bound to one resolved credential
#[derive(Debug, Clone)]
pub struct ApiTransport {
    client: Client,
    api_url: String,
    previews_url: String,
    credential: Option<ResolvedCredential>,
}

impl ApiTransport {
    pub fn new(
        client: Client,
        api_url: &str,
        previews_url: &str,
        credential: Option<ResolvedCredential>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            previews_url: previews_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// Build the shared HTTP client
    pub fn http_client() -> reqwest::Result<Client> {
        Client::builder().user_agent(user_agent()).build()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn previews_url(&self) -> &str {
        &self.previews_url
    }

    /// Headers every request carries, with overrides applied
    fn headers(&self, overrides: &[(String, Option<String>)]) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("User-Agent", header_value(&user_agent())?);
        headers.insert("X-Amzn-Trace-Id", header_value(&trace_id())?);
        headers.insert("Abstract-Api-Version", HeaderValue::from_static(API_VERSION));

        match &self.credential {
            Some(ResolvedCredential::Token(token)) => {
                headers.insert("Authorization", header_value(&format!("Bearer {}", token))?);
            },
            Some(ResolvedCredential::ShareId(share_id)) => {
                headers.insert("Abstract-Share-Id", header_value(share_id)?);
            },
            None => {},
        }

        for (name, value) in overrides {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::new(ErrorKind::Other, format!("invalid header name {}: {}", name, e))
            })?;
            match value {
                Some(value) => {
                    headers.insert(name, header_value(value)?);
                },
                None => {
                    headers.remove(name);
                },
            }
        }

        Ok(headers)
    }

    /// Send a request to the API and decode the JSON response
    ///
    /// A 2xx response with an empty body decodes to `Value::Null`.
    pub async fn request(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.api_url, request.path_and_query());
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(self.headers(&request.headers)?);

        if let Some(body) = &request.body {
            let encoded = serde_json::to_vec(body).map_err(TransportError::decode)?;
            builder = builder.body(encoded);
        }

        let response = builder.send().await.map_err(unreachable_error)?;
        let status = response.status();
        let reset_at = rate_limit_reset(response.headers());
        let body = response.text().await.map_err(unreachable_error)?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(status_error(status.as_u16(), &body, reset_at));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(TransportError::decode)
    }

    /// Download raw bytes from the previews service
    ///
    /// `progress` is called synchronously for every received chunk.
    pub async fn download(
        &self,
        path: &str,
        progress: Option<Progress<'_>>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.previews_url, path);
        tracing::debug!("GET {} (binary)", url);

        let mut headers = self.headers(&[])?;
        headers.insert("Accept", HeaderValue::from_static("*/*"));

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(unreachable_error)?;

        let status = response.status();
        if !status.is_success() {
            let reset_at = rate_limit_reset(response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Preview error: {} - {}", status, sanitize_for_log(&body));
            return Err(status_error(status.as_u16(), &body, reset_at));
        }

        read_chunks(response, progress).await
    }
}

async fn read_chunks(
    mut response: Response,
    progress: Option<Progress<'_>>,
) -> Result<Vec<u8>, TransportError> {
    let total = response.content_length();
    // Content-Length is advertised by the server; never trust it for allocation
    let capacity = total
        .and_then(|t| usize::try_from(t).ok())
        .map_or(0, |n| n.min(MAX_PREALLOCATE));
    let mut data = Vec::with_capacity(capacity);

    while let Some(chunk) = response.chunk().await.map_err(unreachable_error)? {
        data.extend_from_slice(&chunk);
        if let Some(progress) = progress {
            progress(data.len() as u64, total);
        }
    }

    Ok(data)
}

pub fn user_agent() -> String {
    format!("Abstract SDK {}", crate::VERSION)
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::new(ErrorKind::Other, format!("invalid header value: {}", e)))
}

fn unreachable_error(error: reqwest::Error) -> TransportError {
    TransportError::unavailable(format!("API could not be reached: {}", error))
}

/// Reset hint from `X-RateLimit-Reset` (epoch seconds) or `Retry-After` (seconds)
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    if let Some(epoch) = header("X-RateLimit-Reset") {
        return DateTime::from_timestamp(epoch, 0);
    }

    header("Retry-After").map(|secs| Utc::now() + chrono::Duration::seconds(secs))
}

/// Map a non-2xx response onto the error taxonomy
fn status_error(status: u16, body: &str, reset_at: Option<DateTime<Utc>>) -> TransportError {
    let kind = ErrorKind::from_status(status);
    let decoded: Option<Value> = serde_json::from_str(body).ok();

    let message = decoded
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("API request failed with status {}", status));

    let mut error = TransportError::new(kind, message).with_code(status.to_string());
    if kind == ErrorKind::RateLimited {
        error = error.with_reset_at(reset_at);
    }
    if let Some(decoded) = decoded {
        error = error.with_body(decoded);
    }
    error
}
