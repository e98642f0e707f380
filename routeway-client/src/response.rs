//! HTTP response wrapper and classification.

use crate::{ErrorKind, ResultEnvelope};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// HTTP response wrapper.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: url::Url,
}

impl Response {
    /// Create a response from a reqwest response, buffering the body.
    ///
    /// Fails when the body cannot be read in full (connection dropped or
    /// timed out mid-body).
    pub(crate) async fn from_reqwest(
        response: reqwest::Response,
    ) -> std::result::Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            body,
            url,
        })
    }

    /// Create a response from parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>, url: url::Url) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            url,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the response URL.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Check if the declared content type is a JSON media type.
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(is_json_media_type)
    }

    /// Check if the body looks like a markup document.
    pub fn looks_like_markup(&self) -> bool {
        looks_like_markup(&self.body)
    }

    /// Text used as the error of a failing response.
    ///
    /// Prefers an `error` or `message` string in a JSON body, then the body
    /// text, then `HTTP <status>`.
    pub fn error_text(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<Value>(&self.body)
            && let Some(message) = json_error_message(&value)
        {
            return message;
        }

        let text = self.text();
        let text = text.trim();
        if text.is_empty() {
            format!("HTTP {}", self.status.as_u16())
        } else {
            text.to_string()
        }
    }

    /// Classify the response into a result envelope.
    ///
    /// A markup document served without a JSON content type is treated as a
    /// misrouted request rather than parsed, as long as the status is a
    /// success or a 404. Other failing statuses keep their HTTP status.
    pub fn into_envelope(self) -> ResultEnvelope {
        let status = self.status.as_u16();
        let endpoint = self.url.to_string();

        if !self.is_json() && self.looks_like_markup() {
            let envelope = if self.status.is_success() || self.status == StatusCode::NOT_FOUND {
                ResultEnvelope::failure(
                    ErrorKind::UnexpectedContent,
                    format!(
                        "Endpoint returned a markup document instead of data (likely a not-found page): {}",
                        endpoint
                    ),
                )
            } else {
                ResultEnvelope::failure(ErrorKind::Http(status), format!("HTTP {}", status))
            };
            return envelope.with_status(status).with_endpoint(endpoint);
        }

        if !self.status.is_success() {
            return ResultEnvelope::failure(ErrorKind::Http(status), self.error_text())
                .with_status(status)
                .with_endpoint(endpoint);
        }

        let envelope = if self.body.iter().all(u8::is_ascii_whitespace) {
            ResultEnvelope::success(None)
        } else {
            match serde_json::from_slice::<Value>(&self.body) {
                Ok(value) if value.get("success") == Some(&Value::Bool(false)) => {
                    let message = json_error_message(&value)
                        .unwrap_or_else(|| "request was declined".to_string());
                    ResultEnvelope::failure(ErrorKind::Rejected, message)
                }
                Ok(value) => ResultEnvelope::success(Some(value)),
                Err(_) => ResultEnvelope::raw_text(self.text()),
            }
        };

        envelope.with_status(status).with_endpoint(endpoint)
    }
}

/// Check if a `Content-Type` value names a JSON media type.
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Check if a payload starts with a document type or root markup tag.
pub fn looks_like_markup(body: &[u8]) -> bool {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let head = &body[start..body.len().min(start + 9)];
    let head = head.to_ascii_lowercase();

    head.starts_with(b"<!doctype") || head.starts_with(b"<html")
}

fn json_error_message(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|field| value.get(field).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
