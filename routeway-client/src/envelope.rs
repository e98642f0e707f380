//! Normalized result envelope.

use crate::RouteError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Error returned in the envelope when every fallback candidate failed.
pub const EXHAUSTED_MESSAGE: &str = "no candidate endpoint succeeded";

/// Machine-readable failure classification.
///
/// Callers render [`ResultEnvelope::error`] to users and branch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Logical route is not registered.
    NoRoute,
    /// A path placeholder had no value.
    MissingParameter,
    /// The route table itself is malformed.
    InvalidRoute,
    /// A materialized URL is not usable (e.g. a same-origin path with no base URL).
    InvalidUrl,
    /// The server was never reached (DNS, refused connection, TLS).
    Transport,
    /// The request timed out.
    Timeout,
    /// The server answered with a non-2xx status.
    Http(u16),
    /// The server answered with a markup document instead of data.
    UnexpectedContent,
    /// The server answered 2xx but declined the request (`"success": false`,
    /// or a login response without a token).
    Rejected,
    /// Every fallback candidate failed with a not-found-class error.
    Exhausted,
    /// The session token could not be persisted.
    Storage,
}

impl ErrorKind {
    /// Check if this failure means "the route does not live at this endpoint".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http(404) | Self::UnexpectedContent)
    }

    /// Check if this failure never reached a server.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }

    /// Check if the fallback chain may try the next candidate after this failure.
    pub fn advances_fallback(&self) -> bool {
        self.is_not_found() || self.is_transport()
    }

    /// HTTP status carried by the kind, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(status) => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoute => write!(f, "no_route"),
            Self::MissingParameter => write!(f, "missing_parameter"),
            Self::InvalidRoute => write!(f, "invalid_route"),
            Self::InvalidUrl => write!(f, "invalid_url"),
            Self::Transport => write!(f, "transport"),
            Self::Timeout => write!(f, "timeout"),
            Self::Http(status) => write!(f, "http_{}", status),
            Self::UnexpectedContent => write!(f, "unexpected_content"),
            Self::Rejected => write!(f, "rejected"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Outcome of a logical call.
///
/// `status` is present whenever an HTTP response was received, including
/// failures. `connected` is `false` only when no server was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    /// Whether the call succeeded.
    pub success: bool,
    /// HTTP status of the response that produced this envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Response payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether a server was reached.
    pub connected: bool,
    /// Failure classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// `data` holds plain text that could not be parsed as JSON.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub raw: bool,
    /// URL that produced this envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Error of the last attempt when every candidate failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResultEnvelope {
    /// Successful envelope with an optional JSON payload.
    pub fn success(data: Option<Value>) -> Self {
        Self {
            success: true,
            status: None,
            data,
            error: None,
            connected: true,
            kind: None,
            raw: false,
            endpoint: None,
            detail: None,
        }
    }

    /// Degraded success: the body was not JSON, so it is returned as text.
    pub fn raw_text(text: impl Into<String>) -> Self {
        Self {
            raw: true,
            ..Self::success(Some(Value::String(text.into())))
        }
    }

    /// Failed envelope where a server did answer.
    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: kind.status(),
            data: None,
            error: Some(error.into()),
            connected: !kind.is_transport(),
            kind: Some(kind),
            raw: false,
            endpoint: None,
            detail: None,
        }
    }

    /// Failed envelope for a request that never reached a server.
    pub fn disconnected(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            connected: false,
            ..Self::failure(kind, error)
        }
    }

    /// Set the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Record the URL that produced this envelope.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Check if the failure is a not-found-class failure.
    pub fn is_not_found(&self) -> bool {
        !self.success && self.kind.is_some_and(|k| k.is_not_found())
    }

    /// Check if the fallback chain may move on to the next candidate.
    pub fn advances_fallback(&self) -> bool {
        !self.success && self.kind.is_some_and(|k| k.advances_fallback())
    }

    /// Turn the last failed attempt into the chain-exhausted envelope.
    ///
    /// `error` is exactly [`EXHAUSTED_MESSAGE`]; the last attempt's error
    /// moves to `detail`. Status, connectivity and endpoint are kept.
    pub fn exhausted(mut self) -> Self {
        self.detail = self.error.take().filter(|detail| !detail.is_empty());
        self.success = false;
        self.data = None;
        self.raw = false;
        self.kind = Some(ErrorKind::Exhausted);
        self.error = Some(EXHAUSTED_MESSAGE.to_string());
        self
    }

    /// Look up a field of the JSON payload.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(name))
    }
}

impl From<RouteError> for ResultEnvelope {
    fn from(err: RouteError) -> Self {
        Self::disconnected(err.kind(), err.to_string())
    }
}

impl From<&RouteError> for ResultEnvelope {
    fn from(err: &RouteError) -> Self {
        Self::disconnected(err.kind(), err.to_string())
    }
}
