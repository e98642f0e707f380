//! Route client error types.

use crate::envelope::ErrorKind;
use thiserror::Error;

/// Result type for route client operations.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors raised outside the normal request/response path.
///
/// These are programming or configuration errors (an unregistered route, a
/// template that cannot be materialized, a broken route table). Failures that
/// happen on the wire never use this type; they are reported as
/// [`ResultEnvelope`](crate::ResultEnvelope) values.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The logical route was never registered.
    #[error("No route registered for {0}")]
    NoRoute(String),

    /// A `:name` placeholder has no supplied value.
    #[error("Missing value for path parameter `{name}` in `{template}`")]
    MissingParameter {
        /// Placeholder name without the leading colon.
        name: String,
        /// Template that contained the placeholder.
        template: String,
    },

    /// A path parameter value would leave its segment once the URL is
    /// normalized (`.` and `..`).
    #[error("Invalid value {value:?} for path parameter `{name}`: dot segments are not allowed")]
    InvalidParameter {
        /// Placeholder name without the leading colon.
        name: String,
        /// Rejected value.
        value: String,
    },

    /// Two registrations share the same method and path pattern.
    #[error("Route {0} is registered more than once")]
    DuplicateRoute(String),

    /// A route was registered without candidate endpoints.
    #[error("Route {0} has no candidate endpoints")]
    EmptyTemplates(String),

    /// A path pattern or endpoint template is malformed.
    #[error("Invalid template `{template}`: {reason}")]
    InvalidTemplate {
        /// Offending template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Unknown HTTP verb.
    #[error("Invalid HTTP verb: {0}")]
    InvalidVerb(String),

    /// A materialized URL could not be turned into a request target.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The token storage backend failed.
    #[error("Session storage error: {0}")]
    Storage(String),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouteError {
    /// Map this error onto the envelope error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoRoute(_) => ErrorKind::NoRoute,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::DuplicateRoute(_)
            | Self::EmptyTemplates(_)
            | Self::InvalidTemplate { .. }
            | Self::InvalidVerb(_) => ErrorKind::InvalidRoute,
            Self::InvalidParameter { .. } | Self::InvalidUrl(_) | Self::UrlParse(_) => {
                ErrorKind::InvalidUrl
            }
            Self::Storage(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Storage,
            Self::Client(_) => ErrorKind::Transport,
        }
    }

    /// Check if this error comes from route configuration rather than a call.
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidRoute)
    }
}
