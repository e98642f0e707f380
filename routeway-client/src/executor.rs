//! Single-attempt request execution.

use crate::response::Response;
use crate::{ClientConfig, ErrorKind, ResolvedRequest, Result, ResultEnvelope, SessionStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Performs one attempt of a resolved request.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute the request and classify the outcome. Never fails; every
    /// outcome is an envelope.
    async fn execute(&self, request: &ResolvedRequest) -> ResultEnvelope;
}

/// HTTP executor backed by `reqwest`.
///
/// Attaches `Authorization: Bearer <token>` whenever the session holds a
/// token, and sends a JSON body only for POST, PUT and PATCH.
#[derive(Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    session: Arc<SessionStore>,
}

impl RequestExecutor {
    /// Create an executor.
    pub fn new(config: Arc<ClientConfig>, session: Arc<SessionStore>) -> Result<Self> {
        let http = config.build_http()?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get the client configuration.
    pub fn config(&self) -> &Arc<ClientConfig> {
        &self.config
    }

    fn build(&self, request: &ResolvedRequest) -> Result<reqwest::RequestBuilder> {
        let mut url = self.config.absolute_url(&request.url)?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }
        let mut builder = self.http.request(request.method.to_method(), url);

        for (name, value) in &self.config.default_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(token) = self.session.get() {
            builder = builder.bearer_auth(token);
        }

        match (&request.body, request.method.carries_body()) {
            (Some(body), true) => builder = builder.json(body),
            (Some(_), false) => {
                debug!(method = %request.method, url = %request.url, "Dropping body on bodiless method");
            }
            (None, _) => {}
        }

        Ok(builder)
    }
}

#[async_trait]
impl Executor for RequestExecutor {
    async fn execute(&self, request: &ResolvedRequest) -> ResultEnvelope {
        let builder = match self.build(request) {
            Ok(builder) => builder,
            Err(e) => return ResultEnvelope::from(e).with_endpoint(request.url.clone()),
        };

        debug!(method = %request.method, url = %request.url, "Sending request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(request, &e),
        };

        let status = response.status().as_u16();
        match Response::from_reqwest(response).await {
            Ok(response) => {
                let envelope = response.into_envelope();
                debug!(
                    method = %request.method,
                    url = %request.url,
                    status = ?envelope.status,
                    success = envelope.success,
                    "Received response"
                );
                envelope
            }
            // Headers arrived but the body did not.
            Err(e) => transport_failure(request, &e).with_status(status),
        }
    }
}

fn transport_failure(request: &ResolvedRequest, err: &reqwest::Error) -> ResultEnvelope {
    warn!(method = %request.method, url = %request.url, error = %err, "Request failed");
    ResultEnvelope::disconnected(transport_kind(err), describe(err))
        .with_endpoint(request.url.clone())
}

pub(crate) fn transport_kind(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_builder() {
        ErrorKind::InvalidUrl
    } else {
        ErrorKind::Transport
    }
}

/// Render a transport error with its full cause chain.
pub(crate) fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
