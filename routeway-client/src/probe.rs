//! Connectivity diagnostics.

use crate::executor::describe;
use crate::response::Response;
use crate::{ClientConfig, NamedEndpoint};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    /// Endpoint name.
    pub name: String,
    /// URL as configured.
    pub url: String,
    /// Whether the endpoint answered with a 2xx status.
    pub connected: bool,
    /// HTTP status, when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Per-endpoint results, in probe order.
    pub results: Vec<ProbeResult>,
    /// Number of connected endpoints.
    pub connected_count: usize,
    /// Whether every probed endpoint is connected.
    pub all_connected: bool,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl ProbeReport {
    fn new(results: Vec<ProbeResult>, cancelled: bool, started_at: DateTime<Utc>) -> Self {
        let connected_count = results.iter().filter(|r| r.connected).count();
        Self {
            all_connected: !cancelled && connected_count == results.len(),
            connected_count,
            results,
            cancelled,
            started_at,
        }
    }

    /// Results for endpoints that are not connected.
    pub fn failures(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| !r.connected)
    }
}

/// Fires unauthenticated GET requests at a list of endpoints, one at a time,
/// with a fixed delay between requests.
///
/// Each endpoint is tested on its own; a failure is recorded and the run
/// continues. The probe never reads or writes the session.
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    delay: Duration,
}

impl ConnectivityProbe {
    /// Create a probe using the configured delay.
    pub fn new(http: reqwest::Client, config: Arc<ClientConfig>) -> Self {
        let delay = config.probe_delay;
        Self {
            http,
            config,
            delay,
        }
    }

    /// Override the delay between requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay between requests.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Probe every endpoint in order.
    pub async fn probe(&self, endpoints: &[NamedEndpoint]) -> ProbeReport {
        self.probe_until_cancelled(endpoints, &CancellationToken::new())
            .await
    }

    /// Probe every endpoint in order, stopping between steps once `cancel`
    /// fires. Results gathered before cancellation are kept.
    pub async fn probe_until_cancelled(
        &self,
        endpoints: &[NamedEndpoint],
        cancel: &CancellationToken,
    ) -> ProbeReport {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(endpoints.len());
        let mut cancelled = false;

        info!(endpoints = endpoints.len(), delay_ms = self.delay.as_millis() as u64, "Probing endpoints");

        for (i, endpoint) in endpoints.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
            if cancel.is_cancelled() {
                cancelled = true;
                info!(completed = results.len(), "Probe cancelled");
                break;
            }

            results.push(self.check(endpoint).await);
        }

        let report = ProbeReport::new(results, cancelled, started_at);
        if !report.all_connected && !report.cancelled {
            warn!(
                connected = report.connected_count,
                total = report.results.len(),
                "Some endpoints are not connected"
            );
        }
        report
    }

    /// Probe a single endpoint with GET.
    pub async fn check(&self, endpoint: &NamedEndpoint) -> ProbeResult {
        self.send(endpoint, http::Method::GET).await
    }

    /// Send an `OPTIONS` request and warn if the endpoint does not answer
    /// with a success.
    pub async fn preflight(&self, endpoint: &NamedEndpoint) -> ProbeResult {
        let result = self.send(endpoint, http::Method::OPTIONS).await;
        if !result.connected {
            match result.status {
                Some(status) => warn!(
                    url = %endpoint.url,
                    status,
                    "Endpoint may not exist"
                ),
                None => warn!(
                    url = %endpoint.url,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Cannot reach endpoint"
                ),
            }
        }
        result
    }

    async fn send(&self, endpoint: &NamedEndpoint, method: http::Method) -> ProbeResult {
        let mut result = ProbeResult {
            name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            connected: false,
            status: None,
            error: None,
        };

        let url = match self.config.absolute_url(&endpoint.url) {
            Ok(url) => url,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        };

        match self.http.request(method.clone(), url).send().await {
            Ok(response) => {
                result.status = Some(response.status().as_u16());
                match Response::from_reqwest(response).await {
                    Ok(response) => {
                        result.connected = response.status().is_success();
                        if !result.connected {
                            result.error = Some(response.error_text());
                        }
                    }
                    Err(e) => {
                        result.error = Some(describe(&e));
                    }
                }
            }
            Err(e) => {
                result.error = Some(describe(&e));
            }
        }

        debug!(
            name = %result.name,
            method = %method,
            connected = result.connected,
            status = ?result.status,
            "Probed endpoint"
        );
        result
    }
}
