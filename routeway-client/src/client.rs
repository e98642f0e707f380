//! Route client facade.

use crate::resolver::Params;
use crate::{
    ClientConfig, ConnectivityProbe, ErrorKind, FallbackChain, LogicalRoute, NamedEndpoint,
    ProbeReport, ProbeResult, RequestExecutor, ResolvedRequest, Result, ResultEnvelope,
    RouteError, RouteResolver, RouteTable, SessionStore, TokenStorage,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Route client: one explicitly constructed instance per application.
///
/// Owns the route table, the fallback chain and the session. The session
/// token can only be changed through [`login`](Self::login) and
/// [`logout`](Self::logout).
#[derive(Clone)]
pub struct RouteClient {
    config: Arc<ClientConfig>,
    table: Arc<RouteTable>,
    session: Arc<SessionStore>,
    chain: Arc<FallbackChain>,
    probe: ConnectivityProbe,
}

impl RouteClient {
    /// Create a client. The persisted session token is read once here.
    pub async fn new(
        config: ClientConfig,
        table: RouteTable,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let table = Arc::new(table);
        let session = Arc::new(SessionStore::open(storage, config.session_key.clone()).await?);

        let executor = RequestExecutor::new(config.clone(), session.clone())?;
        let probe = ConnectivityProbe::new(executor.inner().clone(), config.clone());
        let chain = FallbackChain::new(RouteResolver::new(table.clone()), executor);

        if !table.contains(&config.login_route) {
            debug!(route = %config.login_route, "Login route is not registered");
        }

        Ok(Self {
            config,
            table,
            session,
            chain: Arc::new(chain),
            probe,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Check if a session token is held.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Resolve a route without performing any I/O.
    pub fn resolve(&self, route: &LogicalRoute, params: &Params) -> Result<Vec<ResolvedRequest>> {
        self.chain.resolver().resolve(route, params)
    }

    /// Dispatch a logical call through the fallback chain.
    pub async fn dispatch(
        &self,
        route: &LogicalRoute,
        params: &Params,
        body: Option<Value>,
    ) -> ResultEnvelope {
        self.chain.dispatch(route, params, body).await
    }

    /// Dispatch a logical call with query parameters.
    pub async fn dispatch_with_query(
        &self,
        route: &LogicalRoute,
        params: &Params,
        query: &Params,
        body: Option<Value>,
    ) -> ResultEnvelope {
        self.chain
            .dispatch_with_query(route, params, query, body)
            .await
    }

    /// Dispatch `GET <path_pattern>`.
    pub async fn get(&self, path_pattern: &str, params: &Params) -> ResultEnvelope {
        self.dispatch(&LogicalRoute::get(path_pattern), params, None)
            .await
    }

    /// Dispatch `POST <path_pattern>` with a JSON body.
    pub async fn post(&self, path_pattern: &str, params: &Params, body: Value) -> ResultEnvelope {
        self.dispatch(&LogicalRoute::post(path_pattern), params, Some(body))
            .await
    }

    /// Dispatch `PUT <path_pattern>` with a JSON body.
    pub async fn put(&self, path_pattern: &str, params: &Params, body: Value) -> ResultEnvelope {
        self.dispatch(&LogicalRoute::put(path_pattern), params, Some(body))
            .await
    }

    /// Dispatch `PATCH <path_pattern>` with a JSON body.
    pub async fn patch(&self, path_pattern: &str, params: &Params, body: Value) -> ResultEnvelope {
        self.dispatch(&LogicalRoute::patch(path_pattern), params, Some(body))
            .await
    }

    /// Dispatch `DELETE <path_pattern>`.
    pub async fn delete(&self, path_pattern: &str, params: &Params) -> ResultEnvelope {
        self.dispatch(&LogicalRoute::delete(path_pattern), params, None)
            .await
    }

    /// Log in through the configured login route.
    ///
    /// The session is updated only when the call succeeds and the response
    /// carries a non-empty `token`. A successful response without a token is
    /// reported as [`ErrorKind::Rejected`].
    pub async fn login(&self, credentials: Value) -> ResultEnvelope {
        let route = self.config.login_route.clone();
        info!(route = %route, "Attempting login");

        let envelope = self.dispatch(&route, &Params::new(), Some(credentials)).await;
        if !envelope.success {
            info!(route = %route, kind = ?envelope.kind, "Login failed");
            return envelope;
        }

        let Some(token) = issued_token(&envelope) else {
            warn!(route = %route, "Login response did not include a token");
            return ResultEnvelope {
                status: envelope.status,
                endpoint: envelope.endpoint,
                ..ResultEnvelope::failure(ErrorKind::Rejected, "login response did not include a token")
            };
        };

        if let Err(e) = self.session.set(token).await {
            warn!(error = %e, "Failed to persist session token");
            return ResultEnvelope {
                status: envelope.status,
                endpoint: envelope.endpoint,
                ..ResultEnvelope::failure(ErrorKind::Storage, e.to_string())
            };
        }

        info!(route = %route, "Login successful, token stored");
        envelope
    }

    /// Clear the session.
    pub async fn logout(&self) -> ResultEnvelope {
        match self.session.clear().await {
            Ok(()) => {
                info!("Logged out");
                ResultEnvelope::success(Some(json!({"message": "Logged out"})))
            }
            Err(e) => ResultEnvelope::failure(ErrorKind::Storage, e.to_string()),
        }
    }

    /// Probe every placeholder-free endpoint in the route table.
    pub async fn probe(&self) -> ProbeReport {
        self.probe.probe(&self.table.endpoints()).await
    }

    /// Probe an explicit endpoint list.
    pub async fn probe_endpoints(&self, endpoints: &[NamedEndpoint]) -> ProbeReport {
        self.probe.probe(endpoints).await
    }

    /// Probe an explicit endpoint list until `cancel` fires.
    pub async fn probe_until_cancelled(
        &self,
        endpoints: &[NamedEndpoint],
        cancel: &CancellationToken,
    ) -> ProbeReport {
        self.probe.probe_until_cancelled(endpoints, cancel).await
    }

    /// Send `OPTIONS` to the first candidate of a route.
    pub async fn preflight(&self, route: &LogicalRoute, params: &Params) -> Result<ProbeResult> {
        let first = self
            .resolve(route, params)?
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::EmptyTemplates(route.to_string()))?;
        Ok(self
            .probe
            .preflight(&NamedEndpoint::new(route.to_string(), first.url))
            .await)
    }

    /// The connectivity probe.
    pub fn prober(&self) -> &ConnectivityProbe {
        &self.probe
    }
}

impl std::fmt::Debug for RouteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteClient")
            .field("routes", &self.table.len())
            .field("session", &self.session)
            .finish()
    }
}

fn issued_token(envelope: &ResultEnvelope) -> Option<String> {
    let data = envelope.data.as_ref()?;
    data.get("token")
        .or_else(|| data.get("data").and_then(|d| d.get("token")))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
