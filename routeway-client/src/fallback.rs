//! Ordered fallback across endpoint candidates.

use crate::resolver::Params;
use crate::{
    Executor, FallbackPolicy, LogicalRoute, RequestExecutor, ResultEnvelope, RouteResolver,
};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Runs the candidates of a logical route in registration order.
///
/// The chain stops at the first success. A failure moves on to the next
/// candidate only when it is not-found-class (HTTP 404 or a markup not-found
/// page) or when the server was never reached; any other failure is returned
/// as is. Routes registered with [`FallbackPolicy::Strict`] treat a 404 as
/// final.
pub struct FallbackChain<E = RequestExecutor> {
    resolver: RouteResolver,
    executor: E,
}

impl<E: Executor> FallbackChain<E> {
    /// Create a chain.
    pub fn new(resolver: RouteResolver, executor: E) -> Self {
        Self { resolver, executor }
    }

    /// The resolver.
    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// The executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Dispatch a logical call.
    pub async fn dispatch(
        &self,
        route: &LogicalRoute,
        params: &Params,
        body: Option<Value>,
    ) -> ResultEnvelope {
        self.dispatch_with_query(route, params, &Params::new(), body)
            .await
    }

    /// Dispatch a logical call with query parameters added to every
    /// candidate.
    pub async fn dispatch_with_query(
        &self,
        route: &LogicalRoute,
        params: &Params,
        query: &Params,
        body: Option<Value>,
    ) -> ResultEnvelope {
        let (entry, candidates) = match self.resolver.resolve_entry(route, params, body.as_ref()) {
            Ok((entry, requests)) => (
                entry,
                requests
                    .into_iter()
                    .map(|request| request.with_query(query))
                    .collect::<Vec<_>>(),
            ),
            Err(e) => {
                warn!(route = %route, error = %e, "Route resolution failed");
                return e.into();
            }
        };
        let policy = entry.policy();
        let total = candidates.len();
        let mut last = None;

        for (attempt, request) in candidates.iter().enumerate() {
            debug!(
                route = %route,
                attempt = attempt + 1,
                total,
                url = %request.url,
                "Trying candidate endpoint"
            );

            let envelope = self.executor.execute(request).await;
            if envelope.success {
                return envelope;
            }

            let advance = match policy {
                FallbackPolicy::OnNotFound => envelope.advances_fallback(),
                FallbackPolicy::Strict => !envelope.connected && envelope.advances_fallback(),
            };
            if !advance {
                debug!(
                    route = %route,
                    url = %request.url,
                    kind = ?envelope.kind,
                    "Candidate failed with a final error"
                );
                return envelope;
            }

            if attempt + 1 < total {
                info!(
                    route = %route,
                    url = %request.url,
                    kind = ?envelope.kind,
                    next = %candidates[attempt + 1].url,
                    "Candidate unavailable, falling back"
                );
            }
            last = Some(envelope);
        }

        warn!(route = %route, candidates = total, "No candidate endpoint succeeded");
        match last {
            Some(envelope) => envelope.exhausted(),
            None => ResultEnvelope::failure(crate::ErrorKind::Exhausted, crate::EXHAUSTED_MESSAGE),
        }
    }
}
