//! # Routeway Client
//!
//! Resolves logical routes ("get financial summary", "login") to concrete
//! HTTP endpoints and executes them with ordered fallback.
//!
//! ## Features
//!
//! - **Route table**: each `VERB /path/:param` maps to an ordered list of
//!   candidate endpoints, absolute or same-origin
//! - **Pure resolution**: placeholders are substituted without I/O, and a
//!   missing parameter is an error rather than a literal `:name` on the wire
//! - **Fallback chain**: candidates are tried in order; only not-found-class
//!   failures move on to the next one
//! - **Envelopes**: every outcome is a [`ResultEnvelope`] with a typed
//!   [`ErrorKind`]
//! - **Session**: a single bearer token persisted through a [`TokenStorage`]
//! - **Diagnostics**: sequential connectivity probing with a fixed delay
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use routeway_client::{ClientConfig, MemoryStorage, Params, RouteClient, RouteTable, Verb};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = RouteTable::builder()
//!         .route(Verb::Get, "/financial/summary", ["/financial/summary", "/finance", "/revenue"])
//!         .route(Verb::Get, "/agents/:id/performance", ["/api/agents/:id/performance"])
//!         .route(Verb::Post, "/auth/login", ["/auth/login"])
//!         .build()?;
//!
//!     let config = ClientConfig::builder()
//!         .base_url("https://app.example.com")
//!         .build();
//!
//!     let client = RouteClient::new(config, table, Arc::new(MemoryStorage::new())).await?;
//!
//!     let summary = client.get("/financial/summary", &Params::new()).await;
//!     if summary.success {
//!         println!("{:?}", summary.data);
//!     } else {
//!         eprintln!("{}", summary.error.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod envelope;
mod error;
mod executor;
mod fallback;
mod probe;
mod resolver;
mod response;
mod route;
mod session;

pub use client::RouteClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_SESSION_KEY};
pub use envelope::{EXHAUSTED_MESSAGE, ErrorKind, ResultEnvelope};
pub use error::{Result, RouteError};
pub use executor::{Executor, RequestExecutor};
pub use fallback::FallbackChain;
pub use probe::{ConnectivityProbe, ProbeReport, ProbeResult};
pub use resolver::{Params, ResolvedRequest, RouteResolver, substitute};
pub use response::{Response, is_json_media_type, looks_like_markup};
pub use route::{
    EndpointTemplate, FallbackPolicy, LogicalRoute, NamedEndpoint, RouteEntry, RouteTable,
    RouteTableBuilder, Verb,
};
pub use session::{FileStorage, MemoryStorage, SessionStore, TokenStorage};

// Re-export common types
pub use tokio_util::sync::CancellationToken;

/// Prelude for common imports.
///
/// ```
/// use routeway_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::RouteClient;
    pub use crate::config::{ClientConfig, ClientConfigBuilder};
    pub use crate::envelope::{ErrorKind, ResultEnvelope};
    pub use crate::error::{Result, RouteError};
    pub use crate::resolver::Params;
    pub use crate::route::{FallbackPolicy, LogicalRoute, NamedEndpoint, RouteTable, Verb};
    pub use crate::session::{FileStorage, MemoryStorage, TokenStorage};
}
