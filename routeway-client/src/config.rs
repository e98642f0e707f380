//! Route client configuration.

use crate::route::is_absolute_url;
use crate::{LogicalRoute, Result, RouteError};
use std::time::Duration;
use url::Url;

/// Default persisted key holding the bearer token.
pub const DEFAULT_SESSION_KEY: &str = "auth_token";

/// Route client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin that same-origin templates (`/path`) are joined to.
    pub base_url: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Delay between two connectivity probes.
    pub probe_delay: Duration,
    /// Route dispatched by `login`.
    pub login_route: LogicalRoute,
    /// Persisted key holding the bearer token.
    pub session_key: String,
    /// Default headers for all requests.
    pub default_headers: Vec<(String, String)>,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip compression.
    pub gzip: bool,
    /// Enable brotli compression.
    pub brotli: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            probe_delay: Duration::from_millis(300),
            login_route: LogicalRoute::post("/auth/login"),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            default_headers: Vec::new(),
            user_agent: format!("routeway-client/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Turn a materialized URL into an absolute request target.
    ///
    /// Absolute URLs are used as is; same-origin paths are joined to
    /// `base_url` and rejected when no base is configured.
    pub fn absolute_url(&self, url: &str) -> Result<Url> {
        if is_absolute_url(url) {
            return Ok(Url::parse(url)?);
        }

        let base = self.base_url.as_deref().ok_or_else(|| {
            RouteError::InvalidUrl(format!("`{}` is a same-origin path but no base URL is set", url))
        })?;
        let base = Url::parse(base).map_err(|e| RouteError::InvalidUrl(format!("{}: {}", base, e)))?;
        Ok(base.join(url)?)
    }

    /// Build the underlying HTTP client.
    pub(crate) fn build_http(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent);

        if self.gzip {
            builder = builder.gzip(true);
        }
        if self.brotli {
            builder = builder.brotli(true);
        }

        Ok(builder.build()?)
    }
}

/// Builder for route client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the origin for same-origin templates.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the delay between connectivity probes.
    pub fn probe_delay(mut self, delay: Duration) -> Self {
        self.config.probe_delay = delay;
        self
    }

    /// Set the route used by `login`.
    pub fn login_route(mut self, route: LogicalRoute) -> Self {
        self.config.login_route = route;
        self
    }

    /// Set the persisted session key.
    pub fn session_key(mut self, key: impl Into<String>) -> Self {
        self.config.session_key = key.into();
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable gzip compression.
    pub fn gzip(mut self, enable: bool) -> Self {
        self.config.gzip = enable;
        self
    }

    /// Enable or disable brotli compression.
    pub fn brotli(mut self, enable: bool) -> Self {
        self.config.brotli = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
