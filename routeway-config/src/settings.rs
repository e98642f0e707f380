// Route file and client settings

use crate::{ConfigError, Result};
use routeway_client::{
    ClientConfig, DEFAULT_SESSION_KEY, FallbackPolicy, LogicalRoute, NamedEndpoint, RouteTable,
    Verb,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Client settings as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub probe_delay_ms: u64,
    pub session_key: String,
    /// Where the session token is persisted. Unset means in-memory only.
    pub session_file: Option<PathBuf>,
    /// `"VERB /path"` of the route dispatched by login.
    pub login_route: String,
    pub user_agent: Option<String>,
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 15,
            connect_timeout_secs: 10,
            probe_delay_ms: 300,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            session_file: None,
            login_route: "POST /auth/login".to_string(),
            user_agent: None,
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientSettings {
    /// Apply flat `key = value` overrides, as produced by [`EnvLoader::load`]
    /// or a `.env` file. Keys are lowercase without prefix; unknown keys are
    /// ignored.
    ///
    /// [`EnvLoader::load`]: crate::EnvLoader::load
    pub fn apply_vars(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "base_url" => self.base_url = Some(value.clone()),
                "timeout_secs" => self.timeout_secs = parse_number(key, value)?,
                "connect_timeout_secs" => self.connect_timeout_secs = parse_number(key, value)?,
                "probe_delay_ms" => self.probe_delay_ms = parse_number(key, value)?,
                "session_key" => self.session_key = value.clone(),
                "session_file" => self.session_file = Some(PathBuf::from(value)),
                "login_route" => self.login_route = value.clone(),
                "user_agent" => self.user_agent = Some(value.clone()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Convert into a client configuration.
    pub fn to_client_config(&self) -> Result<ClientConfig> {
        if self.session_key.is_empty() {
            return Err(ConfigError::invalid("session_key", "", "must not be empty"));
        }

        let login_route: LogicalRoute = self.login_route.parse()?;

        let mut builder = ClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .probe_delay(Duration::from_millis(self.probe_delay_ms))
            .session_key(&self.session_key)
            .login_route(login_route);

        if let Some(ref base_url) = self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        for (name, value) in &self.default_headers {
            builder = builder.default_header(name, value);
        }

        Ok(builder.build())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, value, e))
}

/// One `[[routes]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// HTTP verb, case-insensitive.
    pub method: String,
    /// Logical path pattern, e.g. `/agents/:id`.
    pub path: String,
    /// Candidate endpoints in fallback order.
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub policy: FallbackPolicy,
}

/// A complete route configuration file.
///
/// ```toml
/// [settings]
/// base_url = "https://app.example.com"
///
/// [[routes]]
/// method = "GET"
/// path = "/financial/summary"
/// endpoints = ["/financial/summary", "/finance", "/revenue"]
///
/// [[probe]]
/// name = "health"
/// url = "https://fn.example.com/simpleHealth"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteFile {
    #[serde(default)]
    pub settings: ClientSettings,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// Explicit probe list. When empty, the table's placeholder-free
    /// endpoints are probed.
    #[serde(default)]
    pub probe: Vec<NamedEndpoint>,
}

impl RouteFile {
    /// Build the route table.
    pub fn route_table(&self) -> Result<RouteTable> {
        let mut builder = RouteTable::builder();
        for route in &self.routes {
            let method: Verb = route.method.parse()?;
            builder = builder.route_with_policy(
                method,
                route.path.as_str(),
                route.endpoints.iter().map(String::as_str),
                route.policy,
            );
        }
        Ok(builder.build()?)
    }

    /// Split into the pieces a route client is built from.
    pub fn into_parts(self) -> Result<(ClientConfig, RouteTable, Vec<NamedEndpoint>)> {
        let config = self.settings.to_client_config()?;
        let table = self.route_table()?;
        let probe = if self.probe.is_empty() {
            table.endpoints()
        } else {
            self.probe
        };
        Ok((config, table, probe))
    }
}
