//! CLI command implementations.

pub mod call;
pub mod probe;
pub mod resolve;
pub mod routes;
pub mod session;

use crate::error::{CliError, CliResult};
use colored::Colorize;
use routeway_client::{
    FileStorage, LogicalRoute, MemoryStorage, NamedEndpoint, Params, ResultEnvelope, RouteClient,
    RouteTable, TokenStorage, Verb,
};
use routeway_config::RouteFile;
use std::sync::Arc;

/// Loaded configuration plus output preferences.
pub struct Context {
    file: RouteFile,
    json: bool,
    quiet: bool,
}

impl Context {
    pub fn new(file: RouteFile, json: bool, quiet: bool) -> Self {
        Self { file, json, quiet }
    }

    pub fn json(&self) -> bool {
        self.json
    }

    /// Whether a login outlives this process.
    pub fn persists_session(&self) -> bool {
        self.file.settings.session_file.is_some()
    }

    pub fn table(&self) -> CliResult<RouteTable> {
        Ok(self.file.route_table()?)
    }

    /// Build a client and the list of endpoints to probe.
    pub async fn client(&self) -> CliResult<(RouteClient, Vec<NamedEndpoint>)> {
        let storage: Arc<dyn TokenStorage> = match self.file.settings.session_file {
            Some(ref path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };

        let (config, table, endpoints) = self.file.clone().into_parts()?;
        let client = RouteClient::new(config, table, storage).await?;
        Ok((client, endpoints))
    }

    pub fn info(&self, msg: &str) {
        if !self.quiet && !self.json {
            println!("  {} {}", "→".cyan(), msg);
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet && !self.json {
            println!("  {} {}", "✓".green().bold(), msg.green());
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.json {
            println!("  {} {}", "⚠".yellow().bold(), msg.yellow());
        }
    }

    /// Print an envelope and turn a failure into an error.
    pub fn finish(&self, envelope: &ResultEnvelope) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(envelope)?);
        } else {
            let status = envelope
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let endpoint = envelope.endpoint.as_deref().unwrap_or("-");

            if envelope.success {
                self.success(&format!("{} {}", status, endpoint));
                if let Some(ref data) = envelope.data
                    && !self.quiet
                {
                    println!("{}", serde_json::to_string_pretty(data)?);
                }
            } else {
                let connected = if envelope.connected {
                    "connected".dimmed()
                } else {
                    "not connected".red()
                };
                self.warn(&format!("{} {} ({})", status, endpoint, connected));
            }
        }

        if envelope.success {
            Ok(())
        } else {
            let error = envelope.error.as_deref().unwrap_or("unknown error");
            Err(CliError::Failed(match envelope.detail {
                Some(ref detail) => format!("{} ({})", error, detail),
                None => error.to_string(),
            }))
        }
    }
}

/// Parse a verb and a path pattern.
pub fn parse_route(verb: &str, path: &str) -> CliResult<LogicalRoute> {
    let verb: Verb = verb.parse()?;
    Ok(LogicalRoute::new(verb, path))
}

/// Parse repeated `name=value` arguments.
pub fn parse_params(raw: &[String]) -> CliResult<Params> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .ok_or_else(|| {
                    CliError::InvalidArgument(format!("expected NAME=VALUE, got `{}`", pair))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeway_client::ErrorKind;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["id=42".to_string(), "q=a=b".to_string()]).unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("q").map(String::as_str), Some("a=b"));

        assert!(parse_params(&["id".to_string()]).is_err());
        assert!(parse_params(&["=42".to_string()]).is_err());
    }

    #[test]
    fn test_finish_keeps_last_attempt_error() {
        let ctx = Context::new(RouteFile::default(), true, true);
        let envelope = ResultEnvelope::failure(ErrorKind::Http(404), "HTTP 404")
            .with_status(404)
            .exhausted();

        let err = ctx.finish(&envelope).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Request failed: no candidate endpoint succeeded (HTTP 404)"
        );
    }

    #[test]
    fn test_persists_session() {
        let mut file = RouteFile::default();
        assert!(!Context::new(file.clone(), false, false).persists_session());

        file.settings.session_file = Some("session.json".into());
        assert!(Context::new(file, false, false).persists_session());
    }

    #[test]
    fn test_parse_route() {
        let route = parse_route("get", "/agents/:id").unwrap();
        assert_eq!(route, LogicalRoute::get("/agents/:id"));
        assert!(matches!(
            parse_route("FETCH", "/agents"),
            Err(CliError::Route(_))
        ));
    }
}
