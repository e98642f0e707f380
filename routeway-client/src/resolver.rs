//! Logical route resolution.
//!
//! Resolution is pure: it looks up the candidates for a route and
//! substitutes path parameters, without touching the network.

use crate::route::{Segment, parse_template};
use crate::{LogicalRoute, Result, RouteEntry, RouteError, RouteTable, Verb};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Caller-supplied path parameters.
pub type Params = HashMap<String, String>;

/// Characters escaped in a substituted path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A concrete request ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// Materialized URL (absolute, or a same-origin path).
    pub url: String,
    /// HTTP verb.
    pub method: Verb,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// JSON body, if the caller supplied one.
    pub body: Option<Value>,
    /// Query parameters appended to the URL at send time.
    pub query: BTreeMap<String, String>,
}

impl ResolvedRequest {
    /// Create a request with the default `Accept` header.
    pub fn new(method: Verb, url: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            url: url.into(),
            method,
            headers,
            body: None,
            query: BTreeMap::new(),
        }
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Add query parameters.
    pub fn with_query(mut self, query: &Params) -> Self {
        self.query
            .extend(query.iter().map(|(name, value)| (name.clone(), value.clone())));
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Substitute every `:name` placeholder in `template` with `params[name]`.
///
/// Values are percent-encoded as a single path segment. A placeholder with no
/// value fails the whole substitution; unused parameters are ignored.
///
/// `.` and `..` are rejected: URL normalization removes them (including their
/// `%2E` spellings), which would send the request to a different path.
pub fn substitute(template: &str, params: &Params) -> Result<String> {
    let mut url = String::with_capacity(template.len());

    for segment in parse_template(template) {
        match segment {
            Segment::Literal(text) => url.push_str(text),
            Segment::Param(name) => {
                let value = params.get(name).ok_or_else(|| RouteError::MissingParameter {
                    name: name.to_string(),
                    template: template.to_string(),
                })?;
                if is_dot_segment(value) {
                    return Err(RouteError::InvalidParameter {
                        name: name.to_string(),
                        value: value.clone(),
                    });
                }
                url.extend(utf8_percent_encode(value, SEGMENT));
            }
        }
    }

    Ok(url)
}

fn is_dot_segment(value: &str) -> bool {
    matches!(value, "." | "..")
}

/// Turns logical routes into ordered concrete requests.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    table: Arc<RouteTable>,
}

impl RouteResolver {
    /// Create a resolver over a route table.
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    /// The route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve a route into its candidates, in fallback order.
    pub fn resolve(&self, route: &LogicalRoute, params: &Params) -> Result<Vec<ResolvedRequest>> {
        self.resolve_entry(route, params, None)
            .map(|(_, requests)| requests)
    }

    /// Resolve a route and attach a JSON body to every candidate.
    pub fn resolve_with_body(
        &self,
        route: &LogicalRoute,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Vec<ResolvedRequest>> {
        self.resolve_entry(route, params, body)
            .map(|(_, requests)| requests)
    }

    pub(crate) fn resolve_entry(
        &self,
        route: &LogicalRoute,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<(&RouteEntry, Vec<ResolvedRequest>)> {
        let entry = self
            .table
            .lookup(route)
            .ok_or_else(|| RouteError::NoRoute(route.to_string()))?;

        let requests = entry
            .templates()
            .iter()
            .map(|template| {
                let url = substitute(template.as_str(), params)?;
                Ok(ResolvedRequest::new(route.method(), url).with_body(body.cloned()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((entry, requests))
    }
}
