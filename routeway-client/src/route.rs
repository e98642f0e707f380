//! Route table: logical routes mapped to ordered endpoint candidates.

use crate::{Result, RouteError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verb of a logical route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Verb {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
        }
    }

    /// Only POST, PUT and PATCH send a request body.
    pub fn carries_body(&self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }

    /// Convert to an `http::Method`.
    pub fn to_method(&self) -> http::Method {
        match self {
            Verb::Get => http::Method::GET,
            Verb::Post => http::Method::POST,
            Verb::Put => http::Method::PUT,
            Verb::Patch => http::Method::PATCH,
            Verb::Delete => http::Method::DELETE,
            Verb::Head => http::Method::HEAD,
            Verb::Options => http::Method::OPTIONS,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            "HEAD" => Ok(Verb::Head),
            "OPTIONS" => Ok(Verb::Options),
            _ => Err(RouteError::InvalidVerb(s.to_string())),
        }
    }
}

/// A call-site route such as `GET /agents/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalRoute {
    method: Verb,
    path_pattern: String,
}

impl LogicalRoute {
    /// Create a logical route.
    pub fn new(method: Verb, path_pattern: impl Into<String>) -> Self {
        Self {
            method,
            path_pattern: path_pattern.into(),
        }
    }

    /// `GET` route.
    pub fn get(path_pattern: impl Into<String>) -> Self {
        Self::new(Verb::Get, path_pattern)
    }

    /// `POST` route.
    pub fn post(path_pattern: impl Into<String>) -> Self {
        Self::new(Verb::Post, path_pattern)
    }

    /// `PUT` route.
    pub fn put(path_pattern: impl Into<String>) -> Self {
        Self::new(Verb::Put, path_pattern)
    }

    /// `PATCH` route.
    pub fn patch(path_pattern: impl Into<String>) -> Self {
        Self::new(Verb::Patch, path_pattern)
    }

    /// `DELETE` route.
    pub fn delete(path_pattern: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path_pattern)
    }

    /// The route's verb.
    pub fn method(&self) -> Verb {
        self.method
    }

    /// The route's path pattern.
    pub fn path_pattern(&self) -> &str {
        &self.path_pattern
    }
}

impl fmt::Display for LogicalRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path_pattern)
    }
}

impl FromStr for LogicalRoute {
    type Err = RouteError;

    /// Parse the `"VERB /path"` form.
    fn from_str(s: &str) -> Result<Self> {
        let (verb, path) = s
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| RouteError::InvalidTemplate {
                template: s.to_string(),
                reason: "expected `VERB /path`".to_string(),
            })?;
        Ok(Self::new(verb.parse()?, path.trim()))
    }
}

/// Whether a not-found answer moves the chain to the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// A 404 or a markup not-found page advances to the next candidate.
    #[default]
    OnNotFound,
    /// A 404 is a genuine "resource not found" and is returned as is.
    Strict,
}

/// One piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split a template into literal text and `:name` placeholders.
///
/// A placeholder starts with `:` at the beginning of a path segment, so the
/// colons in `https://` or `host:8080` stay literal.
pub(crate) fn parse_template(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b':'
            && i > 0
            && bytes[i - 1] == b'/'
            && i + 1 < bytes.len()
            && is_name_start(bytes[i + 1])
        {
            if literal_start < i {
                segments.push(Segment::Literal(&template[literal_start..i]));
            }
            let mut end = i + 1;
            while end < bytes.len() && is_name_char(bytes[end]) {
                end += 1;
            }
            segments.push(Segment::Param(&template[i + 1..end]));
            i = end;
            literal_start = end;
            continue;
        }
        i += 1;
    }

    if literal_start < bytes.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }

    segments
}

/// A candidate physical endpoint: an absolute URL or a same-origin path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    /// Wrap a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the template is an absolute `http(s)` URL.
    pub fn is_absolute(&self) -> bool {
        is_absolute_url(&self.0)
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        parse_template(&self.0)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Check if the template contains any placeholder.
    pub fn has_placeholders(&self) -> bool {
        parse_template(&self.0)
            .iter()
            .any(|segment| matches!(segment, Segment::Param(_)))
    }

    fn validate(&self) -> Result<()> {
        if self.0.starts_with('/') {
            return Ok(());
        }
        if !self.is_absolute() {
            return Err(RouteError::InvalidTemplate {
                template: self.0.clone(),
                reason: "must be an absolute http(s) URL or start with `/`".to_string(),
            });
        }
        url::Url::parse(&self.0).map_err(|e| RouteError::InvalidTemplate {
            template: self.0.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EndpointTemplate {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

pub(crate) fn is_absolute_url(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A registered route and its candidates in fallback order.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    route: LogicalRoute,
    templates: Vec<EndpointTemplate>,
    policy: FallbackPolicy,
}

impl RouteEntry {
    /// The logical route.
    pub fn route(&self) -> &LogicalRoute {
        &self.route
    }

    /// Candidates in registration order.
    pub fn templates(&self) -> &[EndpointTemplate] {
        &self.templates
    }

    /// Fallback policy for this route.
    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }
}

/// A named endpoint for connectivity probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEndpoint {
    /// Display name.
    pub name: String,
    /// Absolute URL or same-origin path.
    pub url: String,
}

impl NamedEndpoint {
    /// Create a named endpoint.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Immutable mapping from logical routes to ordered endpoint candidates.
///
/// Built once with [`RouteTable::builder`] and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashMap<LogicalRoute, usize>,
}

impl RouteTable {
    /// Create a route table builder.
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Find the entry for a logical route.
    pub fn lookup(&self, route: &LogicalRoute) -> Option<&RouteEntry> {
        self.index.get(route).map(|&i| &self.entries[i])
    }

    /// Check if a logical route is registered.
    pub fn contains(&self, route: &LogicalRoute) -> bool {
        self.index.contains_key(route)
    }

    /// All entries in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct placeholder-free templates, in first-seen order.
    ///
    /// Each endpoint is named after the route that first registered it.
    pub fn endpoints(&self) -> Vec<NamedEndpoint> {
        let mut seen = std::collections::HashSet::new();
        let mut endpoints = Vec::new();

        for entry in &self.entries {
            for template in &entry.templates {
                if template.has_placeholders() || !seen.insert(template.as_str()) {
                    continue;
                }
                endpoints.push(NamedEndpoint::new(
                    entry.route.to_string(),
                    template.as_str(),
                ));
            }
        }

        endpoints
    }
}

/// Builder for [`RouteTable`].
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    entries: Vec<(LogicalRoute, Vec<EndpointTemplate>, FallbackPolicy)>,
}

impl RouteTableBuilder {
    /// Register a route with its candidates in fallback order.
    pub fn route<I, T>(self, method: Verb, path_pattern: impl Into<String>, templates: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EndpointTemplate>,
    {
        self.route_with_policy(method, path_pattern, templates, FallbackPolicy::default())
    }

    /// Register a route with an explicit fallback policy.
    pub fn route_with_policy<I, T>(
        mut self,
        method: Verb,
        path_pattern: impl Into<String>,
        templates: I,
        policy: FallbackPolicy,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EndpointTemplate>,
    {
        self.entries.push((
            LogicalRoute::new(method, path_pattern),
            templates.into_iter().map(Into::into).collect(),
            policy,
        ));
        self
    }

    /// Validate the registrations and build the table.
    pub fn build(self) -> Result<RouteTable> {
        let mut table = RouteTable::default();

        for (route, templates, policy) in self.entries {
            if !route.path_pattern.starts_with('/') {
                return Err(RouteError::InvalidTemplate {
                    template: route.path_pattern.clone(),
                    reason: "path pattern must start with `/`".to_string(),
                });
            }
            if table.index.contains_key(&route) {
                return Err(RouteError::DuplicateRoute(route.to_string()));
            }
            if templates.is_empty() {
                return Err(RouteError::EmptyTemplates(route.to_string()));
            }
            for template in &templates {
                template.validate()?;
            }

            table.index.insert(route.clone(), table.entries.len());
            table.entries.push(RouteEntry {
                route,
                templates,
                policy,
            });
        }

        Ok(table)
    }
}
