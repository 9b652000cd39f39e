//! URL routes a plugin registers with the host dispatcher.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Whether the host must enforce its login/session checks before dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Reachable without a host session (external redirects land here).
    Public,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    /// Path relative to the plugin's base path, with a trailing slash.
    pub path: &'static str,
    pub name: &'static str,
    pub access: RouteAccess,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequest {
    pub path: String,
    pub query: HashMap<String, String>,
}

impl RouteRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: HashMap::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Parses a raw `a=1&b=2` query string, percent-decoding keys and values.
    pub fn with_query_string(mut self, raw: &str) -> Self {
        self.query.extend(
            url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()).into_owned(),
        );
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Path with surrounding slashes removed, for matching against [`Route::path`].
    pub fn normalized_path(&self) -> &str {
        self.path.trim_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResponse {
    Redirect { location: String },
}
