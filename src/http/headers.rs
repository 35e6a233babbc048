//! Header lookup adapters.
//!
//! Hosts expose request headers in different shapes: CGI-style environment
//! variables (`HTTP_X_SIGNATURE`), a plain header list, or a server-specific
//! API. Each shape implements [`HeaderSource`]; [`HeaderChain`] tries several
//! in order.

use std::collections::HashMap;

/// Something that can answer "what is the value of header `name`".
pub trait HeaderSource {
    /// Look up a header. Implementations decide how names are matched.
    fn get(&self, name: &str) -> Option<String>;
}

/// Ordered list of headers with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header. Earlier entries win on lookup.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl HeaderSource for HeaderMap {
    fn get(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

/// CGI-style server variables (`HTTP_HOST`, `CONTENT_TYPE`, `HTTPS`, ...).
#[derive(Debug, Clone, Default)]
pub struct CgiEnvironment {
    vars: HashMap<String, String>,
}

impl CgiEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Raw variable lookup by exact key.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Map a header name to its CGI variable: `X-Signature` -> `HTTP_X_SIGNATURE`.
    pub fn variable_name(header: &str) -> String {
        format!("HTTP_{}", header.to_ascii_uppercase().replace('-', "_"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CgiEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl HeaderSource for CgiEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        // Content-Type and Content-Length are passed without the HTTP_ prefix.
        if name.eq_ignore_ascii_case("content-type") || name.eq_ignore_ascii_case("content-length") {
            let bare = name.to_ascii_uppercase().replace('-', "_");
            if let Some(v) = self.var(&bare) {
                return Some(v.to_string());
            }
        }
        self.var(&Self::variable_name(name)).map(str::to_string)
    }
}

/// Tries each source in order; the first non-empty value wins.
#[derive(Default)]
pub struct HeaderChain<'a> {
    sources: Vec<&'a dyn HeaderSource>,
}

impl<'a> HeaderChain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &'a dyn HeaderSource) -> Self {
        self.sources.push(source);
        self
    }
}

impl HeaderSource for HeaderChain<'_> {
    fn get(&self, name: &str) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|source| source.get(name))
            .find(|value| !value.is_empty())
    }
}
