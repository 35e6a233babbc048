//! Incoming request model.
//!
//! The host framework translates its native request into an [`HttpRequest`].
//! Query parameters and form fields are expected to be URL-decoded already.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::cookie::parse_cookie_header;
use super::headers::{CgiEnvironment, HeaderChain, HeaderMap, HeaderSource};

/// How the host framework classified the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestKind {
    /// A page render for a visitor.
    #[default]
    Page,
    /// A REST API call.
    Rest,
    /// An AJAX call.
    Ajax,
}

/// A file part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    /// File name declared by the client.
    pub file_name: String,
}

/// Header API specific to the hosting server, consulted last.
#[derive(Clone)]
struct ServerHeaders(Arc<dyn HeaderSource + Send + Sync>);

impl fmt::Debug for ServerHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerHeaders(..)")
    }
}

/// A request as seen by the gate.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    kind: RequestKind,
    authenticated: bool,
    https: bool,
    env: CgiEnvironment,
    headers: HeaderMap,
    server_headers: Option<ServerHeaders>,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
    form: HashMap<String, String>,
    files: Vec<UploadedFile>,
    body: Vec<u8>,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the request as made by a logged-in user.
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn over_https(mut self) -> Self {
        self.https = true;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a CGI-style server variable (`HTTP_X_SIGNATURE`, `HTTPS`, ...).
    pub fn with_server_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value);
        self
    }

    /// Plug in the server's own header lookup, tried after the server
    /// variables and the header list.
    pub fn with_header_source(mut self, source: impl HeaderSource + Send + Sync + 'static) -> Self {
        self.server_headers = Some(ServerHeaders(Arc::new(source)));
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Add every cookie from a raw `Cookie:` header value.
    pub fn with_cookie_header(mut self, raw: &str) -> Self {
        for (name, value) in parse_cookie_header(raw) {
            self.cookies.entry(name).or_insert(value);
        }
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    pub fn with_file(mut self, field: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.files.push(UploadedFile {
            field: field.into(),
            file_name: file_name.into(),
        });
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// True when the request arrived over TLS, either flagged by the host or
    /// reported through the `HTTPS` server variable.
    pub fn is_https(&self) -> bool {
        self.https
            || self
                .env
                .var("HTTPS")
                .map(|v| !v.is_empty() && !v.eq_ignore_ascii_case("off"))
                .unwrap_or(false)
    }

    /// The `Host` header, if sent.
    pub fn host(&self) -> Option<String> {
        self.header("Host")
    }

    pub fn content_type(&self) -> Option<String> {
        self.header("Content-Type")
    }

    /// Header lookup through the server variables, the header list, then
    /// the server header API if one was plugged in.
    pub fn header(&self, name: &str) -> Option<String> {
        let mut chain = HeaderChain::new().with(&self.env).with(&self.headers);
        if let Some(ServerHeaders(source)) = &self.server_headers {
            chain = chain.with(&**source);
        }
        chain.get(name)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    pub fn form_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.form.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Declared file name of the upload sent under `field`.
    pub fn uploaded_file_name(&self, field: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.file_name.as_str())
    }

    /// Raw request body as received on the wire.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl HeaderSource for HttpRequest {
    fn get(&self, name: &str) -> Option<String> {
        self.header(name)
    }
}
