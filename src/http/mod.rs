//! Request/response model the gate is invoked through.
//!
//! The host web framework owns routing. It builds an [`HttpRequest`], asks the
//! gate for a decision, and applies cookie writes or denials to its response.

mod cookie;
mod headers;
mod request;
mod response;

pub use cookie::{
    parse_cookie_header, AccessCookie, CookieAction, CookieSink, ACCESS_COOKIE_NAME,
    DEFAULT_COOKIE_MAX_AGE,
};
pub use headers::{CgiEnvironment, HeaderChain, HeaderMap, HeaderSource};
pub use request::{HttpRequest, RequestKind, UploadedFile};
pub use response::{Denial, ErrorData, ErrorResponse, HttpResponse};
