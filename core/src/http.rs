//! Requests and responses as plain values.
//!
//! # Design
//! `TimetonicClient` builds `HttpRequest` values and parses `HttpResponse`
//! values; whoever executes the round-trip (a mobile host, a C caller, or
//! [`crate::Transport`]) never has to understand the protocol. Everything is
//! owned so values move across threads and the C boundary freely.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the encoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the caller after executing an `HttpRequest`, then passed
/// to `TimetonicClient::parse_*` methods for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
