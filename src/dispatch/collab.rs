//! Contracts the dispatcher consumes from its host.

use crate::pattern::Locales;

use http::header::HeaderValue;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use url::form_urlencoded;

pub trait Request {
    fn method(&self) -> &Method;

    /// Request path, a query string is ignored.
    fn path(&self) -> &str;

    fn query(&self, name: &str) -> Option<String>;

    fn post(&self, _name: &str) -> Option<String> {
        None
    }

    fn is_xhr(&self) -> bool {
        false
    }
}

pub trait Response {
    fn status(&self) -> StatusCode;
    fn set_status(&mut self, status: StatusCode);
    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, data: &Value);
}

pub trait LocaleProvider: Send + Sync {
    fn current_locale(&self) -> String;
    fn available_locales(&self) -> Vec<String>;
}

pub trait SessionState {
    fn is_active(&self) -> bool;
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &str, data: &Value) {
        tracing::debug!(target: "nuclear_dispatch::events", event, data = %data);
    }
}

impl LocaleProvider for Locales {
    fn current_locale(&self) -> String {
        self.default_locale().to_owned()
    }

    fn available_locales(&self) -> Vec<String> {
        self.available().to_vec()
    }
}

/// A provider pinned to one locale.
#[derive(Debug, Clone)]
pub struct FixedLocale {
    current: String,
    available: Vec<String>,
}

impl FixedLocale {
    pub fn new(current: impl Into<String>) -> Self {
        let current = current.into();
        Self {
            available: vec![current.clone()],
            current,
        }
    }

    pub fn with_available<I, S>(mut self, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available = available.into_iter().map(Into::into).collect();
        self
    }
}

impl LocaleProvider for FixedLocale {
    fn current_locale(&self) -> String {
        self.current.clone()
    }

    fn available_locales(&self) -> Vec<String> {
        self.available.clone()
    }
}

fn lookup(query: Option<&str>, name: &str) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

impl<B> Request for http::Request<B> {
    fn method(&self) -> &Method {
        http::Request::method(self)
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn query(&self, name: &str) -> Option<String> {
        lookup(self.uri().query(), name)
    }

    fn is_xhr(&self) -> bool {
        self.headers()
            .get("x-requested-with")
            .map_or(false, |v| v.as_bytes().eq_ignore_ascii_case(b"XMLHttpRequest"))
    }
}

impl<B> Response for http::Response<B> {
    fn status(&self) -> StatusCode {
        http::Response::status(self)
    }

    fn set_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn headers(&self) -> &HeaderMap {
        http::Response::headers(self)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        http::Response::headers_mut(self)
    }
}

/// An in-memory request with decoded query and post fields.
#[derive(Debug, Clone)]
pub struct SimpleRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    post: Vec<(String, String)>,
    xhr: bool,
}

impl SimpleRequest {
    /// `target` is a path with an optional query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, form_urlencoded::parse(q.as_bytes()).into_owned().collect()),
            None => (target, Vec::new()),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            post: Vec::new(),
            xhr: false,
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post_to(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn with_post(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn xhr(mut self) -> Self {
        self.xhr = true;
        self
    }
}

fn field(fields: &[(String, String)], name: &str) -> Option<String> {
    fields
        .iter()
        .find_map(|(k, v)| if k == name { Some(v.clone()) } else { None })
}

impl Request for SimpleRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self, name: &str) -> Option<String> {
        field(&self.query, name)
    }

    fn post(&self, name: &str) -> Option<String> {
        field(&self.post, name)
    }

    fn is_xhr(&self) -> bool {
        self.xhr
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimpleResponse {
    status: StatusCode,
    headers: HeaderMap,
}

impl SimpleResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v: &HeaderValue| v.to_str().ok())
    }
}

impl Response for SimpleResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_request_decodes_query() {
        let req = SimpleRequest::get("/search?q=rust+lang&page=2").with_post("token", "t");
        assert_eq!(Request::path(&req), "/search");
        assert_eq!(req.query("q").as_deref(), Some("rust lang"));
        assert_eq!(req.query("page").as_deref(), Some("2"));
        assert_eq!(req.query("Page"), None);
        assert_eq!(req.post("token").as_deref(), Some("t"));
    }

    #[test]
    fn http_request_adapter() {
        let req = http::Request::builder()
            .method(Method::GET)
            .uri("/search?q=a%20b")
            .header("X-Requested-With", "XMLHttpRequest")
            .body(())
            .unwrap();
        assert_eq!(Request::path(&req), "/search");
        assert_eq!(Request::query(&req, "q").as_deref(), Some("a b"));
        assert!(Request::is_xhr(&req));
    }
}
