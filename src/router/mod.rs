mod captures;
mod core;
mod error;
mod imp;
mod reverse;

pub use self::captures::Captures;
pub use self::error::RouterError;
pub use self::reverse::Link;

pub(crate) use self::core::Resolved;

use crate::handler::HandlerRef;
use crate::pattern::{CompiledPattern, Locales};
use crate::route::{Condition, RouteName, RouteOptions, RouteSettings, UserInputSpec};

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use http::{Method, StatusCode};
use regex::Regex;
use serde_json::Value;

/// Arguments handed to conditions and handlers. Keys are ordered, so the
/// JSON encoding of a map is canonical.
pub type Args = BTreeMap<String, Value>;

/// Registered routes, immutable once dispatching starts.
#[derive(Debug, Default)]
pub struct Router {
    locales: Locales,
    routes: Vec<Route>,
    names: HashMap<String, usize>,
    errors: HashMap<StatusCode, Route>,
}

/// A flattened, compiled route.
#[derive(Debug)]
pub struct Route {
    name: RouteName,
    pattern: String,
    compiled: CompiledPattern,
    regex: Regex,
    handler: HandlerRef,
    settings: RouteSettings,
}

impl Route {
    pub fn name(&self) -> &RouteName {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The anchored matching regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn method(&self) -> Option<&Method> {
        self.settings.method.as_ref()
    }

    pub fn inputs(&self) -> &[UserInputSpec] {
        &self.settings.inputs
    }

    pub fn args(&self) -> &Args {
        &self.settings.args
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.settings.conditions
    }

    pub fn options(&self) -> &RouteOptions {
        &self.settings.options
    }

    pub fn response_code(&self) -> Option<StatusCode> {
        self.settings.response_code
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.settings.options.cache
    }

    pub fn urlize(&self) -> bool {
        self.settings.options.urlize.unwrap_or(true)
    }

    /// Structural match of a query-less path.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        let caps = self.regex.captures(path)?;
        let mut out = Captures::new();
        for name in self.compiled.capture_names() {
            if let Some(m) = caps.name(name) {
                out.push(name, m.as_str());
            }
        }
        Some(out)
    }
}
