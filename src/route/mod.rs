mod group;
mod input;
mod line;

pub use self::group::{RouteEntry, RouteGroup};
pub use self::input::{InputType, UserInputSpec};

pub(crate) use self::group::{flatten, FlatRoute};
pub(crate) use self::line::parse_line;

use crate::handler::HandlerRef;
use crate::router::{Args, RouterError};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use serde_json::Value;

/// Route identity: a unique name, or the status an error route renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteName {
    Named(String),
    Error(StatusCode),
}

impl RouteName {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Named(s) => Some(s),
            Self::Error(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Named(_) => None,
            Self::Error(s) => Some(*s),
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(s) => f.write_str(s),
            Self::Error(s) => write!(f, "{}", s.as_u16()),
        }
    }
}

/// Three-digit names in the error range denote error routes.
impl From<&str> for RouteName {
    fn from(s: &str) -> Self {
        match parse_status(s) {
            Some(status) => Self::Error(status),
            None => Self::Named(s.to_owned()),
        }
    }
}

impl From<String> for RouteName {
    fn from(s: String) -> Self {
        match parse_status(&s) {
            Some(status) => Self::Error(status),
            None => Self::Named(s),
        }
    }
}

impl From<StatusCode> for RouteName {
    fn from(s: StatusCode) -> Self {
        Self::Error(s)
    }
}

pub(crate) fn parse_status(s: &str) -> Option<StatusCode> {
    if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    StatusCode::from_bytes(s.as_bytes())
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
}

/// Predicate over the merged arguments of a candidate route.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&Args) -> bool + Send + Sync>);

impl Condition {
    pub fn new(f: impl Fn(&Args) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn check(&self, args: &Args) -> bool {
        (self.0)(args)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteOptions {
    /// `URLIZE`: slug-normalize values during generation, on by default.
    pub urlize: Option<bool>,
    /// `CACHE`: response TTL.
    pub cache: Option<Duration>,
    pub extra: BTreeMap<String, Value>,
}

impl RouteOptions {
    pub const URLIZE: &'static str = "URLIZE";
    pub const CACHE: &'static str = "CACHE";

    /// Longest accepted `CACHE` TTL, one year.
    pub const MAX_CACHE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Reads the recognized keys, everything else lands in `extra`.
    ///
    /// `URLIZE` must be a bool and `CACHE` a whole number of seconds up to
    /// [`MAX_CACHE`](Self::MAX_CACHE).
    pub fn from_map(map: BTreeMap<String, Value>) -> Result<Self, RouterError> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                Self::URLIZE => match value.as_bool() {
                    Some(b) => options.urlize = Some(b),
                    None => return Err(invalid_option(key, "expected a bool", &value)),
                },
                Self::CACHE => match value.as_u64() {
                    Some(secs) if secs <= Self::MAX_CACHE.as_secs() => {
                        options.cache = Some(Duration::from_secs(secs));
                    }
                    Some(_) => return Err(invalid_option(key, "ttl longer than one year", &value)),
                    None => return Err(invalid_option(key, "expected whole seconds", &value)),
                },
                _ => {
                    options.extra.insert(key, value);
                }
            }
        }
        Ok(options)
    }

    /// Rejects what [`from_map`](Self::from_map) would have rejected.
    pub(crate) fn validate(&self) -> Result<(), RouterError> {
        for key in [Self::URLIZE, Self::CACHE] {
            if let Some(value) = self.extra.get(key) {
                Self::from_map(std::iter::once((key.to_owned(), value.clone())).collect())?;
            }
        }
        match self.cache {
            Some(ttl) if ttl > Self::MAX_CACHE => Err(RouterError::InvalidOption {
                key: Self::CACHE.to_owned(),
                message: format!("ttl of {}s is longer than one year", ttl.as_secs()),
            }),
            _ => Ok(()),
        }
    }

    fn inherit(&mut self, parent: &RouteOptions) {
        if self.urlize.is_none() {
            self.urlize = parent.urlize;
        }
        if self.cache.is_none() {
            self.cache = parent.cache;
        }
        for (k, v) in &parent.extra {
            self.extra.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

fn invalid_option(key: String, expected: &str, value: &Value) -> RouterError {
    RouterError::InvalidOption {
        key,
        message: format!("{}, got {}", expected, value),
    }
}

/// Settings shared by routes and groups and inherited down the tree.
#[derive(Debug, Clone, Default)]
pub struct RouteSettings {
    pub method: Option<Method>,
    pub handler: Option<HandlerRef>,
    pub inputs: Vec<UserInputSpec>,
    pub args: Args,
    pub conditions: Vec<Condition>,
    pub options: RouteOptions,
    pub response_code: Option<StatusCode>,
}

impl RouteSettings {
    /// Fills what `self` leaves open from `parent`.
    ///
    /// Lists keep inherited entries first; an input redeclared by name
    /// replaces the inherited one.
    pub(crate) fn inherit(&mut self, parent: &RouteSettings) {
        if self.method.is_none() {
            self.method = parent.method.clone();
        }
        if self.handler.is_none() {
            self.handler = parent.handler.clone();
        }
        if self.response_code.is_none() {
            self.response_code = parent.response_code;
        }

        let own = std::mem::take(&mut self.inputs);
        let mut inputs: Vec<UserInputSpec> = parent
            .inputs
            .iter()
            .filter(|p| !own.iter().any(|i| i.name == p.name))
            .cloned()
            .collect();
        inputs.extend(own);
        self.inputs = inputs;

        for (k, v) in &parent.args {
            self.args.entry(k.clone()).or_insert_with(|| v.clone());
        }

        let own = std::mem::take(&mut self.conditions);
        self.conditions = parent.conditions.iter().cloned().chain(own).collect();

        self.options.inherit(&parent.options);
    }
}

macro_rules! settings_builder {
    () => {
        pub fn method(mut self, method: http::Method) -> Self {
            self.settings.method = Some(method);
            self
        }

        pub fn handler(mut self, handler: impl Into<crate::handler::HandlerRef>) -> Self {
            self.settings.handler = Some(handler.into());
            self
        }

        pub fn input(mut self, input: crate::route::UserInputSpec) -> Self {
            self.settings.inputs.push(input);
            self
        }

        pub fn arg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
            self.settings.args.insert(name.into(), value.into());
            self
        }

        pub fn condition(
            mut self,
            f: impl Fn(&crate::router::Args) -> bool + Send + Sync + 'static,
        ) -> Self {
            self.settings.conditions.push(crate::route::Condition::new(f));
            self
        }

        pub fn cache(mut self, ttl: std::time::Duration) -> Self {
            self.settings.options.cache = Some(ttl);
            self
        }

        pub fn urlize(mut self, urlize: bool) -> Self {
            self.settings.options.urlize = Some(urlize);
            self
        }

        pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
            let mut map = std::collections::BTreeMap::new();
            map.insert(key.into(), value.into());
            match crate::route::RouteOptions::from_map(map.clone()) {
                Ok(parsed) => {
                    let options = &mut self.settings.options;
                    options.urlize = parsed.urlize.or(options.urlize);
                    options.cache = parsed.cache.or(options.cache);
                    options.extra.extend(parsed.extra);
                }
                // kept raw, registration reports it
                Err(_) => self.settings.options.extra.extend(map),
            }
            self
        }

        pub fn response_code(mut self, status: http::StatusCode) -> Self {
            self.settings.response_code = Some(status);
            self
        }

        pub fn settings(&self) -> &crate::route::RouteSettings {
            &self.settings
        }
    };
}

pub(crate) use settings_builder;

/// One routable endpoint as declared by the author.
#[derive(Debug, Clone, Default)]
pub struct RouteDefinition {
    pub(crate) name: Option<RouteName>,
    pub(crate) pattern: String,
    pub(crate) settings: RouteSettings,
}

impl RouteDefinition {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            name: None,
            pattern: pattern.into(),
            settings: RouteSettings::default(),
        }
    }

    /// An error route rendered for `status`.
    pub fn error(status: StatusCode) -> Self {
        Self {
            name: Some(RouteName::Error(status)),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<RouteName>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    settings_builder!();
}
