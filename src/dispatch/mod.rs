mod cache;
mod collab;
mod context;

pub use self::cache::{Cache, CachedResponse};
pub use self::collab::{
    EventSink, FixedLocale, LocaleProvider, Request, Response, SessionState, SimpleRequest,
    SimpleResponse, TracingEventSink,
};
pub use self::context::DispatchContext;

#[cfg(feature = "memory-cache")]
pub use self::cache::MemoryCache;

use self::cache::apply_cache_headers;

use crate::handler::{render_token, Handler, HandlerError, HandlerRef, HandlerRegistry, Target};
use crate::route::RouteName;
use crate::router::{Args, Resolved, Route, Router, RouterError};

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use serde_json::json;
use tracing::{debug, warn};

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub body: String,
    /// The route that rendered `body`, `None` for an inline status body.
    pub route: Option<RouteName>,
    pub from_cache: bool,
}

impl Outcome {
    fn rendered(body: String, route: &Route) -> Self {
        Self {
            body,
            route: Some(route.name().clone()),
            from_cache: false,
        }
    }

    fn inline(status: StatusCode, fallback: Option<String>) -> Self {
        Self {
            body: fallback.unwrap_or_else(|| status_text(status)),
            route: None,
            from_cache: false,
        }
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

enum Invocation<'a> {
    Func(&'a Arc<dyn Handler>),
    Target(Target<'a>),
}

impl Invocation<'_> {
    fn descriptor(&self, route: &Route) -> String {
        match self {
            Self::Func(_) => format!("fn@{}", route.name()),
            Self::Target(t) => t.descriptor(),
        }
    }

    fn invoke(&self, args: &Args, cx: &DispatchContext<'_>) -> Result<String, HandlerError> {
        match self {
            Self::Func(f) => f.call(args, cx),
            Self::Target(t) => t.invoke(args, cx),
        }
    }
}

fn failure(route: &Route, e: HandlerError) -> RouterError {
    let name = route.name().to_string();
    match e {
        HandlerError::BadUsage(message) => RouterError::BadRouteUsage {
            route: name,
            message,
        },
        HandlerError::Other(source) => RouterError::Handler {
            route: name,
            source,
        },
        HandlerError::Status { status, .. } => RouterError::BadRouteUsage {
            route: name,
            message: format!("error route signalled status {}", status.as_u16()),
        },
    }
}

/// Matches requests against a [`Router`] and renders the winning route.
///
/// Shareable across threads once built; every dispatch only reads the router
/// and the registry.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    handlers: Arc<HandlerRegistry>,
    cache: Option<Arc<dyn Cache>>,
    events: Arc<dyn EventSink>,
    locale: Option<Arc<dyn LocaleProvider>>,
}

impl Dispatcher {
    /// Emitted on every match with the route, regex, handler and arguments.
    pub const MATCHED: &'static str = "router.matched";

    pub fn new(router: impl Into<Arc<Router>>) -> Self {
        Self {
            router: router.into(),
            handlers: Arc::new(HandlerRegistry::new()),
            cache: None,
            events: Arc::new(TracingEventSink),
            locale: None,
        }
    }

    pub fn with_handlers(mut self, handlers: impl Into<Arc<HandlerRegistry>>) -> Self {
        self.handlers = handlers.into();
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_locale(mut self, locale: Arc<dyn LocaleProvider>) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    fn current_locale(&self) -> String {
        match self.locale {
            Some(ref p) => p.current_locale(),
            None => self.router.locales().default_locale().to_owned(),
        }
    }

    /// Routes `req` and writes status and headers to `res`.
    ///
    /// The first registered route accepting the request wins. Without one,
    /// the error route for the status already set on `res` renders, or for
    /// 404 when that status is not an error.
    pub fn dispatch(
        &self,
        req: &dyn Request,
        res: &mut dyn Response,
        session: Option<&dyn SessionState>,
    ) -> Result<Outcome, RouterError> {
        let locale = self.current_locale();

        let Resolved { route, args } = match self.router.resolve(req) {
            Some(resolved) => resolved,
            None => {
                let current = res.status();
                let status = if current.is_client_error() || current.is_server_error() {
                    current
                } else {
                    StatusCode::NOT_FOUND
                };
                debug!(method = %req.method(), path = req.path(), status = status.as_u16(), "no route matched");
                return self.render_status(req, res, &locale, status, None);
            }
        };

        let invocation = self.prepare(route, &args, req)?;
        let descriptor = invocation.descriptor(route);

        self.events.emit(
            Self::MATCHED,
            &json!({
                "route": route.name().to_string(),
                "regex": route.regex().as_str(),
                "handler": descriptor,
                "args": args,
            }),
        );

        let ttl = route.cache_ttl();
        let key = format!(
            "{}({})",
            descriptor,
            serde_json::to_string(&args).unwrap_or_default()
        );

        if ttl.is_some() {
            if session.map_or(false, |s| s.is_active()) {
                return Err(RouterError::CachedSessionRoute(route.name().to_string()));
            }
            if let Some(hit) = self.lookup(&key) {
                debug!(route = %route.name(), key = %key, "served from cache");
                hit.replay(res);
                return Ok(Outcome {
                    body: hit.output,
                    route: Some(route.name().clone()),
                    from_cache: true,
                });
            }
        }

        let cx = DispatchContext::new(&self.router, req, &locale, Some(route));
        let body = match invocation.invoke(&args, &cx) {
            Ok(body) => body,
            Err(HandlerError::Status { status, fallback }) => {
                debug!(route = %route.name(), status = status.as_u16(), "handler signalled status");
                return self.render_status(req, res, &locale, status, fallback);
            }
            Err(e) => return Err(failure(route, e)),
        };

        if let Some(code) = route.response_code() {
            res.set_status(code);
        }
        if let Some(ttl) = ttl {
            self.store(res, &key, &body, ttl);
        }
        Ok(Outcome::rendered(body, route))
    }

    /// Renders the error route registered for `status`.
    pub fn render_error(
        &self,
        status: StatusCode,
        req: &dyn Request,
        res: &mut dyn Response,
    ) -> Result<Outcome, RouterError> {
        self.router.error_route(status)?;
        let locale = self.current_locale();
        self.render_status(req, res, &locale, status, None)
    }

    fn render_status(
        &self,
        req: &dyn Request,
        res: &mut dyn Response,
        locale: &str,
        status: StatusCode,
        fallback: Option<String>,
    ) -> Result<Outcome, RouterError> {
        res.set_status(status);

        let route = match self.router.error_route(status) {
            Ok(route) => route,
            Err(_) => return Ok(Outcome::inline(status, fallback)),
        };
        if let Some(code) = route.response_code() {
            res.set_status(code);
        }

        let mut args = route.args().clone();
        args.insert("status".to_owned(), status.as_u16().into());

        let invocation = self.prepare(route, &args, req)?;
        let cx = DispatchContext::new(&self.router, req, locale, Some(route));
        match invocation.invoke(&args, &cx) {
            Ok(body) => Ok(Outcome::rendered(body, route)),
            Err(HandlerError::Status { status, fallback }) => {
                res.set_status(status);
                Ok(Outcome::inline(status, fallback))
            }
            Err(e) => Err(failure(route, e)),
        }
    }

    fn prepare<'s>(
        &'s self,
        route: &'s Route,
        args: &Args,
        req: &dyn Request,
    ) -> Result<Invocation<'s>, RouterError> {
        match route.handler() {
            HandlerRef::Func(f) => Ok(Invocation::Func(f)),
            HandlerRef::Target { class, method } => {
                let usage = |message| RouterError::BadRouteUsage {
                    route: route.name().to_string(),
                    message,
                };
                let class = render_token(class, args).map_err(usage)?;
                let method = match method {
                    Some(m) => Some(render_token(m, args).map_err(usage)?),
                    None => None,
                };
                self.handlers
                    .target(&class, method.as_deref(), req)
                    .map(Invocation::Target)
                    .map_err(|e| failure(route, e))
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let raw = self.cache.as_ref()?.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn store(&self, res: &mut dyn Response, key: &str, body: &str, ttl: Duration) {
        apply_cache_headers(res, ttl);
        let cache = match self.cache {
            Some(ref cache) => cache,
            None => return,
        };
        let entry = CachedResponse::capture(&*res, body);
        match serde_json::to_string(&entry) {
            Ok(raw) => cache.set(key, raw, ttl),
            Err(e) => warn!(key, error = %e, "response not cached"),
        }
    }
}
