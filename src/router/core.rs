use super::{Args, Captures, Route, Router, RouterError};

use crate::dispatch::Request;
use crate::pattern::PatternCompiler;
use crate::route::{flatten, FlatRoute, RouteEntry, RouteName};

use std::collections::HashSet;

use http::Method;
use regex::Regex;
use tracing::{debug, trace};

/// A route that passed every check for a request.
#[derive(Debug)]
pub(crate) struct Resolved<'r> {
    pub route: &'r Route,
    pub args: Args,
}

impl Router {
    fn compile(&self, flat: FlatRoute) -> Result<Route, RouterError> {
        let compiled = PatternCompiler::new(&self.locales)
            .compile(&flat.pattern)
            .map_err(|source| RouterError::Pattern {
                pattern: flat.pattern.clone(),
                source,
            })?;
        let regex = Regex::new(&format!("^(?:{})$", compiled.source())).map_err(|source| {
            RouterError::Regex {
                pattern: flat.pattern.clone(),
                source,
            }
        })?;

        Ok(Route {
            name: flat.name,
            pattern: flat.pattern,
            compiled,
            regex,
            handler: flat.handler,
            settings: flat.settings,
        })
    }

    /// Flattens, compiles and checks the whole entry before registering any of it.
    pub(super) fn insert_entry(&mut self, entry: RouteEntry) -> Result<usize, RouterError> {
        let mut batch = Vec::new();
        for flat in flatten(entry)? {
            batch.push(self.compile(flat)?);
        }

        let mut names = HashSet::new();
        let mut statuses = HashSet::new();
        for route in &batch {
            match route.name {
                RouteName::Named(ref n) => {
                    if self.names.contains_key(n) || !names.insert(n.as_str()) {
                        return Err(RouterError::DuplicateName(n.clone()));
                    }
                }
                RouteName::Error(status) => {
                    if self.errors.contains_key(&status) || !statuses.insert(status) {
                        return Err(RouterError::DuplicateStatus(status.as_u16()));
                    }
                }
            }
        }

        let count = batch.len();
        for route in batch {
            debug!(name = %route.name, regex = route.regex.as_str(), "route registered");
            match route.name {
                RouteName::Named(ref n) => {
                    self.names.insert(n.clone(), self.routes.len());
                    self.routes.push(route);
                }
                RouteName::Error(status) => {
                    self.errors.insert(status, route);
                }
            }
        }
        Ok(count)
    }

    /// First route, in registration order, accepting the request.
    pub(crate) fn resolve(&self, req: &dyn Request) -> Option<Resolved<'_>> {
        let path = strip_query(req.path());
        let method = req.method();

        for route in &self.routes {
            if route.method().map_or(false, |m| m != method) {
                continue;
            }
            let captures = match route.captures(path) {
                Some(c) => c,
                None => continue,
            };
            let inputs = match collect_inputs(route, req) {
                Some(inputs) => inputs,
                None => {
                    trace!(route = %route.name, "skipped: mandatory input missing or invalid");
                    continue;
                }
            };

            let mut args = route.args().clone();
            args.extend(inputs);
            args.extend(captures.to_args());

            if !route.conditions().iter().all(|c| c.check(&args)) {
                trace!(route = %route.name, "skipped: condition rejected");
                continue;
            }

            return Some(Resolved { route, args });
        }
        None
    }

    pub(super) fn find_structural(&self, method: &Method, path: &str) -> Option<(&Route, Captures)> {
        let path = strip_query(path);
        self.routes
            .iter()
            .filter(|r| r.method().map_or(true, |m| m == method))
            .find_map(|r| r.captures(path).map(|c| (r, c)))
    }
}

/// Typed values of the route's inputs, `None` when a mandatory one fails.
fn collect_inputs(route: &Route, req: &dyn Request) -> Option<Args> {
    let mut out = Args::new();
    let post = *req.method() == Method::POST;

    for input in route.inputs() {
        let raw = if post {
            req.post(&input.name).or_else(|| req.query(&input.name))
        } else {
            req.query(&input.name)
        };
        match raw.and_then(|r| input.kind.parse(&r)) {
            Some(v) => {
                out.insert(input.name.clone(), v);
            }
            None if input.mandatory => return None,
            None => {}
        }
    }
    Some(out)
}

pub(crate) fn strip_query(path: &str) -> &str {
    match path.find('?') {
        Some(i) => &path[..i],
        None => path,
    }
}
