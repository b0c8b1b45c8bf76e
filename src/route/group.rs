use super::{parse_line, RouteDefinition, RouteName, RouteSettings};
use crate::handler::HandlerRef;
use crate::pattern::{is_anchored, PatternError};
use crate::router::RouterError;

use http::Method;

/// A node of a route tree.
#[derive(Debug, Clone)]
pub enum RouteEntry {
    Route(RouteDefinition),
    Group(RouteGroup),
    /// `"[METHOD ]pattern >>> handler"`
    Line(String),
}

impl From<RouteDefinition> for RouteEntry {
    fn from(r: RouteDefinition) -> Self {
        Self::Route(r)
    }
}

impl From<RouteGroup> for RouteEntry {
    fn from(g: RouteGroup) -> Self {
        Self::Group(g)
    }
}

impl From<&str> for RouteEntry {
    fn from(s: &str) -> Self {
        Self::Line(s.to_owned())
    }
}

impl From<String> for RouteEntry {
    fn from(s: String) -> Self {
        Self::Line(s)
    }
}

/// A prefix plus settings shared by its children.
#[derive(Debug, Clone, Default)]
pub struct RouteGroup {
    name: Option<String>,
    pattern: Option<String>,
    pub(crate) settings: RouteSettings,
    children: Vec<RouteEntry>,
}

impl RouteGroup {
    /// A group whose name is also its match fragment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A group that only shares settings.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Overrides the match fragment, which defaults to the name.
    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn route(mut self, entry: impl Into<RouteEntry>) -> Self {
        self.children.push(entry.into());
        self
    }

    pub fn routes<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RouteEntry>,
    {
        self.children.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn push(&mut self, entry: impl Into<RouteEntry>) -> &mut Self {
        self.children.push(entry.into());
        self
    }

    pub fn children(&self) -> &[RouteEntry] {
        &self.children
    }

    super::settings_builder!();
}

/// A self-contained leaf produced by flattening.
#[derive(Debug, Clone)]
pub(crate) struct FlatRoute {
    pub name: RouteName,
    pub pattern: String,
    pub handler: HandlerRef,
    pub settings: RouteSettings,
}

#[derive(Default)]
struct Scope<'a> {
    names: Vec<&'a str>,
    patterns: Vec<&'a str>,
}

pub(crate) fn flatten(entry: RouteEntry) -> Result<Vec<FlatRoute>, RouterError> {
    let mut out = Vec::new();
    walk(entry, &Scope::default(), &RouteSettings::default(), &mut out)?;
    Ok(out)
}

fn walk(
    entry: RouteEntry,
    scope: &Scope<'_>,
    inherited: &RouteSettings,
    out: &mut Vec<FlatRoute>,
) -> Result<(), RouterError> {
    let route = match entry {
        RouteEntry::Route(r) => r,
        RouteEntry::Line(line) => parse_line(&line)?,
        RouteEntry::Group(group) => {
            let RouteGroup {
                name,
                pattern,
                mut settings,
                children,
            } = group;
            settings.inherit(inherited);

            let mut inner = Scope {
                names: scope.names.clone(),
                patterns: scope.patterns.clone(),
            };
            if let Some(ref n) = name {
                inner.names.push(n);
            }
            if let Some(p) = pattern.as_deref().or(name.as_deref()) {
                check_fragment(p)?;
                inner.patterns.push(p);
            }
            for child in children {
                walk(child, &inner, &settings, out)?;
            }
            return Ok(());
        }
    };

    let RouteDefinition {
        name,
        pattern,
        mut settings,
    } = route;
    check_fragment(&pattern)?;

    let name = match name {
        Some(RouteName::Error(status)) => RouteName::Error(status),
        Some(RouteName::Named(n)) => RouteName::Named(join_names(&scope.names, &n)),
        None => RouteName::Named(derived_name(&scope.names, &pattern, settings.method.as_ref())),
    };
    let pattern = join_patterns(&scope.patterns, &pattern);

    settings.inherit(inherited);
    settings.options.validate()?;

    let handler = settings
        .handler
        .clone()
        .ok_or_else(|| RouterError::MissingHandler(name.to_string()))?;

    out.push(FlatRoute {
        name,
        pattern,
        handler,
        settings,
    });
    Ok(())
}

fn check_fragment(fragment: &str) -> Result<(), RouterError> {
    if is_anchored(fragment) {
        return Err(RouterError::Pattern {
            pattern: fragment.to_owned(),
            source: PatternError::Anchored,
        });
    }
    Ok(())
}

/// Name of a leaf declared without one: its joined match fragment, `/` for
/// the root, suffixed with `@METHOD` when the leaf itself restricts the verb.
fn derived_name(prefix: &[&str], pattern: &str, method: Option<&Method>) -> String {
    let mut name = join_names(prefix, pattern);
    if name.is_empty() {
        name.push('/');
    }
    if let Some(method) = method {
        name.push('@');
        name.push_str(method.as_str());
    }
    name
}

fn join_names(prefix: &[&str], leaf: &str) -> String {
    let mut out = String::new();
    for part in prefix.iter().copied().chain(std::iter::once(leaf)) {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(part);
    }
    out
}

fn join_patterns(prefix: &[&str], leaf: &str) -> String {
    let mut out = String::from("/");
    for part in prefix.iter().copied().chain(std::iter::once(leaf)) {
        let part = part.trim_start_matches('/');
        if part.is_empty() {
            continue;
        }
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(part);
    }
    out
}
