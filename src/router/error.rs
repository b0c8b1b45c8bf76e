use crate::handler::BoxError;
use crate::pattern::PatternError;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("invalid regex for pattern {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("duplicate route name {0:?}")]
    DuplicateName(String),
    #[error("duplicate error route for status {0}")]
    DuplicateStatus(u16),
    #[error("route {0:?} has no handler")]
    MissingHandler(String),
    #[error("invalid option {key}: {message}")]
    InvalidOption { key: String, message: String },
    #[error("invalid route line {0:?}")]
    InvalidLine(String),
    #[error("no error route registered for status {0}")]
    UnresolvedStatus(u16),
    #[error("route {0:?} caches its response but the session is active")]
    CachedSessionRoute(String),

    #[error("unknown route {0:?}")]
    UnknownRoute(String),
    #[error("route {route:?}: missing value for {name:?}")]
    MissingValue { route: String, name: String },
    #[error("bad route usage in {route:?}: {message}")]
    BadRouteUsage { route: String, message: String },
    #[error("handler of route {route:?} failed: {source}")]
    Handler {
        route: String,
        #[source]
        source: BoxError,
    },
}

impl RouterError {
    /// Author mistakes, as opposed to per-request usage errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Pattern { .. }
                | Self::Regex { .. }
                | Self::DuplicateName(_)
                | Self::DuplicateStatus(_)
                | Self::MissingHandler(_)
                | Self::InvalidOption { .. }
                | Self::InvalidLine(_)
                | Self::UnresolvedStatus(_)
                | Self::CachedSessionRoute(_)
        )
    }
}
