mod binder;
mod registry;

pub use self::binder::{Arg, ArgumentBinder, BindError, BoundArgs, Param, ParamKind, ParamSchema};
pub use self::registry::{Controller, HandlerRegistry};

pub(crate) use self::registry::Target;

use crate::dispatch::DispatchContext;
use crate::pattern::value_text;
use crate::router::Args;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

pub type BoxError = Box<dyn StdError + Send + Sync>;

pub type HandlerResult<T> = Result<T, HandlerError>;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Deliberate HTTP status, rendered through the matching error route.
    #[error("http status {status}")]
    Status {
        status: StatusCode,
        fallback: Option<String>,
    },
    #[error("bad route usage: {0}")]
    BadUsage(String),
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl HandlerError {
    pub fn status(status: StatusCode) -> Self {
        Self::Status {
            status,
            fallback: None,
        }
    }

    pub fn status_with(status: StatusCode, fallback: impl Into<String>) -> Self {
        Self::Status {
            status,
            fallback: Some(fallback.into()),
        }
    }

    pub fn other(e: impl StdError + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(e))
    }
}

impl From<BindError> for HandlerError {
    fn from(e: BindError) -> Self {
        Self::BadUsage(e.to_string())
    }
}

pub trait Handler: Send + Sync {
    fn call(&self, args: &Args, cx: &DispatchContext<'_>) -> HandlerResult<String>;
}

impl<F> Handler for F
where
    F: Fn(&Args, &DispatchContext<'_>) -> HandlerResult<String> + Send + Sync,
{
    fn call(&self, args: &Args, cx: &DispatchContext<'_>) -> HandlerResult<String> {
        (self)(args, cx)
    }
}

/// What a route invokes.
#[derive(Clone)]
pub enum HandlerRef {
    Func(Arc<dyn Handler>),
    /// `Class::method` resolved through a [`HandlerRegistry`]. Both tokens may
    /// hold `<name>` placeholders filled from the matched arguments.
    Target {
        class: String,
        method: Option<String>,
    },
}

impl HandlerRef {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Args, &DispatchContext<'_>) -> HandlerResult<String> + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    pub fn from_handler(h: impl Handler + 'static) -> Self {
        Self::Func(Arc::new(h))
    }

    pub fn target(class: impl Into<String>, method: Option<String>) -> Self {
        Self::Target {
            class: class.into(),
            method,
        }
    }

    /// Parses `"Class::method"` or `"Class"`.
    pub fn parse(s: &str) -> Self {
        match s.split_once("::") {
            Some((class, method)) if !method.is_empty() => {
                Self::target(class.trim(), Some(method.trim().to_owned()))
            }
            Some((class, _)) => Self::target(class.trim(), None),
            None => Self::target(s.trim(), None),
        }
    }
}

impl From<&str> for HandlerRef {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for HandlerRef {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Arc<dyn Handler>> for HandlerRef {
    fn from(h: Arc<dyn Handler>) -> Self {
        Self::Func(h)
    }
}

impl From<(&str, &str)> for HandlerRef {
    fn from((class, method): (&str, &str)) -> Self {
        Self::target(class, Some(method.to_owned()))
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Func(_) => f.write_str("<fn>"),
            Self::Target {
                class,
                method: Some(m),
            } => write!(f, "{}::{}", class, m),
            Self::Target { class, method: None } => f.write_str(class),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerRef({})", self)
    }
}

/// Replaces `<name>` tokens with argument values.
pub(crate) fn render_token(template: &str, args: &Args) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];
        let gt = match after.find('>') {
            Some(gt) => gt,
            None => {
                out.push_str(&rest[lt..]);
                return Ok(out);
            }
        };
        let name = &after[..gt];
        let value = args
            .get(name)
            .and_then(value_text)
            .ok_or_else(|| format!("no argument {:?} for handler token {:?}", name, template))?;
        out.push_str(&value);
        rest = &after[gt + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
