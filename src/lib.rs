#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod handler;
pub mod pattern;
pub mod route;
pub mod router;

mod macros;

pub use http::{Method, StatusCode};

pub use crate::dispatch::{Dispatcher, Outcome};
pub use crate::handler::{HandlerError, HandlerRef, HandlerRegistry};
pub use crate::pattern::{Locales, PatternCompiler, PatternError};
pub use crate::route::{RouteDefinition, RouteEntry, RouteGroup, RouteName, UserInputSpec};
pub use crate::router::{Args, Link, Router, RouterError};
