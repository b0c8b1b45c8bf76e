use super::{parse_status, RouteDefinition};
use crate::handler::HandlerRef;
use crate::router::RouterError;

use http::Method;

const ARROW: &str = ">>>";

/// Parses `"[METHOD ]pattern >>> handler"`.
///
/// A pattern that is an error status (`"404 >>> Errors::missing"`) declares an
/// error route.
pub(crate) fn parse_line(line: &str) -> Result<RouteDefinition, RouterError> {
    let invalid = || RouterError::InvalidLine(line.to_owned());

    let (lhs, rhs) = line.split_once(ARROW).ok_or_else(invalid)?;
    let handler = rhs.trim();
    if handler.is_empty() {
        return Err(invalid());
    }
    let handler: HandlerRef = handler.into();

    let lhs = lhs.trim();
    let (method, pattern) = match lhs.split_once(char::is_whitespace) {
        Some((verb, rest)) if is_verb(verb) => {
            let method = verb.parse::<Method>().map_err(|_| invalid())?;
            (Some(method), rest.trim())
        }
        _ => (None, lhs),
    };

    let mut route = match parse_status(pattern) {
        Some(status) => RouteDefinition::error(status),
        None => RouteDefinition::new(pattern),
    }
    .handler(handler);
    if let Some(method) = method {
        route = route.method(method);
    }
    Ok(route)
}

fn is_verb(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}
