use super::Request;

use crate::router::{Args, Link, Route, Router, RouterError};

/// What a handler sees of the dispatch in progress.
pub struct DispatchContext<'a> {
    router: &'a Router,
    request: &'a dyn Request,
    locale: &'a str,
    route: Option<&'a Route>,
}

impl<'a> DispatchContext<'a> {
    pub(crate) fn new(
        router: &'a Router,
        request: &'a dyn Request,
        locale: &'a str,
        route: Option<&'a Route>,
    ) -> Self {
        Self {
            router,
            request,
            locale,
            route,
        }
    }

    pub fn router(&self) -> &'a Router {
        self.router
    }

    pub fn request(&self) -> &'a dyn Request {
        self.request
    }

    pub fn locale(&self) -> &'a str {
        self.locale
    }

    pub fn route(&self) -> Option<&'a Route> {
        self.route
    }

    /// Reverse URL in the locale of the current dispatch.
    pub fn url_for(&self, name: &str, data: &Args) -> Result<Link, RouterError> {
        self.router.url_for(name, data, self.locale)
    }
}
