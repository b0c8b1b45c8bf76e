use super::captures::Captures;
use super::error::RouterError;
use super::{Route, Router};

use crate::pattern::Locales;
use crate::route::{RouteEntry, RouteGroup};

use std::collections::HashMap;

use http::{Method, StatusCode};

impl Router {
    pub fn new() -> Self {
        Self::with_locales(Locales::default())
    }

    /// Locales are fixed before the first route because translated and
    /// locale placeholders are compiled against them.
    pub fn with_locales(locales: Locales) -> Self {
        Self {
            locales,
            routes: Vec::new(),
            names: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn locales(&self) -> &Locales {
        &self.locales
    }

    pub fn insert(&mut self, entry: impl Into<RouteEntry>) -> &mut Self {
        let entry = entry.into();
        if let Err(e) = self.insert_entry(entry) {
            panic!("{}", e);
        }
        self
    }

    pub fn try_insert(&mut self, entry: impl Into<RouteEntry>) -> Result<&mut Self, RouterError> {
        self.insert_entry(entry.into())?;
        Ok(self)
    }

    pub fn insert_all<I>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<RouteEntry>,
    {
        for entry in entries {
            self.insert(entry);
        }
        self
    }

    pub fn try_insert_all<I>(&mut self, entries: I) -> Result<&mut Self, RouterError>
    where
        I: IntoIterator,
        I::Item: Into<RouteEntry>,
    {
        for entry in entries {
            self.insert_entry(entry.into())?;
        }
        Ok(self)
    }

    pub fn nest(&mut self, name: &str, f: impl FnOnce(&mut RouteGroup)) -> &mut Self {
        let mut group = RouteGroup::new(name);
        f(&mut group);
        self.insert(group)
    }

    pub fn try_nest(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut RouteGroup),
    ) -> Result<&mut Self, RouterError> {
        let mut group = RouteGroup::new(name);
        f(&mut group);
        self.try_insert(group)
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.names.get(name).map(|&i| &self.routes[i])
    }

    /// Path routes in registration order.
    pub fn routes(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn error_route(&self, status: StatusCode) -> Result<&Route, RouterError> {
        self.errors
            .get(&status)
            .ok_or_else(|| RouterError::UnresolvedStatus(status.as_u16()))
    }

    pub fn len(&self) -> usize {
        self.routes.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.errors.is_empty()
    }

    /// Pattern and method match only, ignoring inputs and conditions.
    pub fn find<'s>(&'s self, method: &Method, path: &str) -> Option<(&'s Route, Captures)> {
        self.find_structural(method, path)
    }
}
