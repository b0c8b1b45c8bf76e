use super::{ArgumentBinder, BoundArgs, HandlerError, HandlerResult, ParamSchema};
use crate::dispatch::{DispatchContext, Request};
use crate::router::Args;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

type Action<O> = Arc<dyn Fn(&BoundArgs, &DispatchContext<'_>) -> HandlerResult<O> + Send + Sync>;

#[derive(Clone)]
struct Endpoint<O> {
    params: ParamSchema,
    action: Action<O>,
}

impl<O> Endpoint<O> {
    fn call(&self, args: &Args, cx: &DispatchContext<'_>) -> HandlerResult<O> {
        let bound = ArgumentBinder::bind(&self.params, args)?;
        (self.action)(&bound, cx)
    }
}

/// A family of named actions addressed as `Class::method`.
#[derive(Clone, Default)]
pub struct Controller {
    init: Option<Endpoint<Option<String>>>,
    methods: HashMap<String, Endpoint<String>>,
}

impl Controller {
    pub const GET: &'static str = "get";
    pub const POST: &'static str = "post";
    pub const AJAX: &'static str = "ajax";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<F>(mut self, name: impl Into<String>, params: ParamSchema, f: F) -> Self
    where
        F: Fn(&BoundArgs, &DispatchContext<'_>) -> HandlerResult<String> + Send + Sync + 'static,
    {
        let endpoint = Endpoint {
            params,
            action: Arc::new(f),
        };
        self.methods.insert(name.into(), endpoint);
        self
    }

    /// Runs before every action; returning `Some(output)` skips the action.
    pub fn init<F>(mut self, params: ParamSchema, f: F) -> Self
    where
        F: Fn(&BoundArgs, &DispatchContext<'_>) -> HandlerResult<Option<String>>
            + Send
            + Sync
            + 'static,
    {
        self.init = Some(Endpoint {
            params,
            action: Arc::new(f),
        });
        self
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    fn select(&self, request: &dyn Request) -> &'static str {
        if request.is_xhr() && self.has_method(Self::AJAX) {
            Self::AJAX
        } else if *request.method() == Method::POST && self.has_method(Self::POST) {
            Self::POST
        } else {
            Self::GET
        }
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Controller")
            .field("init", &self.init.is_some())
            .field("methods", &methods)
            .finish()
    }
}

/// Controllers by class token.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    controllers: HashMap<String, Controller>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: impl Into<String>, controller: Controller) -> &mut Self {
        self.controllers.insert(class.into(), controller);
        self
    }

    pub fn get(&self, class: &str) -> Option<&Controller> {
        self.controllers.get(class)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Resolves already rendered class and method tokens.
    pub(crate) fn target<'r>(
        &'r self,
        class: &str,
        method: Option<&str>,
        request: &dyn Request,
    ) -> Result<Target<'r>, HandlerError> {
        let controller = self
            .get(class)
            .ok_or_else(|| HandlerError::BadUsage(format!("unknown handler class {:?}", class)))?;

        let method = match method {
            Some(m) => m.to_owned(),
            None => controller.select(request).to_owned(),
        };
        if !controller.has_method(&method) {
            return Err(HandlerError::BadUsage(format!(
                "handler class {:?} has no method {:?}",
                class, method
            )));
        }

        Ok(Target {
            controller,
            class: class.to_owned(),
            method,
        })
    }
}

/// A resolved `Class::method` ready to run.
pub(crate) struct Target<'r> {
    controller: &'r Controller,
    class: String,
    method: String,
}

impl Target<'_> {
    pub fn descriptor(&self) -> String {
        format!("{}::{}", self.class, self.method)
    }

    pub fn invoke(&self, args: &Args, cx: &DispatchContext<'_>) -> HandlerResult<String> {
        if let Some(ref init) = self.controller.init {
            if let Some(output) = init.call(args, cx)? {
                return Ok(output);
            }
        }
        match self.controller.methods.get(&self.method) {
            Some(endpoint) => endpoint.call(args, cx),
            None => Err(HandlerError::BadUsage(format!(
                "handler class {:?} has no method {:?}",
                self.class, self.method
            ))),
        }
    }
}
