use nuclear_dispatch::dispatch::{
    DispatchContext, EventSink, MemoryCache, Request, Response, SessionState, SimpleRequest,
    SimpleResponse,
};
use nuclear_dispatch::handler::{Controller, ParamSchema};
use nuclear_dispatch::route::{InputType, UserInputSpec};
use nuclear_dispatch::{
    Args, Dispatcher, HandlerError, HandlerRef, HandlerRegistry, Method, RouteDefinition,
    RouteName, Router, RouterError, StatusCode,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

fn echo(name: &'static str) -> HandlerRef {
    HandlerRef::func(move |args: &Args, _: &DispatchContext<'_>| {
        Ok(format!("{} {}", name, serde_json::to_string(args).unwrap()))
    })
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(String, Value)>>,
}

impl EventSink for Recorder {
    fn emit(&self, event: &str, data: &Value) {
        self.events.lock().unwrap().push((event.to_owned(), data.clone()));
    }
}

struct Session(bool);

impl SessionState for Session {
    fn is_active(&self) -> bool {
        self.0
    }
}

#[test]
fn dispatch_merges_arguments() {
    let mut router = Router::new();
    router.insert(
        RouteDefinition::new("/user/{{C:<id>[0-9]+}}")
            .name("user")
            .arg("id", "static")
            .arg("tab", "profile")
            .input(UserInputSpec::optional("page", InputType::Int))
            .handler(echo("user")),
    );
    let dispatcher = Dispatcher::new(router);

    let mut res = SimpleResponse::new();
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/user/42?page=3"), &mut res, None)
        .unwrap();
    assert_eq!(out.body, r#"user {"id":"42","page":3,"tab":"profile"}"#);
    assert_eq!(out.route, Some(RouteName::Named("user".into())));
    assert!(!out.from_cache);
    assert_eq!(res.status(), StatusCode::OK);

    // invalid optional inputs are left out
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/user/42?page=x"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.body, r#"user {"id":"42","tab":"profile"}"#);
}

#[test]
fn method_mismatch_falls_through() {
    let mut router = Router::new();
    router
        .insert(RouteDefinition::new("/login").name("form").method(Method::GET).handler(echo("form")))
        .insert(RouteDefinition::new("/login").name("submit").method(Method::POST).handler(echo("submit")));
    let dispatcher = Dispatcher::new(router);

    let out = dispatcher
        .dispatch(&SimpleRequest::post_to("/login"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.route, Some(RouteName::Named("submit".into())));
}

#[test]
fn mandatory_input_is_skipped_then_404() {
    let mut router = Router::new();
    router.insert(
        RouteDefinition::new("/list")
            .name("list")
            .input(UserInputSpec::mandatory("page", InputType::Int))
            .handler(echo("list")),
    );
    let dispatcher = Dispatcher::new(router);

    let mut res = SimpleResponse::new();
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/list"), &mut res, None)
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(out.body, "404 Not Found");
    assert_eq!(out.route, None);

    let out = dispatcher
        .dispatch(&SimpleRequest::get("/list?page=2"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.body, r#"list {"page":2}"#);
}

#[test]
fn mandatory_input_skips_to_next_candidate() {
    let mut router = Router::new();
    router
        .insert(
            RouteDefinition::new("/search")
                .name("results")
                .input(UserInputSpec::mandatory("q", InputType::String))
                .handler(echo("results")),
        )
        .insert(RouteDefinition::new("/search").name("form").handler(echo("form")));
    let dispatcher = Dispatcher::new(router);

    let out = dispatcher
        .dispatch(&SimpleRequest::get("/search"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.route, Some(RouteName::Named("form".into())));

    let out = dispatcher
        .dispatch(&SimpleRequest::get("/search?q=rust"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.route, Some(RouteName::Named("results".into())));

    // post bodies are read before the query string
    let req = SimpleRequest::post_to("/search?q=query").with_post("q", "body");
    let out = dispatcher.dispatch(&req, &mut SimpleResponse::new(), None).unwrap();
    assert_eq!(out.body, r#"results {"q":"body"}"#);
}

#[test]
fn conditions_filter_candidates() {
    let mut router = Router::new();
    router
        .insert(
            RouteDefinition::new("/item/{{C:<id>[0-9]+}}")
                .name("even")
                .condition(|args| {
                    args["id"]
                        .as_str()
                        .and_then(|s| s.parse::<u32>().ok())
                        .map_or(false, |n| n % 2 == 0)
                })
                .handler(echo("even")),
        )
        .insert(RouteDefinition::new("/item/{{C:<id>[0-9]+}}").name("odd").handler(echo("odd")));
    let dispatcher = Dispatcher::new(router);

    let route = |path: &str| {
        dispatcher
            .dispatch(&SimpleRequest::get(path), &mut SimpleResponse::new(), None)
            .unwrap()
            .route
    };
    assert_eq!(route("/item/4"), Some(RouteName::Named("even".into())));
    assert_eq!(route("/item/5"), Some(RouteName::Named("odd".into())));
}

#[test]
fn cached_route_invokes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut router = Router::new();
    router.insert(
        RouteDefinition::new("/news/{{C:<id>}}")
            .name("news")
            .cache(Duration::from_secs(60))
            .response_code(StatusCode::ACCEPTED)
            .handler(HandlerRef::func(move |args, _| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Ok(format!("news {} #{}", args["id"], n))
            })),
    );
    let cache = Arc::new(MemoryCache::new());
    let dispatcher = Dispatcher::new(router).with_cache(cache.clone());

    let mut first = SimpleResponse::new();
    let a = dispatcher
        .dispatch(&SimpleRequest::get("/news/7"), &mut first, None)
        .unwrap();
    assert!(!a.from_cache);
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    assert_eq!(first.header("cache-control"), Some("public, max-age=60"));
    assert_eq!(first.header("pragma"), Some("cache"));
    assert!(first.header("expires").is_some());
    assert!(first.header("vary").is_some());

    let mut second = SimpleResponse::new();
    let b = dispatcher
        .dispatch(&SimpleRequest::get("/news/7"), &mut second, None)
        .unwrap();
    assert!(b.from_cache);
    assert_eq!(a.body, b.body);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.status(), StatusCode::ACCEPTED);
    assert_eq!(second.header("cache-control"), first.header("cache-control"));
    assert_eq!(second.header("expires"), first.header("expires"));

    // other arguments make another key
    dispatcher
        .dispatch(&SimpleRequest::get("/news/8"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn cached_route_rejects_active_session() {
    let mut router = Router::new();
    router.insert(
        RouteDefinition::new("/feed")
            .name("feed")
            .cache(Duration::from_secs(10))
            .handler(echo("feed")),
    );
    let dispatcher = Dispatcher::new(router).with_cache(Arc::new(MemoryCache::new()));
    let req = SimpleRequest::get("/feed");

    let err = dispatcher
        .dispatch(&req, &mut SimpleResponse::new(), Some(&Session(true)))
        .unwrap_err();
    assert!(matches!(err, RouterError::CachedSessionRoute(ref n) if n == "feed"));
    assert!(err.is_configuration());

    assert!(dispatcher
        .dispatch(&req, &mut SimpleResponse::new(), Some(&Session(false)))
        .is_ok());
}

#[test]
fn error_routes() {
    let mut router = Router::new();
    router
        .insert(RouteDefinition::new("/private").name("private").handler(HandlerRef::func(
            |_, _| Err(HandlerError::status(StatusCode::FORBIDDEN)),
        )))
        .insert(RouteDefinition::new("/gone").name("gone").handler(HandlerRef::func(|_, _| {
            Err(HandlerError::status_with(StatusCode::GONE, "it left"))
        })))
        .insert(RouteDefinition::new("/teapot").name("teapot").handler(HandlerRef::func(
            |_, _| Err(HandlerError::status(StatusCode::IM_A_TEAPOT)),
        )))
        .insert(
            RouteDefinition::error(StatusCode::NOT_FOUND)
                .arg("layout", "plain")
                .handler(HandlerRef::func(|args, cx| {
                    Ok(format!("missing {} ({}) {}", args["status"], args["layout"], cx.request().path()))
                })),
        )
        .insert(
            RouteDefinition::error(StatusCode::FORBIDDEN)
                .handler(HandlerRef::func(|_, _| Ok("denied".to_owned()))),
        );
    let dispatcher = Dispatcher::new(router);

    let mut res = SimpleResponse::new();
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/nowhere"), &mut res, None)
        .unwrap();
    assert_eq!(out.body, r#"missing 404 ("plain") /nowhere"#);
    assert_eq!(out.route, Some(RouteName::Error(StatusCode::NOT_FOUND)));
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // an error status already on the response picks its route
    let mut res = SimpleResponse::new();
    res.set_status(StatusCode::FORBIDDEN);
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/nowhere"), &mut res, None)
        .unwrap();
    assert_eq!(out.body, "denied");

    let mut res = SimpleResponse::new();
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/private"), &mut res, None)
        .unwrap();
    assert_eq!(out.body, "denied");
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let mut res = SimpleResponse::new();
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/gone"), &mut res, None)
        .unwrap();
    assert_eq!(out.body, "it left");
    assert_eq!(out.route, None);
    assert_eq!(res.status(), StatusCode::GONE);

    let out = dispatcher
        .dispatch(&SimpleRequest::get("/teapot"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.body, "418 I'm a teapot");

    let err = dispatcher
        .render_error(StatusCode::BAD_GATEWAY, &SimpleRequest::get("/"), &mut SimpleResponse::new())
        .unwrap_err();
    assert!(matches!(err, RouterError::UnresolvedStatus(502)));
}

#[test]
fn handler_failures_surface() {
    #[derive(Debug, thiserror::Error)]
    #[error("database down")]
    struct DbDown;

    let mut router = Router::new();
    router
        .insert(RouteDefinition::new("/db").name("db").handler(HandlerRef::func(|_, _| {
            Err(HandlerError::other(DbDown))
        })))
        .insert(RouteDefinition::new("/misuse").name("misuse").handler(HandlerRef::func(
            |_, _| Err(HandlerError::BadUsage("no such thing".into())),
        )));
    let dispatcher = Dispatcher::new(router);

    let err = dispatcher
        .dispatch(&SimpleRequest::get("/db"), &mut SimpleResponse::new(), None)
        .unwrap_err();
    assert!(matches!(err, RouterError::Handler { ref route, .. } if route == "db"));
    assert!(!err.is_configuration());

    let err = dispatcher
        .dispatch(&SimpleRequest::get("/misuse"), &mut SimpleResponse::new(), None)
        .unwrap_err();
    assert!(matches!(err, RouterError::BadRouteUsage { ref message, .. } if message == "no such thing"));
}

fn registry() -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    handlers
        .register(
            "User",
            Controller::new().method(
                "show",
                ParamSchema::new().required("id").optional("tab", "profile"),
                |args, _| {
                    Ok(format!(
                        "user {} {}",
                        args.i64("id").unwrap_or(-1),
                        args.str("tab").unwrap_or("")
                    ))
                },
            ),
        )
        .register(
            "Page",
            Controller::new()
                .init(ParamSchema::new().optional("locked", false), |args, _| {
                    Ok(if args.value("locked") == Some(&Value::Bool(true)) {
                        Some("locked".to_owned())
                    } else {
                        None
                    })
                })
                .method(Controller::GET, ParamSchema::new(), |_, _| Ok("get".to_owned()))
                .method(Controller::POST, ParamSchema::new(), |_, _| Ok("post".to_owned()))
                .method(Controller::AJAX, ParamSchema::new(), |_, _| Ok("ajax".to_owned())),
        )
        .register(
            "Blog",
            Controller::new().method("list", ParamSchema::new(), |_, cx| {
                Ok(format!("blog list in {}", cx.locale()))
            }),
        )
        .register(
            "Event",
            Controller::new().method(
                "at",
                ParamSchema::new().datetime("when", true),
                |args, _| Ok(args.datetime("when").map(|d| d.to_string()).unwrap_or_default()),
            ),
        );
    handlers
}

#[test]
fn registry_targets() {
    let mut router = Router::new();
    router
        .insert("/user/{{C:<id>[0-9]+}} >>> User::show")
        .insert("/nouser >>> User::show")
        .insert("/page >>> Page")
        .insert("/event/{{C:<when>[0-9-]+}} >>> Event::at");
    let dispatcher = Dispatcher::new(router).with_handlers(registry());

    let body = |req: SimpleRequest| {
        dispatcher
            .dispatch(&req, &mut SimpleResponse::new(), None)
            .map(|out| out.body)
    };

    assert_eq!(body(SimpleRequest::get("/user/42")).unwrap(), "user 42 profile");
    assert_eq!(body(SimpleRequest::get("/page")).unwrap(), "get");
    assert_eq!(body(SimpleRequest::post_to("/page")).unwrap(), "post");
    assert_eq!(body(SimpleRequest::get("/page").xhr()).unwrap(), "ajax");
    assert_eq!(body(SimpleRequest::get("/event/2024-03-01")).unwrap(), "2024-03-01 00:00:00");

    let err = body(SimpleRequest::get("/nouser")).unwrap_err();
    assert!(matches!(err, RouterError::BadRouteUsage { .. }));

    // dynamic class and method tokens
    let mut router = Router::new();
    router.insert("/{{C:<section>[A-Za-z]+}}/{{C:<action>[a-z]+}} >>> <section>::<action>");
    let dispatcher = Dispatcher::new(router).with_handlers(registry());
    let out = dispatcher
        .dispatch(&SimpleRequest::get("/Blog/list"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.body, "blog list in ");

    let err = dispatcher
        .dispatch(&SimpleRequest::get("/Nope/list"), &mut SimpleResponse::new(), None)
        .unwrap_err();
    assert!(matches!(err, RouterError::BadRouteUsage { .. }));
}

#[test]
fn init_short_circuits() {
    let mut router = Router::new();
    router.insert(RouteDefinition::new("/locked").name("locked").arg("locked", true).handler("Page"));
    let dispatcher = Dispatcher::new(router).with_handlers(registry());

    let out = dispatcher
        .dispatch(&SimpleRequest::get("/locked"), &mut SimpleResponse::new(), None)
        .unwrap();
    assert_eq!(out.body, "locked");
}

#[test]
fn matched_event() {
    let mut router = Router::new();
    router.insert("/user/{{C:<id>[0-9]+}} >>> User::show");
    let recorder = Arc::new(Recorder::default());
    let dispatcher = Dispatcher::new(router)
        .with_handlers(registry())
        .with_events(recorder.clone());

    dispatcher
        .dispatch(&SimpleRequest::get("/user/5"), &mut SimpleResponse::new(), None)
        .unwrap();

    let events = recorder.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let (name, data) = &events[0];
    assert_eq!(name, Dispatcher::MATCHED);
    assert_eq!(data["route"], "user/{{C:<id>[0-9]+}}");
    assert_eq!(data["regex"], "^(?:/user/(?P<id>[0-9]+))$");
    assert_eq!(data["handler"], "User::show");
    assert_eq!(data["args"]["id"], "5");
}

#[test]
fn http_types_dispatch() {
    let mut router = Router::new();
    router.insert(
        RouteDefinition::new("/hello/{{C:<name>}}")
            .name("hello")
            .handler(HandlerRef::func(|args, _| Ok(format!("hello {}", args["name"].as_str().unwrap_or("")))))
    );
    let dispatcher = Dispatcher::new(router);

    let req = http::Request::get("/hello/world").body(()).unwrap();
    let mut res = http::Response::new(());
    let out = dispatcher.dispatch(&req, &mut res, None).unwrap();
    assert_eq!(out.body, "hello world");
    assert_eq!(res.status(), StatusCode::OK);
}
