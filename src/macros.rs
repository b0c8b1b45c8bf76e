/// Builds a `Vec<RouteEntry>`.
///
/// ```
/// use nuclear_dispatch::{routes, Router};
///
/// let mut router = Router::new();
/// router.insert_all(routes! {
///     GET "/" => "Home::index",
///     POST "/login" => "Auth::login",
///     @ "admin" => routes! {
///         ANY "/users" => "Admin::users"
///     }
/// });
/// assert!(router.route("/@GET").is_some());
/// assert!(router.route("login@POST").is_some());
/// assert!(router.route("admin/users").is_some());
/// ```
#[macro_export]
macro_rules! routes {
    {@entry @, $name:expr, $children:expr} => {
        $crate::RouteEntry::from($crate::RouteGroup::new($name).routes($children))
    };
    {@entry ANY, $pattern:expr, $handler:expr} => {
        $crate::RouteEntry::from($crate::RouteDefinition::new($pattern).handler($handler))
    };
    {@entry $method:ident, $pattern:expr, $handler:expr} => {
        $crate::RouteEntry::from(
            $crate::RouteDefinition::new($pattern)
                .method($crate::Method::$method)
                .handler($handler),
        )
    };

    {$($method:tt $pattern:expr => $handler:expr),* $(,)?} => {{
        let mut __routes: ::std::vec::Vec<$crate::RouteEntry> = ::std::vec::Vec::new();
        $(__routes.push($crate::routes!(@entry $method, $pattern, $handler));)*
        __routes
    }};
}
