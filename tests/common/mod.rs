//! Shared utilities for the integration suites.

use http::Method;
use webhost::config::ServerConfig;
use webhost::router::Router;
use webhost::server::Server;

/// The demo-style route table: a literal index route and the two-parameter
/// greeting route.
pub fn sample_router() -> Router {
    let mut router = Router::new();
    router
        .handle_fn(Method::GET, "/", |_scope, _req, mut w| async move {
            w.write(b"index");
            w
        })
        .unwrap();
    router
        .handle_fn(
            Method::GET,
            "/:hellostring/:name",
            |scope, _req, mut w| async move {
                let greeting = scope.param("hellostring").unwrap_or_default().to_string();
                let name = scope.param("name").unwrap_or_default().to_string();
                w.write(format!("{greeting} {name}!").as_bytes());
                w
            },
        )
        .unwrap();
    router
}

pub fn server_with(router: Router) -> Server {
    Server::new(router, ServerConfig::default())
}

/// Client that never proxies and never reuses pooled connections, so each
/// request exercises a fresh accept.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
