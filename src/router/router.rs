//! Route table registration and lookup.
//!
//! # Responsibilities
//! - Register method + pattern → handler bindings
//! - Look up the matching route for a request and extract parameters
//! - Distinguish "no such path" from "path exists under another method"
//!
//! # Design Decisions
//! - Registration happens before the server starts; the table is read-only
//!   on the match path, so lookups take no locks
//! - Registration order is the tie-break for overlapping patterns
//! - A failed registration leaves the existing table untouched

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use thiserror::Error;

use super::pattern::Pattern;
use crate::server::handler::{handler_fn, ContextHandler, HandlerFuture};
use crate::server::request::Request;
use crate::server::response::ResponseWriter;
use crate::server::scope::RequestScope;

/// Registration-time error. Fatal to startup; caught before the server runs.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },
}

/// Per-request lookup failure, surfaced as an HTTP status by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No registered pattern matches the path.
    #[error("no route matches the path")]
    NotFound,
    /// Some pattern matches the path, but under a different method.
    #[error("route exists under a different method")]
    MethodNotAllowed,
}

/// Parameter bindings extracted from a matched path. Keys are unique;
/// iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.0.insert(name, value);
    }
}

/// A successful lookup: the handler to invoke and the extracted bindings.
/// Produced per request and discarded after the handler returns.
pub struct RouteMatch {
    pub handler: Arc<dyn ContextHandler>,
    pub params: Params,
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

struct Route {
    method: Method,
    pattern: Pattern,
    handler: Arc<dyn ContextHandler>,
}

/// Maps an HTTP method and a path pattern to a handler.
///
/// Patterns are segments separated by `/`; a segment prefixed with `:`
/// captures the concrete value under that name, every other segment must
/// match literally. All registration must finish before the router is handed
/// to the server; `Server::new` takes the router by value, which is what
/// enforces it.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` + `pattern`.
    ///
    /// Fails with [`RouteError::InvalidPattern`] for malformed patterns and
    /// with [`RouteError::DuplicateRoute`] if the same method + pattern text
    /// was already registered. The existing table is unaffected by a failure.
    pub fn handle<H>(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: ContextHandler + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern.raw() == pattern.raw())
        {
            return Err(RouteError::DuplicateRoute {
                method,
                pattern: pattern.raw().to_string(),
            });
        }
        tracing::debug!(%method, pattern = pattern.raw(), "route registered");
        self.routes.push(Route {
            method,
            pattern,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Register a closure-style handler. The closure receives the response
    /// writer by value and returns it once the response is written.
    pub fn handle_fn<F, Fut>(&mut self, method: Method, pattern: &str, f: F) -> Result<(), RouteError>
    where
        F: Fn(RequestScope, Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: HandlerFuture,
    {
        self.handle(method, pattern, handler_fn(f))
    }

    /// Find the first route matching `method` + `path`, in registration order.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<RouteMatch, MatchError> {
        let Some(segments) = Pattern::split_path(path) else {
            return Err(MatchError::NotFound);
        };

        let mut other_method = false;
        for route in &self.routes {
            if route.method == *method {
                if let Some(params) = route.pattern.capture(&segments) {
                    return Ok(RouteMatch {
                        handler: Arc::clone(&route.handler),
                        params,
                    });
                }
            } else if !other_method && route.pattern.matches(&segments) {
                other_method = true;
            }
        }

        Err(if other_method {
            MatchError::MethodNotAllowed
        } else {
            MatchError::NotFound
        })
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Handlers are irrelevant to lookup behavior; tag each route's responses
    // so tests can tell which one matched.
    fn tagged(tag: &'static str) -> impl ContextHandler + 'static {
        handler_fn(move |_scope, _req, mut w: ResponseWriter| async move {
            w.write(tag.as_bytes());
            w
        })
    }

    fn router_with(routes: &[(Method, &str)]) -> Router {
        let mut router = Router::new();
        for (method, pattern) in routes {
            router.handle(method.clone(), pattern, tagged("x")).unwrap();
        }
        router
    }

    #[test]
    fn test_literal_match_has_empty_params() {
        let router = router_with(&[(Method::GET, "/about/team")]);
        let m = router.lookup(&Method::GET, "/about/team").unwrap();
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_named_segments_bind_values() {
        let router = router_with(&[(Method::GET, "/:hellostring/:name")]);
        let m = router.lookup(&Method::GET, "/Namaste/Alice").unwrap();
        assert_eq!(m.params.get("hellostring"), Some("Namaste"));
        assert_eq!(m.params.get("name"), Some("Alice"));
    }

    #[test]
    fn test_segment_count_mismatch_is_not_found() {
        let router = router_with(&[(Method::GET, "/:a/:b")]);
        assert_eq!(
            router.lookup(&Method::GET, "/only-one").unwrap_err(),
            MatchError::NotFound
        );
        assert_eq!(
            router.lookup(&Method::GET, "/a/b/c").unwrap_err(),
            MatchError::NotFound
        );
    }

    #[test]
    fn test_method_not_allowed_is_distinct_from_not_found() {
        let router = router_with(&[(Method::GET, "/things/:id")]);
        assert_eq!(
            router.lookup(&Method::POST, "/things/42").unwrap_err(),
            MatchError::MethodNotAllowed
        );
        assert_eq!(
            router.lookup(&Method::POST, "/nothing/here/at/all").unwrap_err(),
            MatchError::NotFound
        );
    }

    #[test]
    fn test_duplicate_registration_fails_and_preserves_table() {
        let mut router = Router::new();
        router.handle(Method::GET, "/dup", tagged("first")).unwrap();
        let err = router.handle(Method::GET, "/dup", tagged("second")).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));
        assert_eq!(router.len(), 1);
        // Prior route still matches.
        assert!(router.lookup(&Method::GET, "/dup").is_ok());
        // Same pattern under another method is not a duplicate.
        router.handle(Method::POST, "/dup", tagged("post")).unwrap();
    }

    #[test]
    fn test_registration_order_breaks_literal_vs_param_ties() {
        let mut router = Router::new();
        router
            .handle_fn(Method::GET, "/greet/world", |_s, _r, mut w: ResponseWriter| async move {
                w.write(b"literal");
                w
            })
            .unwrap();
        router
            .handle_fn(Method::GET, "/greet/:name", |_s, _r, mut w: ResponseWriter| async move {
                w.write(b"param");
                w
            })
            .unwrap();

        // The literal route registered first shadows the parameter route for
        // its exact path; everything else falls through to the parameter.
        let exact = router.lookup(&Method::GET, "/greet/world").unwrap();
        assert!(exact.params.is_empty());
        let general = router.lookup(&Method::GET, "/greet/bob").unwrap();
        assert_eq!(general.params.get("name"), Some("bob"));
    }

    #[test]
    fn test_trailing_slash_requires_explicit_registration() {
        let router = router_with(&[(Method::GET, "/foo")]);
        assert_eq!(
            router.lookup(&Method::GET, "/foo/").unwrap_err(),
            MatchError::NotFound
        );

        let both = router_with(&[(Method::GET, "/foo"), (Method::GET, "/foo/")]);
        assert!(both.lookup(&Method::GET, "/foo").is_ok());
        assert!(both.lookup(&Method::GET, "/foo/").is_ok());
    }

    #[test]
    fn test_double_slash_paths_never_match() {
        let router = router_with(&[(Method::GET, "/a/:b")]);
        assert_eq!(
            router.lookup(&Method::GET, "/a//").unwrap_err(),
            MatchError::NotFound
        );
    }

    #[test]
    fn test_root_route() {
        let router = router_with(&[(Method::GET, "/")]);
        assert!(router.lookup(&Method::GET, "/").is_ok());
        assert_eq!(
            router.lookup(&Method::GET, "/anything").unwrap_err(),
            MatchError::NotFound
        );
    }
}
