//! The handler contract between the server and application code.

use std::future::Future;

use async_trait::async_trait;

use super::request::Request;
use super::response::ResponseWriter;
use super::scope::RequestScope;

/// A request handler.
///
/// Handlers receive the per-request [`RequestScope`], the parsed [`Request`],
/// and the response sink. They do not return a value and they do not
/// propagate errors to the server; failure is expressed by writing an
/// appropriate status and body to the sink. Handlers doing long-running work
/// are expected to await `scope.cancelled()` so shutdown can proceed; the
/// server never terminates a handler forcibly.
#[async_trait]
pub trait ContextHandler: Send + Sync {
    async fn handle(&self, scope: RequestScope, req: Request, w: &mut ResponseWriter);
}

/// Bound satisfied by the futures closure-style handlers return.
pub trait HandlerFuture: Future<Output = ResponseWriter> + Send + 'static {}

impl<T> HandlerFuture for T where T: Future<Output = ResponseWriter> + Send + 'static {}

/// Adapt a closure into a [`ContextHandler`].
///
/// The closure takes the sink by value and returns it, which keeps closure
/// registration free of higher-ranked lifetime bounds:
///
/// ```ignore
/// router.handle(Method::GET, "/ping", handler_fn(|_scope, _req, mut w| async move {
///     w.write(b"pong");
///     w
/// }))?;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(RequestScope, Request, ResponseWriter) -> Fut + Send + Sync,
    Fut: HandlerFuture,
{
    HandlerFn(f)
}

/// See [`handler_fn`].
pub struct HandlerFn<F>(F);

#[async_trait]
impl<F, Fut> ContextHandler for HandlerFn<F>
where
    F: Fn(RequestScope, Request, ResponseWriter) -> Fut + Send + Sync,
    Fut: HandlerFuture,
{
    async fn handle(&self, scope: RequestScope, req: Request, w: &mut ResponseWriter) {
        let sink = std::mem::take(w);
        *w = (self.0)(scope, req, sink).await;
    }
}
