//! The lifecycle server: listener ownership, dispatch, graceful shutdown.
//!
//! # Responsibilities
//! - Bind the listener and run the accept loop on background tasks
//! - Dispatch each request through the router with a per-request scope
//! - Coordinate bounded, cooperative shutdown
//!
//! # Design Decisions
//! - Single-use state machine: Idle → Starting → Running → Stopping →
//!   Stopped, with no way back; restarting means constructing a new server
//! - `start` only binds; serving happens on spawned tasks so the host's
//!   lifecycle hook returns immediately
//! - `stop` flips the shared cancellation signal, lets the accept loop
//!   release the listener, then waits for in-flight handlers up to the
//!   grace period; expiry is a logged degradation, never an error
//! - A panicking handler produces a 500 and is still removed from the
//!   in-flight set, so a drain can never wedge on it

use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::request::{ReadError, Request};
use super::response::ResponseWriter;
use super::scope::{RequestScope, ServerInfo};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::lifecycle::Shutdown;
use crate::router::{MatchError, Router};

enum Lifecycle {
    Idle,
    Starting,
    Running(Running),
    Stopping,
    Stopped,
}

struct Running {
    shutdown: Shutdown,
    accept_task: JoinHandle<()>,
}

/// Everything the dispatch path needs, shared across connection tasks.
struct DispatchContext {
    router: Arc<Router>,
    info: Arc<ServerInfo>,
    shutdown: Shutdown,
    max_body_bytes: usize,
}

/// An embeddable HTTP server wired to a [`Router`].
///
/// The router is taken by value at construction, so the route table is
/// complete before `start` can be called and stays read-only while the
/// server runs. A host embeds this behind its create/destroy lifecycle
/// hooks: `start` once, `stop` once.
pub struct Server {
    router: Arc<Router>,
    config: ServerConfig,
    state: Mutex<Lifecycle>,
}

impl Server {
    pub fn new(router: Router, config: ServerConfig) -> Self {
        Self {
            router: Arc::new(router),
            config,
            state: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Bind the configured address and begin accepting connections on a
    /// background task.
    ///
    /// Returns the root URL (scheme + host + assigned port, no trailing
    /// slash) as soon as the listener is bound. Fails with
    /// [`ServerError::BindFailed`] if the bind fails, leaving the server
    /// idle, and with [`ServerError::AlreadyStarted`] on any reuse.
    pub async fn start(&self) -> Result<String, ServerError> {
        {
            let mut state = self.state.lock();
            match *state {
                Lifecycle::Idle => *state = Lifecycle::Starting,
                _ => return Err(ServerError::AlreadyStarted),
            }
        }

        let bind_failed = |source: std::io::Error| ServerError::BindFailed {
            addr: self.config.bind_address.clone(),
            source,
        };

        let listener = match TcpListener::bind(&self.config.bind_address).await {
            Ok(listener) => listener,
            Err(source) => {
                *self.state.lock() = Lifecycle::Idle;
                return Err(bind_failed(source));
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(source) => {
                *self.state.lock() = Lifecycle::Idle;
                return Err(bind_failed(source));
            }
        };

        let info = Arc::new(ServerInfo {
            root_url: format!("http://{local_addr}"),
            local_addr,
        });
        let shutdown = Shutdown::new();
        let ctx = Arc::new(DispatchContext {
            router: Arc::clone(&self.router),
            info: Arc::clone(&info),
            shutdown: shutdown.clone(),
            max_body_bytes: self.config.max_body_bytes,
        });
        let accept_task = tokio::spawn(accept_loop(listener, ctx));

        info!(address = %local_addr, routes = self.router.len(), "server listening");

        *self.state.lock() = Lifecycle::Running(Running {
            shutdown,
            accept_task,
        });
        Ok(info.root_url.clone())
    }

    /// Gracefully shut the server down.
    ///
    /// Signals cancellation to every in-flight and future handler, stops
    /// accepting connections and releases the listener, then waits up to
    /// `grace` for in-flight handlers to finish. If the grace period
    /// expires the remaining handlers are left to run out on their own;
    /// shutdown still completes so the host's teardown is never blocked
    /// past the bound.
    ///
    /// Returns [`ServerError::NotStarted`] if the server never started;
    /// stopping an already-stopped server is a no-op.
    pub async fn stop(&self, grace: Duration) -> Result<(), ServerError> {
        let running = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, Lifecycle::Stopping) {
                Lifecycle::Running(running) => running,
                other @ (Lifecycle::Idle | Lifecycle::Starting) => {
                    *state = other;
                    return Err(ServerError::NotStarted);
                }
                other => {
                    // Already stopping or stopped.
                    *state = other;
                    return Ok(());
                }
            }
        };

        info!(grace_ms = grace.as_millis() as u64, "stopping server");
        running.shutdown.trigger();

        // The accept loop observes the signal and exits, dropping the
        // listener. Join it so the port is provably released before the
        // drain wait begins.
        if let Err(error) = running.accept_task.await {
            error!(%error, "accept loop task failed");
        }

        if !running.shutdown.drain(grace).await {
            warn!(
                in_flight = running.shutdown.in_flight(),
                "grace period expired with handlers still in flight"
            );
        }

        *self.state.lock() = Lifecycle::Stopped;
        info!("server stopped");
        Ok(())
    }
}

async fn accept_loop(listener: TcpListener, ctx: Arc<DispatchContext>) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(serve_connection(stream, peer, ctx));
                }
                Err(error) => {
                    warn!(%error, "accept failed");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            },
        }
    }
    debug!("accept loop exited, listener released");
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, ctx: Arc<DispatchContext>) {
    let io = TokioIo::new(stream);
    let service = service_fn({
        let ctx = Arc::clone(&ctx);
        move |req| dispatch(Arc::clone(&ctx), req)
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(error) = result {
                debug!(%peer, %error, "connection closed with error");
            }
        }
        _ = ctx.shutdown.cancelled() => {
            // Let an in-progress exchange finish, but take no new requests
            // on this connection.
            conn.as_mut().graceful_shutdown();
            if let Err(error) = conn.as_mut().await {
                debug!(%peer, %error, "connection closed during shutdown");
            }
        }
    }
}

async fn dispatch(
    ctx: Arc<DispatchContext>,
    req: hyper::Request<Incoming>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = tracing::info_span!("request", %request_id, %method, path = %path);

    async move {
        let matched = match ctx.router.lookup(&method, &path) {
            Ok(matched) => matched,
            Err(MatchError::NotFound) => {
                debug!("no route matched");
                return Ok(plain_response(StatusCode::NOT_FOUND, "404 page not found\n"));
            }
            Err(MatchError::MethodNotAllowed) => {
                debug!("path registered under a different method");
                return Ok(plain_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "method not allowed\n",
                ));
            }
        };

        let request = match Request::read(req, ctx.max_body_bytes).await {
            Ok(request) => request,
            Err(error @ ReadError::TooLarge { .. }) => {
                warn!(%error, "rejecting request");
                return Ok(plain_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "request body too large\n",
                ));
            }
            Err(error) => {
                warn!(%error, "failed to read request");
                return Ok(plain_response(StatusCode::BAD_REQUEST, "bad request\n"));
            }
        };

        let scope = RequestScope::new(
            matched.params,
            Arc::clone(&ctx.info),
            ctx.shutdown.token(),
        );
        let handler = matched.handler;
        let invocation = ctx.shutdown.track(async move {
            let mut writer = ResponseWriter::new();
            handler.handle(scope, request, &mut writer).await;
            writer
        });

        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(writer) => {
                debug!(status = %writer.status(), "request handled");
                Ok(writer.into_response())
            }
            Err(_) => {
                error!("handler panicked");
                Ok(plain_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error\n",
                ))
            }
        }
    }
    .instrument(span)
    .await
}

fn plain_response(status: StatusCode, body: &str) -> hyper::Response<Full<Bytes>> {
    let mut res = hyper::Response::new(Full::new(Bytes::from(body.to_string())));
    *res.status_mut() = status;
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}
