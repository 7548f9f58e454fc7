//! Embeddable HTTP backend for WebView-hosted applications.
//!
//! A [`Router`](router::Router) maps methods and path patterns with named
//! `:segments` to handlers; a [`Server`](server::Server) owns the listener,
//! dispatches each request with a per-request [`RequestScope`]
//! (parameters, server info, shared cancellation signal), and shuts down
//! gracefully within a bounded grace period. The host runtime embeds it
//! behind its create/destroy hooks: `start` once, `stop` once.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use lifecycle::Shutdown;
pub use router::{MatchError, Params, RouteError, Router};
pub use server::{
    handler_fn, ContextHandler, Request, RequestScope, ResponseWriter, Server, ServerInfo,
};
