//! Per-request scope handed to handlers.
//!
//! # Design Decisions
//! - Strongly typed: named accessors instead of stringly-keyed context
//!   lookups, so a missing value is visible in the signature, not a runtime
//!   surprise
//! - The scope lives for one handler invocation and never outlives it
//! - Handler-specific state belongs on the handler struct itself; the scope
//!   only carries what the server knows (match bindings, server info, the
//!   shutdown signal)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::router::Params;

/// Server-scoped configuration visible to every handler.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Root URL of the running server, no trailing slash
    /// (e.g. `http://127.0.0.1:54321`).
    pub root_url: String,
    /// The address the listener actually bound, with the assigned port.
    pub local_addr: SocketAddr,
}

/// Everything a handler may need from the server for one request:
/// the matched path parameters, the server info, and the shared
/// cancellation signal.
#[derive(Debug, Clone)]
pub struct RequestScope {
    params: Params,
    server: Arc<ServerInfo>,
    cancel: CancellationToken,
}

impl RequestScope {
    pub(crate) fn new(params: Params, server: Arc<ServerInfo>, cancel: CancellationToken) -> Self {
        Self {
            params,
            server,
            cancel,
        }
    }

    /// Value bound to a named pattern segment, if the matched route had one.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// All parameter bindings for the matched route.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn server(&self) -> &ServerInfo {
        &self.server
    }

    /// Whether shutdown has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when shutdown is signalled. Long-running handlers should
    /// select on this against their own work.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
