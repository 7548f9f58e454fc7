//! Server lifecycle error taxonomy.
//!
//! Registration errors live with the router ([`crate::router::RouteError`])
//! and per-request match failures are HTTP statuses, not errors. What is
//! left are the lifecycle-surface failures reported synchronously to the
//! host: a failed bind and the two misuse cases.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound. Reported to the caller of `start`;
    /// not retried automatically.
    #[error("failed to bind {addr}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a server that is not idle. A server instance
    /// is single-use; construct a fresh one to restart.
    #[error("server already started")]
    AlreadyStarted,

    /// `stop` was called on a server that never started.
    #[error("server not started")]
    NotStarted,
}
