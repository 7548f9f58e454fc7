//! Lifecycle coordination subsystem.
//!
//! # Data Flow
//! ```text
//! Server::start():
//!     Bind listener → create Shutdown → spawn accept loop → Running
//!
//! Server::stop(grace):
//!     Shutdown::trigger() → accept loop exits, listener released
//!     → drain(grace): wait for in-flight handlers or the deadline
//!     → Stopped
//! ```
//!
//! # Design Decisions
//! - One shared cancellation signal for every in-flight and future request
//! - Handlers cooperate by awaiting the signal; nothing is preempted
//! - The drain wait is bounded: expiry is logged, never an error, so the
//!   host's teardown always makes progress

pub mod shutdown;

pub use shutdown::Shutdown;
