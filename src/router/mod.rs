//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before the server starts):
//!     Router::handle(method, "/users/:id", handler)
//!     → pattern.rs (parse into literal/parameter segments, validate)
//!     → Append to route table
//!
//! Per request:
//!     Router::lookup(method, path)
//!     → Split path on '/'
//!     → Walk table in registration order, segment-by-segment compare
//!     → Return: RouteMatch {handler, params} or NotFound / MethodNotAllowed
//! ```
//!
//! # Design Decisions
//! - Route table is append-only during registration, immutable at runtime
//! - First match wins; ambiguous literal/parameter overlap is resolved by
//!   registration order, so specific routes go before general ones
//! - Trailing slashes are distinct paths; no normalization
//! - A parameter segment never matches across a '/' boundary

pub mod pattern;
pub mod router;

pub use pattern::{Pattern, Segment};
pub use router::{MatchError, Params, RouteError, RouteMatch, Router};
