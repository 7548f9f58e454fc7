//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → router lookup (404/405 short-circuit without a scope)
//!     → request.rs (read method/path/headers/body off the wire)
//!     → scope.rs (params + server info + cancellation signal)
//!     → handler.rs (application code writes into the response sink)
//!     → response.rs (sink converted to the wire response)
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod scope;
pub mod server;

pub use handler::{handler_fn, ContextHandler};
pub use request::Request;
pub use response::ResponseWriter;
pub use scope::{RequestScope, ServerInfo};
pub use server::Server;
