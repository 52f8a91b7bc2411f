//! HTTP boundary helpers.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → middleware/access_log.rs (start timer, capture request line)
//!     → catch_panic (handler panic → 500)
//!     → caller's handler chain
//!     → access log line written to the sink
//!     → response to client
//! ```

pub mod basic_auth;
pub mod middleware;

pub use basic_auth::basic_auth_user;
pub use middleware::{access_log_handler, AccessLog};
