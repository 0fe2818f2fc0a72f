//! HTTP forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → server.rs (request ID, trace, timeout)
//!     → forward_handler (rewrite URI onto upstream base_url)
//!     → ObserveLayer → Timeout → hyper client → upstream backend
//!     → response (or 502/504) back to the client
//! ```

pub mod server;

pub use server::{upstream_client, HttpServer, UpstreamClient};
