//! Illustrative HTTP surface, feature-gated behind `server`. The framing
//! here is demonstrative, not a hardened public API gateway.

pub mod actix_server;
pub mod responses;

pub use actix_server::{start_server, AppState};
pub use responses::{ApiResponse, ErrorResponse};
