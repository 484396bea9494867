//! HTTP API.
//!
//! Routes live under `/api/`; an optional static directory is served for
//! everything else. Handlers hand pipeline and store work to the blocking
//! pool through `ApiContext::run_blocking`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve, ServerError};
pub use types::ApiContext;
