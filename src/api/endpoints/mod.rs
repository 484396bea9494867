//! API endpoint handlers, one module per resource.

pub mod analyze;
pub mod export;
pub mod health;
pub mod records;
pub mod stats;
pub mod upload;
