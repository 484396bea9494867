//! Repository layer: record-scoped database operations.
//!
//! Functions take a borrowed `Connection`; connection lifetime is the
//! caller's concern (see `RecordStore`).

mod record;

pub use record::*;
