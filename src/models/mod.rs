pub mod enums;
pub mod record;

pub use record::*;
