pub mod types;
pub mod prompt;
pub mod parser;
pub mod fallback;
pub mod gemini;
pub mod analyzer;

pub use types::*;
pub use parser::*;
pub use fallback::*;
pub use gemini::*;
pub use analyzer::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Gemini API is not reachable at {0}")]
    Connection(String),

    #[error("Gemini API returned error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Text too short for analysis")]
    InputTooShort,
}
