pub mod types;
pub mod preprocess;
pub mod vision_types;
pub mod vision_ocr;
pub mod ocr;

pub use types::*;
pub use preprocess::*;
pub use vision_ocr::*;
pub use ocr::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Vision API is not reachable at {0}")]
    VisionConnection(String),

    #[error("Vision API returned error (status {status}): {body}")]
    VisionStatus { status: u16, body: String },

    #[error("Vision API Error: {0}")]
    VisionApi(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
