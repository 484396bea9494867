//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::api::error::ApiError;
use crate::pipeline::processor::DocumentProcessor;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub processor: Arc<DocumentProcessor>,
}

impl ApiContext {
    pub fn new(processor: Arc<DocumentProcessor>) -> Self {
        Self { processor }
    }

    /// Run blocking pipeline or store work on a dedicated thread.
    pub async fn run_blocking<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&DocumentProcessor) -> T + Send + 'static,
        T: Send + 'static,
    {
        let processor = Arc::clone(&self.processor);
        Ok(tokio::task::spawn_blocking(move || work(&processor)).await?)
    }
}
