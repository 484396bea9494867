pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::db::{DatabaseError, RecordStore};
use crate::pipeline::extraction::{
    ExtractionError, GoogleVisionClient, ImagePreprocessor, RecognitionClient,
};
use crate::pipeline::processor::DocumentProcessor;
use crate::pipeline::structuring::{GeminiClient, SemanticAnalyzer, StructuringError};

/// Anything that stops the service before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record store unavailable: {0}")]
    Database(#[from] DatabaseError),

    #[error("Recognition client setup failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Analysis client setup failed: {0}")]
    Structuring(#[from] StructuringError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Wire every service object from configuration.
pub fn build_processor(config: &AppConfig) -> Result<DocumentProcessor, StartupError> {
    std::fs::create_dir_all(&config.upload_dir)?;
    let store = RecordStore::open(&config.db_path)?;

    let vision = GoogleVisionClient::new(
        &config.vision_endpoint,
        &config.google_api_key,
        config.http_timeout_secs,
    )?;
    let gemini = GeminiClient::new(
        &config.gemini_endpoint,
        &config.google_api_key,
        &config.gemini_model,
        config.http_timeout_secs,
    )?;

    Ok(DocumentProcessor::new(
        ImagePreprocessor::default(),
        RecognitionClient::new(Arc::new(vision)),
        SemanticAnalyzer::new(Arc::new(gemini)),
        store,
        config.upload_dir.clone(),
    ))
}

pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::info!(
        api_key = %config.redacted_api_key(),
        db = %config.db_path.display(),
        uploads = %config.upload_dir.display(),
        model = %config.gemini_model,
        "Configuration loaded"
    );

    let processor = Arc::new(build_processor(&config)?);
    let app = api::api_router(
        api::ApiContext::new(processor),
        config.max_upload_bytes,
        config.static_dir.as_deref(),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(app, config.bind_addr))?;
    Ok(())
}
