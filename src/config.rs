use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "ocrvault";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request body limit (10 MB), applied to single and batch uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_BIND: &str = "0.0.0.0:5002";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY is not set; the service cannot reach the OCR or analysis APIs")]
    MissingApiKey,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "ocrvault_lib=info,ocrvault=info,tower_http=info"
}

/// Get the application data directory.
/// Platform data dir + `ocrvault/`, or `./data` when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_api_key: String,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub http_timeout_secs: u64,
    pub gemini_model: String,
    pub vision_endpoint: String,
    pub gemini_endpoint: String,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map (useful for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let google_api_key = get("GOOGLE_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let data_dir = get("OCRVAULT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);
        let db_path = get("OCRVAULT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("ocr_records.db"));
        let upload_dir = get("OCRVAULT_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("uploads"));
        let static_dir = get("OCRVAULT_STATIC_DIR").map(PathBuf::from);

        let bind_raw = get("OCRVAULT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                var: "OCRVAULT_BIND",
                value: bind_raw.clone(),
            })?;

        let max_upload_bytes = parse_number(
            get("OCRVAULT_MAX_UPLOAD_BYTES"),
            "OCRVAULT_MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        let http_timeout_secs = parse_number(
            get("OCRVAULT_HTTP_TIMEOUT_SECS"),
            "OCRVAULT_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;

        Ok(Self {
            google_api_key,
            data_dir,
            db_path,
            upload_dir,
            static_dir,
            bind_addr,
            max_upload_bytes,
            http_timeout_secs,
            gemini_model: get("OCRVAULT_GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            vision_endpoint: get("OCRVAULT_VISION_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),
            gemini_endpoint: get("OCRVAULT_GEMINI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
        })
    }

    /// Key prefix safe for startup logs.
    pub fn redacted_api_key(&self) -> String {
        let prefix: String = self.google_api_key.chars().take(4).collect();
        format!("{prefix}…")
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_api_key_fails_fast() {
        let err = AppConfig::from_vars(&vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let err = AppConfig::from_vars(&vars(&[("GOOGLE_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn defaults_applied() {
        let cfg = AppConfig::from_vars(&vars(&[
            ("GOOGLE_API_KEY", "abc123"),
            ("OCRVAULT_DATA_DIR", "/tmp/ocrvault-test"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 5002);
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/ocrvault-test/ocr_records.db"));
        assert_eq!(cfg.upload_dir, PathBuf::from("/tmp/ocrvault-test/uploads"));
        assert_eq!(cfg.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(cfg.static_dir.is_none());
    }

    #[test]
    fn overrides_applied() {
        let cfg = AppConfig::from_vars(&vars(&[
            ("GOOGLE_API_KEY", "abc123"),
            ("OCRVAULT_BIND", "127.0.0.1:8080"),
            ("OCRVAULT_MAX_UPLOAD_BYTES", "2048"),
            ("OCRVAULT_GEMINI_MODEL", "gemini-1.5-pro"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.max_upload_bytes, 2048);
        assert_eq!(cfg.gemini_model, "gemini-1.5-pro");
    }

    #[test]
    fn invalid_bind_rejected() {
        let err = AppConfig::from_vars(&vars(&[
            ("GOOGLE_API_KEY", "abc123"),
            ("OCRVAULT_BIND", "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "OCRVAULT_BIND", .. }));
    }

    #[test]
    fn redacted_key_hides_secret() {
        let cfg = AppConfig::from_vars(&vars(&[("GOOGLE_API_KEY", "AIzaSecretValue")])).unwrap();
        let shown = cfg.redacted_api_key();
        assert!(shown.starts_with("AIza"));
        assert!(!shown.contains("Secret"));
    }
}
