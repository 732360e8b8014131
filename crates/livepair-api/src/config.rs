//! API configuration.
//!
//! Built once in `main` and passed explicitly through `AppState`; nothing
//! reads configuration from the environment after startup.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// The single origin allowed to call the API cross-origin
    pub cors_origin: String,
    /// Directory for request-scoped scratch files
    pub upload_dir: PathBuf,
    /// Combined upload ceiling, enforced before processing begins
    pub max_upload_bytes: usize,
    /// How long a finished deliverable stays on disk for download
    pub retention: Duration,
    /// Wall-clock limit for a remux invocation
    pub remux_timeout: Duration,
    /// Wall-clock limit for a still-image conversion
    pub convert_timeout: Duration,
    /// Wall-clock limit for a metadata injection
    pub inject_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            cors_origin: "http://localhost:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 4 * 1024 * 1024 * 1024, // 4 GiB
            retention: Duration::from_secs(300),
            remux_timeout: Duration::from_secs(300),
            convert_timeout: Duration::from_secs(60),
            inject_timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            retention: duration_env("RETENTION_SECS", defaults.retention),
            remux_timeout: duration_env("REMUX_TIMEOUT_SECS", defaults.remux_timeout),
            convert_timeout: duration_env("CONVERT_TIMEOUT_SECS", defaults.convert_timeout),
            inject_timeout: duration_env("INJECT_TIMEOUT_SECS", defaults.inject_timeout),
        }
    }
}

fn duration_env(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
