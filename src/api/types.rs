//! Shared state and wire types of the HTTP API.

use crate::config::ConversionConfig;
use crate::jobs::{JobStatus, JobStore};
use crate::pipeline::caption::Captioner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default upload limit: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConversionConfig>,
    /// One captioner for the whole process, so the vision provider is
    /// resolved at most once.
    pub captioner: Arc<dyn Captioner>,
    pub jobs: JobStore,
}

impl AppState {
    pub fn new(config: ConversionConfig, captioner: Arc<dyn Captioner>, jobs: JobStore) -> Self {
        Self {
            config: Arc::new(config),
            captioner,
            jobs,
        }
    }
}

/// Listener and middleware settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    /// SQLite URL of the job table, e.g. `sqlite:lecture-a11y.db`.
    pub database_url: String,
    /// Comma-separated allowed origins; `None` or empty allows any origin.
    pub cors_origins: Option<String>,
    pub max_upload_bytes: usize,
    /// Resolve the vision provider before accepting requests.
    pub eager_model: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite:lecture-a11y.db".to_string(),
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            eager_model: false,
        }
    }
}

/// `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// `GET /status/:file_id`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub file_id: String,
    pub status: JobStatus,
    pub path: Option<String>,
}
