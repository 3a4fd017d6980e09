//! Shared application context.
//!
//! Replaces ambient globals with one explicit context object owned by
//! the binary and borrowed by the request handler.  The backend handle
//! lives in a [`tokio::sync::OnceCell`] so that two requests arriving
//! before the backend exists cannot both spawn it: the first
//! initializer wins and the loser awaits its result.  A failed startup
//! leaves the cell empty, so the next request retries from scratch.

use tokio::sync::OnceCell;
use wangen_comfyui::api::ComfyUIApi;
use wangen_comfyui::server::{start_backend, BackendError, BackendHandle};

use crate::config::WorkerConfig;

/// Everything a request needs, created once at startup.
pub struct AppContext {
    pub config: WorkerConfig,
    /// Shared HTTP client: model downloads and the API client pool
    /// connections through it.
    pub http: reqwest::Client,
    pub api: ComfyUIApi,
    backend: OnceCell<BackendHandle>,
}

impl AppContext {
    pub fn new(config: WorkerConfig) -> Self {
        let http = reqwest::Client::new();
        let api = ComfyUIApi::with_client(http.clone(), config.api_url());
        Self {
            config,
            http,
            api,
            backend: OnceCell::new(),
        }
    }

    /// Start the backend on first use; reuse the cached handle after.
    ///
    /// The handle is never re-health-checked: a backend that dies after
    /// becoming ready surfaces as a submission failure on the next job.
    pub async fn ensure_backend(&self) -> Result<&BackendHandle, BackendError> {
        self.backend
            .get_or_try_init(|| async {
                let config = self.config.backend_config();
                start_backend(&config, &self.api).await
            })
            .await
    }
}
