//! ComfyUI backend subprocess supervision.
//!
//! Spawns the ComfyUI server as a child process and polls its
//! `/system_stats` endpoint until it answers or the attempt budget is
//! exhausted.  The returned [`BackendHandle`] owns the child for the
//! remainder of the host process lifetime: it is started at most once,
//! reused by every subsequent request, and never torn down or
//! health-checked again.  If the server dies after becoming ready,
//! later job submissions fail with a connection error instead.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::api::ComfyUIApi;

/// Launch and readiness-poll parameters for the backend process.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Python interpreter used to launch the server.
    pub python_bin: String,
    /// ComfyUI checkout; `main.py` is expected directly inside.
    pub comfyui_dir: PathBuf,
    /// Interface passed to `--listen`.
    pub listen_host: String,
    pub port: u16,
    /// Readiness poll attempts before giving up.
    pub startup_attempts: u32,
    /// Delay between readiness polls.
    pub startup_poll_interval: Duration,
}

/// A running ComfyUI server owned for the host-process lifetime.
#[derive(Debug)]
pub struct BackendHandle {
    child: Child,
}

impl BackendHandle {
    /// OS process ID, if the child is still tracked by the runtime.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Errors from backend startup.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to spawn ComfyUI process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ComfyUI server failed to become ready after {attempts} attempts")]
    StartupTimeout { attempts: u32 },
}

/// Spawn the backend and poll until it is ready.
///
/// The first successful `/system_stats` response marks the server
/// ready.  On [`BackendError::StartupTimeout`] the spawned process is
/// left to the OS and no handle is returned, so the next request that
/// finds no cached handle will attempt a fresh startup.
pub async fn start_backend(
    config: &BackendConfig,
    api: &ComfyUIApi,
) -> Result<BackendHandle, BackendError> {
    tracing::info!(
        dir = %config.comfyui_dir.display(),
        listen = %config.listen_host,
        port = config.port,
        "Starting ComfyUI server",
    );

    let child = Command::new(&config.python_bin)
        .arg("main.py")
        .args(["--listen", &config.listen_host])
        .arg("--port")
        .arg(config.port.to_string())
        .arg("--force-fp16")
        .current_dir(&config.comfyui_dir)
        .spawn()?;

    let pid = child.id();

    for attempt in 1..=config.startup_attempts {
        match api.system_stats().await {
            Ok(_) => {
                tracing::info!(attempt, pid = ?pid, "ComfyUI server is ready");
                return Ok(BackendHandle { child });
            }
            Err(e) => {
                tracing::debug!(attempt, error = %e, "ComfyUI server not ready yet");
            }
        }
        tokio::time::sleep(config.startup_poll_interval).await;
    }

    tracing::error!(
        attempts = config.startup_attempts,
        pid = ?pid,
        "ComfyUI server failed to become ready",
    );
    Err(BackendError::StartupTimeout {
        attempts: config.startup_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn startup_times_out_when_health_endpoint_never_answers() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackendConfig {
            // `true` exits immediately; the probe target is a closed port.
            python_bin: "true".to_string(),
            comfyui_dir: dir.path().to_path_buf(),
            listen_host: "127.0.0.1".to_string(),
            port: 1,
            startup_attempts: 2,
            startup_poll_interval: Duration::from_millis(10),
        };
        let api = ComfyUIApi::new("http://127.0.0.1:9".to_string());

        let result = start_backend(&config, &api).await;
        assert_matches!(result, Err(BackendError::StartupTimeout { attempts: 2 }));
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackendConfig {
            python_bin: "/nonexistent/python-binary".to_string(),
            comfyui_dir: dir.path().to_path_buf(),
            listen_host: "127.0.0.1".to_string(),
            port: 1,
            startup_attempts: 1,
            startup_poll_interval: Duration::from_millis(10),
        };
        let api = ComfyUIApi::new("http://127.0.0.1:9".to_string());

        let result = start_backend(&config, &api).await;
        assert_matches!(result, Err(BackendError::Spawn(_)));
    }
}
