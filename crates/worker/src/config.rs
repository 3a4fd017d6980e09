//! Worker configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use wangen_comfyui::runner::RunnerConfig;
use wangen_comfyui::server::BackendConfig;

/// Worker configuration loaded from environment variables.
///
/// All fields have defaults matching the standard ComfyUI deployment
/// layout. Override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// ComfyUI checkout root; models and outputs live beneath it.
    pub comfyui_dir: PathBuf,
    /// Python interpreter used to launch the backend.
    pub python_bin: String,
    /// Interface the backend listens on.
    pub listen_host: String,
    /// Host used by this worker to reach the backend API.
    pub api_host: String,
    pub port: u16,
    pub poll_interval_secs: u64,
    pub generation_timeout_secs: u64,
    pub startup_attempts: u32,
    pub startup_poll_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default               |
    /// |---------------------------|-----------------------|
    /// | `COMFYUI_DIR`             | `/workspace/ComfyUI`  |
    /// | `PYTHON_BIN`              | `python`              |
    /// | `COMFYUI_LISTEN_HOST`     | `0.0.0.0`             |
    /// | `COMFYUI_API_HOST`        | `127.0.0.1`           |
    /// | `COMFYUI_PORT`            | `8188`                |
    /// | `POLL_INTERVAL_SECS`      | `5`                   |
    /// | `GENERATION_TIMEOUT_SECS` | `600`                 |
    /// | `STARTUP_ATTEMPTS`        | `30`                  |
    /// | `STARTUP_POLL_SECS`       | `2`                   |
    pub fn from_env() -> Self {
        let comfyui_dir = PathBuf::from(
            std::env::var("COMFYUI_DIR").unwrap_or_else(|_| "/workspace/ComfyUI".into()),
        );
        let python_bin = std::env::var("PYTHON_BIN").unwrap_or_else(|_| "python".into());
        let listen_host =
            std::env::var("COMFYUI_LISTEN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let api_host = std::env::var("COMFYUI_API_HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("COMFYUI_PORT")
            .unwrap_or_else(|_| "8188".into())
            .parse()
            .expect("COMFYUI_PORT must be a valid u16");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("GENERATION_TIMEOUT_SECS must be a valid u64");

        let startup_attempts: u32 = std::env::var("STARTUP_ATTEMPTS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("STARTUP_ATTEMPTS must be a valid u32");

        let startup_poll_secs: u64 = std::env::var("STARTUP_POLL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("STARTUP_POLL_SECS must be a valid u64");

        Self {
            comfyui_dir,
            python_bin,
            listen_host,
            api_host,
            port,
            poll_interval_secs,
            generation_timeout_secs,
            startup_attempts,
            startup_poll_secs,
        }
    }

    /// Base HTTP URL for the backend API.
    pub fn api_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.port)
    }

    /// Directory where the backend writes generated artifacts.
    pub fn output_dir(&self) -> PathBuf {
        self.comfyui_dir.join("output")
    }

    /// Launch parameters for the backend supervisor.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            python_bin: self.python_bin.clone(),
            comfyui_dir: self.comfyui_dir.clone(),
            listen_host: self.listen_host.clone(),
            port: self.port,
            startup_attempts: self.startup_attempts,
            startup_poll_interval: Duration::from_secs(self.startup_poll_secs),
        }
    }

    /// Poll parameters for the job runner.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.generation_timeout_secs),
            output_dir: self.output_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorkerConfig {
        WorkerConfig {
            comfyui_dir: PathBuf::from("/workspace/ComfyUI"),
            python_bin: "python".to_string(),
            listen_host: "0.0.0.0".to_string(),
            api_host: "127.0.0.1".to_string(),
            port: 8188,
            poll_interval_secs: 5,
            generation_timeout_secs: 600,
            startup_attempts: 30,
            startup_poll_secs: 2,
        }
    }

    #[test]
    fn api_url_uses_api_host_not_listen_host() {
        assert_eq!(config().api_url(), "http://127.0.0.1:8188");
    }

    #[test]
    fn output_dir_is_under_the_comfyui_root() {
        assert_eq!(
            config().output_dir(),
            PathBuf::from("/workspace/ComfyUI/output")
        );
    }

    #[test]
    fn runner_config_carries_the_poll_budget() {
        let runner = config().runner_config();
        assert_eq!(runner.poll_interval, Duration::from_secs(5));
        assert_eq!(runner.timeout, Duration::from_secs(600));
        assert_eq!(runner.max_attempts(), 120);
    }
}
