//! Job submission and completion polling.
//!
//! Submits a built workflow to the backend queue, then polls the
//! history endpoint at a fixed interval until the output artifact
//! appears or the wall-clock timeout elapses.  Polling is strictly
//! sequential per request; transient request errors are swallowed and
//! the loop continues.  A backend that is permanently down therefore
//! manifests as a timeout, not a distinct error.

use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::time::Instant;

use crate::api::JobQueue;
use crate::workflow::Workflow;

/// Poll cadence and artifact location for one job run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Delay between history polls.
    pub poll_interval: Duration,
    /// Wall-clock bound on the whole poll loop.
    pub timeout: Duration,
    /// Directory where the backend writes generated artifacts.
    pub output_dir: PathBuf,
}

impl RunnerConfig {
    /// Upper bound on history polls within the timeout window.
    pub fn max_attempts(&self) -> u32 {
        let interval_ms = self.poll_interval.as_millis().max(1);
        (self.timeout.as_millis() / interval_ms) as u32
    }
}

/// A completed generation, encoded for transport.
#[derive(Debug)]
pub struct GeneratedVideo {
    /// Base64-encoded video bytes.
    pub video_base64: String,
    /// Filename as advertised by the backend.
    pub filename: String,
}

/// Errors from running a job against the backend queue.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The enqueue request failed; surfaced immediately, never retried.
    #[error("Failed to submit workflow: {0}")]
    Submit(String),

    /// The job did not produce an artifact within the timeout bound.
    #[error("Generation timeout")]
    Timeout,

    /// The advertised artifact exists but could not be read.
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: String,
        source: std::io::Error,
    },
}

/// Submit `workflow` and poll until the generated video is on disk.
pub async fn run_job<Q: JobQueue + ?Sized>(
    queue: &Q,
    config: &RunnerConfig,
    workflow: &Workflow,
) -> Result<GeneratedVideo, RunnerError> {
    let client_id = uuid::Uuid::new_v4().to_string();

    let submitted = queue
        .submit(workflow, &client_id)
        .await
        .map_err(|e| RunnerError::Submit(e.to_string()))?;
    let prompt_id = submitted.prompt_id;

    tracing::info!(
        prompt_id = %prompt_id,
        queue_position = submitted.number,
        "Workflow queued",
    );

    let deadline = Instant::now() + config.timeout;

    while Instant::now() < deadline {
        match queue.history(&prompt_id).await {
            Ok(history) => {
                if let Some(filename) = find_video_output(&history, &prompt_id) {
                    let path = config.output_dir.join(filename);
                    match tokio::fs::read(&path).await {
                        Ok(bytes) => {
                            tracing::info!(
                                prompt_id = %prompt_id,
                                filename,
                                size = bytes.len(),
                                "Generation complete",
                            );
                            return Ok(GeneratedVideo {
                                video_base64: BASE64.encode(&bytes),
                                filename: filename.to_string(),
                            });
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                            // The backend reports the output before the
                            // file is visible at the expected path.
                            // Keep polling until it appears or the
                            // timeout fires.
                            tracing::warn!(
                                prompt_id = %prompt_id,
                                path = %path.display(),
                                "Output reported but artifact not on disk yet",
                            );
                        }
                        Err(source) => {
                            return Err(RunnerError::ArtifactRead {
                                path: path.display().to_string(),
                                source,
                            });
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!(
                    prompt_id = %prompt_id,
                    error = %e,
                    "Transient history poll error",
                );
            }
        }

        tokio::time::sleep(config.poll_interval).await;
    }

    tracing::error!(
        prompt_id = %prompt_id,
        timeout_secs = config.timeout.as_secs(),
        "Generation timed out",
    );
    Err(RunnerError::Timeout)
}

/// Locate the generated video's filename in a history payload.
///
/// Scans the per-node outputs of `history[prompt_id]` for the first
/// node advertising a non-empty `gifs` array and returns its first
/// entry's `filename`.
pub fn find_video_output<'a>(history: &'a serde_json::Value, prompt_id: &str) -> Option<&'a str> {
    let outputs = history.get(prompt_id)?.get("outputs")?.as_object()?;

    for output in outputs.values() {
        if let Some(first) = output
            .get("gifs")
            .and_then(serde_json::Value::as_array)
            .and_then(|gifs| gifs.first())
        {
            if let Some(filename) = first.get("filename").and_then(serde_json::Value::as_str) {
                return Some(filename);
            }
        }
    }

    None
}
