//! Integration tests for the request-handler boundary.
//!
//! Verifies that failures are normalized into the uniform `{error}`
//! response shape.  Paths that would reach the network (provisioning,
//! backend startup) are exercised in the `wangen-comfyui` unit tests
//! against mocks; here we cover the boundary conversion itself.

use std::path::PathBuf;

use serde_json::json;
use wangen_comfyui::runner::RunnerError;
use wangen_core::response::ErrorResponse;
use wangen_worker::config::WorkerConfig;
use wangen_worker::handler::{self, HandlerError};
use wangen_worker::state::AppContext;

fn test_context() -> (AppContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::new(WorkerConfig {
        comfyui_dir: dir.path().to_path_buf(),
        python_bin: "true".to_string(),
        listen_host: "127.0.0.1".to_string(),
        api_host: "127.0.0.1".to_string(),
        port: 1,
        poll_interval_secs: 1,
        generation_timeout_secs: 1,
        startup_attempts: 1,
        startup_poll_secs: 1,
    });
    (ctx, dir)
}

/// Malformed `input` fields fail validation before any I/O and come
/// back as the uniform error object.
#[tokio::test]
async fn malformed_input_yields_error_response() {
    let (ctx, _dir) = test_context();
    let job = json!({ "input": { "num_frames": "ninety" } });

    let response = handler::handle(&ctx, &job).await;

    let error = response["error"]
        .as_str()
        .expect("response should carry an error message");
    assert!(error.contains("Validation failed"));
    assert!(response.get("video_base64").is_none());
}

/// A non-object `input` is rejected the same way.
#[tokio::test]
async fn non_object_input_yields_error_response() {
    let (ctx, _dir) = test_context();
    let job = json!({ "input": [1, 2, 3] });

    let response = handler::handle(&ctx, &job).await;
    assert!(response.get("error").is_some());
}

/// A generation timeout surfaces to the caller as exactly
/// `{"error": "Generation timeout"}`.
#[test]
fn timeout_error_keeps_its_exact_message() {
    let err = HandlerError::from(RunnerError::Timeout);
    let value = serde_json::to_value(ErrorResponse {
        error: err.to_string(),
    })
    .unwrap();
    assert_eq!(value, json!({ "error": "Generation timeout" }));
}

/// The worker's derived paths follow the ComfyUI layout.
#[test]
fn derived_paths_follow_comfyui_layout() {
    let config = WorkerConfig {
        comfyui_dir: PathBuf::from("/workspace/ComfyUI"),
        python_bin: "python".to_string(),
        listen_host: "0.0.0.0".to_string(),
        api_host: "127.0.0.1".to_string(),
        port: 8188,
        poll_interval_secs: 5,
        generation_timeout_secs: 600,
        startup_attempts: 30,
        startup_poll_secs: 2,
    };
    assert_eq!(config.api_url(), "http://127.0.0.1:8188");
    assert_eq!(
        config.runner_config().output_dir,
        PathBuf::from("/workspace/ComfyUI/output")
    );
}
