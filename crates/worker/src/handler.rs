//! Top-level request handler.
//!
//! Runs the full sequence for one job — provision weights, ensure the
//! backend, classify the mode, build the workflow, run it — and
//! normalizes the outcome into the response contract: a full success
//! object or a uniform `{error}` object.  No error escapes this
//! boundary.

use serde_json::Value;
use wangen_comfyui::provision;
use wangen_comfyui::runner::{run_job, RunnerError};
use wangen_comfyui::server::BackendError;
use wangen_comfyui::workflow::build_workflow;
use wangen_core::error::CoreError;
use wangen_core::request::GenerationRequest;
use wangen_core::response::{ErrorResponse, GenerationResponse, ResponseSettings};

use crate::state::AppContext;

/// Fatal failures on the request path.
///
/// Transparent wrappers: the response carries the underlying message
/// unchanged (a timeout surfaces as exactly "Generation timeout").
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Handle one job object from the dispatch framework.
pub async fn handle(ctx: &AppContext, job: &Value) -> Value {
    match run_request(ctx, job).await {
        Ok(response) => serde_json::to_value(&response).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize success response");
            serde_json::json!({ "error": format!("response serialization failed: {e}") })
        }),
        Err(e) => {
            tracing::error!(error = %e, "Generation request failed");
            serde_json::to_value(ErrorResponse {
                error: e.to_string(),
            })
            .unwrap_or_else(|_| serde_json::json!({ "error": "internal error" }))
        }
    }
}

/// The fallible request pipeline behind [`handle`].
async fn run_request(
    ctx: &AppContext,
    job: &Value,
) -> Result<GenerationResponse, HandlerError> {
    let input = job
        .get("input")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    let request = GenerationRequest::from_input(input)?;

    // Best-effort: a failed weight download is logged here and will
    // fail the job at submission time if the backend misses the file.
    let report = provision::ensure_models(&ctx.http, &ctx.config.comfyui_dir).await;
    if report.failed > 0 {
        tracing::warn!(
            failed = report.failed,
            "Some model downloads failed; generation may fail at submission",
        );
    }
    tracing::debug!(
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        "Model provisioning pass complete",
    );

    let backend = ctx.ensure_backend().await?;
    tracing::debug!(pid = ?backend.pid(), "Backend ready");

    let mode = request.mode();
    tracing::info!(mode = mode.as_str(), "Processing generation request");

    let workflow = build_workflow(mode, &request);
    let video = run_job(&ctx.api, &ctx.config.runner_config(), &workflow).await?;

    Ok(GenerationResponse {
        status: "success",
        message: format!("Wan 2.2 {} generation completed", mode.as_str()),
        video_base64: video.video_base64,
        filename: video.filename,
        generation_type: mode.as_str(),
        prompt: request.prompt.clone().unwrap_or_default(),
        settings: ResponseSettings {
            resolution: request.resolution.clone(),
            frames: request.num_frames,
            guidance_scale: request.guidance_scale,
            steps: request.num_inference_steps,
            motion_strength: request.motion_strength,
        },
    })
}
