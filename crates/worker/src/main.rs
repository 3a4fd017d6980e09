//! `wangen-worker` — Wan 2.2 video-generation worker.
//!
//! Reads one JSON job object per line from stdin and writes one JSON
//! response per line to stdout.  The external dispatch framework owns
//! delivery and resubmission; this process handles jobs strictly one
//! at a time.
//!
//! # Environment variables
//!
//! See [`wangen_worker::config::WorkerConfig::from_env`] for the full
//! table of variables and defaults.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wangen_worker::config::WorkerConfig;
use wangen_worker::handler;
use wangen_worker::state::AppContext;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wangen_worker=info,wangen_comfyui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(
        comfyui_dir = %config.comfyui_dir.display(),
        api_url = %config.api_url(),
        "Worker starting",
    );

    let ctx = AppContext::new(config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read job stream");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(job) => handler::handle(&ctx, &job).await,
            Err(e) => serde_json::json!({ "error": format!("invalid job payload: {e}") }),
        };

        let mut out = response.to_string();
        out.push('\n');
        if let Err(e) = stdout.write_all(out.as_bytes()).await {
            tracing::error!(error = %e, "Failed to write response");
            break;
        }
        if let Err(e) = stdout.flush().await {
            tracing::error!(error = %e, "Failed to flush response");
            break;
        }
    }

    tracing::info!("Job stream closed, worker exiting");
}
