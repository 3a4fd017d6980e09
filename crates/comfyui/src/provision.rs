//! Model weight provisioning.
//!
//! Ensures the Wan 2.2 weight files exist under the ComfyUI model
//! directories before the first generation.  Presence of the
//! destination file is the only completeness check: there is no
//! checksum and no temp-file rename, so an interrupted write leaves a
//! partial file that passes the existence check on the next pass.
//! A failed download never aborts the pass — the job will instead fail
//! at submission time when the backend cannot find the weight.

use std::path::Path;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use wangen_core::progress::download_progress_percent;

/// Log a progress line every time the download advances this much.
const PROGRESS_LOG_STEP_PCT: f64 = 5.0;

/// Model directory category under the ComfyUI root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCategory {
    Diffusion,
    Vae,
    TextEncoder,
}

impl ModelCategory {
    /// Directory relative to the ComfyUI root where this category of
    /// weights is expected.
    pub fn subdir(self) -> &'static str {
        match self {
            ModelCategory::Diffusion => "models/diffusion_models",
            ModelCategory::Vae => "models/vae",
            ModelCategory::TextEncoder => "models/text_encoders",
        }
    }
}

/// One required weight file: where it comes from and where it lands.
pub struct ModelAsset {
    pub filename: &'static str,
    pub url: &'static str,
    pub category: ModelCategory,
}

/// All weight files required by the two generation modes.
pub const MODEL_ASSETS: &[ModelAsset] = &[
    ModelAsset {
        filename: "wan2.2_t2v_high_noise_14B_fp8_scaled.safetensors",
        url: "https://huggingface.co/NSFW-API/NSFW_Wan_14b/resolve/main/wan2.2_t2v_high_noise_14B_fp8_scaled.safetensors",
        category: ModelCategory::Diffusion,
    },
    ModelAsset {
        filename: "wan2.2_t2v_low_noise_14B_fp8_scaled.safetensors",
        url: "https://huggingface.co/NSFW-API/NSFW_Wan_14b/resolve/main/wan2.2_t2v_low_noise_14B_fp8_scaled.safetensors",
        category: ModelCategory::Diffusion,
    },
    ModelAsset {
        filename: "wan2.2_i2v_high_noise_14B_fp16.safetensors",
        url: "https://huggingface.co/Wan-AI/Wan2.2-I2V-A14B/resolve/main/wan2.2_i2v_high_noise_14B_fp16.safetensors",
        category: ModelCategory::Diffusion,
    },
    ModelAsset {
        filename: "wan2.2_i2v_low_noise_14B_fp16.safetensors",
        url: "https://huggingface.co/Wan-AI/Wan2.2-I2V-A14B/resolve/main/wan2.2_i2v_low_noise_14B_fp16.safetensors",
        category: ModelCategory::Diffusion,
    },
    ModelAsset {
        filename: "wan_2.1_vae.safetensors",
        url: "https://huggingface.co/Kijai/WanVideo_comfy_fp8_scaled/resolve/main/vae/wan_2.1_vae.safetensors",
        category: ModelCategory::Vae,
    },
    ModelAsset {
        filename: "umt5_xxl_fp8_e4m3fn_scaled.safetensors",
        url: "https://huggingface.co/Kijai/WanVideo_comfy_fp8_scaled/resolve/main/text_encoders/umt5_xxl_fp8_e4m3fn_scaled.safetensors",
        category: ModelCategory::TextEncoder,
    },
];

/// Outcome of one provisioning pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Errors from a single asset download.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Ensure all required model weights exist under `comfyui_dir`.
pub async fn ensure_models(client: &reqwest::Client, comfyui_dir: &Path) -> ProvisionReport {
    ensure_assets(client, comfyui_dir, MODEL_ASSETS).await
}

/// Ensure each asset in `assets` exists, downloading the missing ones.
///
/// Best-effort: failures are logged and counted, and the pass always
/// visits every asset.
pub async fn ensure_assets(
    client: &reqwest::Client,
    comfyui_dir: &Path,
    assets: &[ModelAsset],
) -> ProvisionReport {
    let mut report = ProvisionReport::default();

    for asset in assets {
        let dest = comfyui_dir.join(asset.category.subdir()).join(asset.filename);

        if dest.exists() {
            tracing::debug!(file = asset.filename, "Model weight already present");
            report.skipped += 1;
            continue;
        }

        tracing::info!(file = asset.filename, url = asset.url, "Downloading model weight");
        match download_asset(client, asset.url, &dest).await {
            Ok(()) => {
                tracing::info!(file = asset.filename, "Model weight downloaded");
                report.downloaded += 1;
            }
            Err(e) => {
                tracing::error!(
                    file = asset.filename,
                    error = %e,
                    "Model download failed, continuing with remaining assets",
                );
                report.failed += 1;
            }
        }
    }

    report
}

/// Stream one file from `url` to `dest`, creating parent directories.
async fn download_asset(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), ProvisionError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ProvisionError::Io {
                path: parent.display().to_string(),
                source,
            })?;
    }

    let response = client.get(url).send().await?.error_for_status()?;
    let total = response.content_length();

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|source| ProvisionError::Io {
            path: dest.display().to_string(),
            source,
        })?;

    let mut downloaded: u64 = 0;
    let mut last_logged_pct = 0.0_f64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|source| ProvisionError::Io {
                path: dest.display().to_string(),
                source,
            })?;
        downloaded += chunk.len() as u64;

        if let Some(pct) = download_progress_percent(downloaded, total) {
            if pct >= last_logged_pct + PROGRESS_LOG_STEP_PCT {
                tracing::debug!(
                    file = %dest.display(),
                    percent = pct,
                    downloaded,
                    total = total.unwrap_or(0),
                    "Download progress",
                );
                last_logged_pct = pct;
            }
        }
    }

    file.flush().await.map_err(|source| ProvisionError::Io {
        path: dest.display().to_string(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(filename: &'static str, url: &'static str) -> ModelAsset {
        ModelAsset {
            filename,
            url,
            category: ModelCategory::Diffusion,
        }
    }

    #[tokio::test]
    async fn provisioning_is_idempotent_when_all_assets_present() {
        let dir = tempfile::tempdir().unwrap();
        let assets = [
            asset("a.safetensors", "http://127.0.0.1:9/a"),
            asset("b.safetensors", "http://127.0.0.1:9/b"),
        ];
        for a in &assets {
            let dest = dir.path().join(a.category.subdir()).join(a.filename);
            std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
            std::fs::write(&dest, b"weights").unwrap();
        }

        let client = reqwest::Client::new();
        let report = ensure_assets(&client, dir.path(), &assets).await;
        assert_eq!(
            report,
            ProvisionReport {
                downloaded: 0,
                skipped: 2,
                failed: 0,
            }
        );

        // Second pass sees the same state.
        let report = ensure_assets(&client, dir.path(), &assets).await;
        assert_eq!(report.skipped, 2);
        assert_eq!(report.downloaded, 0);
    }

    #[tokio::test]
    async fn failed_download_does_not_abort_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        // Port 9 (discard) is not listening; connection is refused fast.
        let assets = [
            asset("missing.safetensors", "http://127.0.0.1:9/missing"),
            asset("present.safetensors", "http://127.0.0.1:9/present"),
        ];
        let present = dir
            .path()
            .join(assets[1].category.subdir())
            .join(assets[1].filename);
        std::fs::create_dir_all(present.parent().unwrap()).unwrap();
        std::fs::write(&present, b"weights").unwrap();

        let client = reqwest::Client::new();
        let report = ensure_assets(&client, dir.path(), &assets).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.downloaded, 0);
    }

    #[test]
    fn category_subdirs_match_the_comfyui_layout() {
        assert_eq!(ModelCategory::Diffusion.subdir(), "models/diffusion_models");
        assert_eq!(ModelCategory::Vae.subdir(), "models/vae");
        assert_eq!(ModelCategory::TextEncoder.subdir(), "models/text_encoders");
    }

    #[test]
    fn asset_table_covers_both_modes_and_shared_weights() {
        assert_eq!(MODEL_ASSETS.len(), 6);
        let diffusion = MODEL_ASSETS
            .iter()
            .filter(|a| a.category == ModelCategory::Diffusion)
            .count();
        assert_eq!(diffusion, 4);
        assert!(MODEL_ASSETS
            .iter()
            .any(|a| a.category == ModelCategory::Vae));
        assert!(MODEL_ASSETS
            .iter()
            .any(|a| a.category == ModelCategory::TextEncoder));
    }
}
