//! Inbound generation request model.
//!
//! The outer dispatch framework delivers a job object whose `input`
//! mapping carries the fields below.  Absent fields take the documented
//! defaults; unknown fields are ignored.  The generation mode is never
//! accepted from the caller — it is derived from the presence of a
//! non-empty `image_url`.

use serde::Deserialize;

use crate::error::CoreError;

/// Negative prompt applied when the caller does not send one.
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "blurry, bad quality, camera shake, distortion, poor composition, low resolution, artifacts";

/// Positive prompt substituted for image-to-video jobs that omit one.
pub const DEFAULT_I2V_PROMPT: &str = "animate this image with smooth motion";

/// Which of the two supported graph topologies a request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    TextToVideo,
    ImageToVideo,
}

impl GenerationMode {
    /// Wire name used in the response's `generation_type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::TextToVideo => "text_to_video",
            GenerationMode::ImageToVideo => "image_to_video",
        }
    }
}

/// A validated generation request with defaults applied.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    /// Positive prompt. `None` when the caller omitted the field; the
    /// image-to-video builder substitutes [`DEFAULT_I2V_PROMPT`] then.
    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,

    /// Raw resolution string ("480p" | "720p" | "1080p"). Unrecognized
    /// values fall back to 720p at graph-build time.
    #[serde(default = "default_resolution")]
    pub resolution: String,

    #[serde(default = "default_num_frames")]
    pub num_frames: u32,

    /// -1 means "let the backend choose"; forwarded as-is.
    #[serde(default = "default_seed")]
    pub seed: i64,

    #[serde(default = "default_num_inference_steps")]
    pub num_inference_steps: u32,

    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,

    #[serde(default = "default_sample_shift")]
    pub sample_shift: u32,

    #[serde(default = "default_motion_strength")]
    pub motion_strength: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Source image for image-to-video. Presence of a non-empty value
    /// is what classifies the request as image-to-video.
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_negative_prompt() -> String {
    DEFAULT_NEGATIVE_PROMPT.to_string()
}

fn default_resolution() -> String {
    "720p".to_string()
}

fn default_num_frames() -> u32 {
    90
}

fn default_seed() -> i64 {
    -1
}

fn default_num_inference_steps() -> u32 {
    30
}

fn default_guidance_scale() -> f64 {
    4.0
}

fn default_sample_shift() -> u32 {
    8
}

fn default_motion_strength() -> u32 {
    7
}

fn default_fps() -> u32 {
    24
}

impl GenerationRequest {
    /// Parse the `input` mapping of an inbound job object.
    pub fn from_input(input: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(input)
            .map_err(|e| CoreError::Validation(format!("invalid generation input: {e}")))
    }

    /// Derive the generation mode from `image_url` presence.
    ///
    /// A non-empty `image_url` always means image-to-video; absent or
    /// empty always means text-to-video.
    pub fn mode(&self) -> GenerationMode {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => GenerationMode::ImageToVideo,
            _ => GenerationMode::TextToVideo,
        }
    }

    /// Positive prompt to encode, with the per-mode default applied.
    pub fn positive_prompt(&self) -> String {
        match self.mode() {
            GenerationMode::TextToVideo => self.prompt.clone().unwrap_or_default(),
            GenerationMode::ImageToVideo => self
                .prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_I2V_PROMPT.to_string()),
        }
    }
}
