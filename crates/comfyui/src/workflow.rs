//! Typed ComfyUI workflow (job graph) builder.
//!
//! ComfyUI accepts a workflow as a JSON mapping of node ID to
//! `{"class_type": "<kind>", "inputs": {...}}`.  This module models the
//! node set as a tagged enum so wiring mistakes fail at compile time,
//! while serializing to exactly that wire shape.  Two fixed topologies
//! are supported: a 7-node text-to-video graph and an 8-node
//! image-to-video graph that adds an image-fetch node and swaps the
//! empty latent for an image-to-latent node.

use std::collections::BTreeMap;

use serde::Serialize;
use wangen_core::request::{GenerationMode, GenerationRequest};
use wangen_core::resolution::Resolution;

/// Sampling algorithm used by every sampler node (not user-configurable).
pub const SAMPLER_NAME: &str = "dpmpp_2m";
/// Scheduler used by every sampler node (not user-configurable).
pub const SCHEDULER_NAME: &str = "karras";

/// Shared VAE weight file.
pub const VAE_FILENAME: &str = "wan_2.1_vae.safetensors";
/// Shared text encoder weight file.
pub const TEXT_ENCODER_FILENAME: &str = "umt5_xxl_fp8_e4m3fn_scaled.safetensors";

/// High/low-noise checkpoint pair for one generation mode.
pub struct ModeCheckpoints {
    pub high_noise: &'static str,
    pub low_noise: &'static str,
}

/// Text-to-video checkpoints (fp8 scaled).
pub const T2V_CHECKPOINTS: ModeCheckpoints = ModeCheckpoints {
    high_noise: "wan2.2_t2v_high_noise_14B_fp8_scaled.safetensors",
    low_noise: "wan2.2_t2v_low_noise_14B_fp8_scaled.safetensors",
};

/// Image-to-video checkpoints (fp16).
pub const I2V_CHECKPOINTS: ModeCheckpoints = ModeCheckpoints {
    high_noise: "wan2.2_i2v_high_noise_14B_fp16.safetensors",
    low_noise: "wan2.2_i2v_low_noise_14B_fp16.safetensors",
};

/// Reference to another node's output, serialized as
/// `["<node_id>", <output_index>]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRef(pub &'static str, pub u32);

/// One node of a generation workflow.
///
/// Serializes to `{"class_type": "<wire name>", "inputs": {...}}` via
/// adjacent tagging, matching the ComfyUI prompt format byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "class_type", content = "inputs")]
pub enum WorkflowNode {
    #[serde(rename = "Wan2CheckpointLoader")]
    CheckpointLoader {
        ckpt_name_high_noise: String,
        ckpt_name_low_noise: String,
        vae_name: String,
    },

    #[serde(rename = "Wan2TextEncode")]
    TextEncode {
        text: String,
        text_encoder_name: String,
    },

    #[serde(rename = "Wan2EmptyLatentVideo")]
    EmptyLatentVideo {
        width: u32,
        height: u32,
        frames: u32,
        batch_size: u32,
    },

    #[serde(rename = "LoadImageFromURL")]
    LoadImageFromUrl { url: String },

    #[serde(rename = "Wan2ImageToVideo")]
    ImageToVideo {
        image: NodeRef,
        width: u32,
        height: u32,
        frames: u32,
        batch_size: u32,
    },

    #[serde(rename = "Wan2Sampler")]
    Sampler {
        model: NodeRef,
        positive: NodeRef,
        negative: NodeRef,
        latent_image: NodeRef,
        seed: i64,
        steps: u32,
        cfg: f64,
        sampler_name: String,
        scheduler: String,
        sample_shift: u32,
        motion_strength: u32,
    },

    #[serde(rename = "Wan2VAEDecode")]
    VaeDecode { samples: NodeRef, vae: NodeRef },

    #[serde(rename = "Wan2SaveVideo")]
    SaveVideo {
        images: NodeRef,
        filename_prefix: String,
        fps: u32,
        save_image: bool,
        pingpong: bool,
        save_output: bool,
    },
}

/// A complete workflow: node ID → node, ordered by ID.
pub type Workflow = BTreeMap<String, WorkflowNode>;

/// Build the workflow for a classified request.
///
/// Pure and deterministic: identical inputs produce structurally
/// identical graphs.
pub fn build_workflow(mode: GenerationMode, request: &GenerationRequest) -> Workflow {
    match mode {
        GenerationMode::TextToVideo => build_text_to_video(request),
        GenerationMode::ImageToVideo => build_image_to_video(request),
    }
}

/// Resolve the request's resolution string to pixel dimensions.
///
/// Unrecognized strings fall back to 720p. The fallback is intentional
/// leniency carried over from the existing behavior; it is logged so it
/// never happens invisibly.
fn resolve_dimensions(raw: &str) -> (u32, u32) {
    match Resolution::parse(raw) {
        Some(res) => res.dimensions(),
        None => {
            tracing::warn!(
                resolution = raw,
                "Unrecognized resolution string, falling back to 720p",
            );
            Resolution::FALLBACK.dimensions()
        }
    }
}

/// 7-node text-to-video graph:
/// loader → positive/negative encode → empty latent → sampler → decode → save.
fn build_text_to_video(request: &GenerationRequest) -> Workflow {
    let (width, height) = resolve_dimensions(&request.resolution);
    let mut nodes = Workflow::new();

    nodes.insert(
        "1".to_string(),
        WorkflowNode::CheckpointLoader {
            ckpt_name_high_noise: T2V_CHECKPOINTS.high_noise.to_string(),
            ckpt_name_low_noise: T2V_CHECKPOINTS.low_noise.to_string(),
            vae_name: VAE_FILENAME.to_string(),
        },
    );
    nodes.insert(
        "2".to_string(),
        WorkflowNode::TextEncode {
            text: request.positive_prompt(),
            text_encoder_name: TEXT_ENCODER_FILENAME.to_string(),
        },
    );
    nodes.insert(
        "3".to_string(),
        WorkflowNode::TextEncode {
            text: request.negative_prompt.clone(),
            text_encoder_name: TEXT_ENCODER_FILENAME.to_string(),
        },
    );
    nodes.insert(
        "4".to_string(),
        WorkflowNode::EmptyLatentVideo {
            width,
            height,
            frames: request.num_frames,
            batch_size: 1,
        },
    );
    nodes.insert(
        "5".to_string(),
        sampler_node(request, NodeRef("2", 0), NodeRef("3", 0), NodeRef("4", 0)),
    );
    nodes.insert(
        "6".to_string(),
        WorkflowNode::VaeDecode {
            samples: NodeRef("5", 0),
            vae: NodeRef("1", 2),
        },
    );
    nodes.insert(
        "7".to_string(),
        save_node(request, NodeRef("6", 0), "wan2_t2v_output"),
    );

    nodes
}

/// 8-node image-to-video graph: an image-fetch node feeds an
/// image-to-latent node in place of the empty latent allocation.
fn build_image_to_video(request: &GenerationRequest) -> Workflow {
    let (width, height) = resolve_dimensions(&request.resolution);
    let mut nodes = Workflow::new();

    nodes.insert(
        "1".to_string(),
        WorkflowNode::CheckpointLoader {
            ckpt_name_high_noise: I2V_CHECKPOINTS.high_noise.to_string(),
            ckpt_name_low_noise: I2V_CHECKPOINTS.low_noise.to_string(),
            vae_name: VAE_FILENAME.to_string(),
        },
    );
    nodes.insert(
        "2".to_string(),
        WorkflowNode::LoadImageFromUrl {
            url: request.image_url.clone().unwrap_or_default(),
        },
    );
    nodes.insert(
        "3".to_string(),
        WorkflowNode::TextEncode {
            text: request.positive_prompt(),
            text_encoder_name: TEXT_ENCODER_FILENAME.to_string(),
        },
    );
    nodes.insert(
        "4".to_string(),
        WorkflowNode::TextEncode {
            text: request.negative_prompt.clone(),
            text_encoder_name: TEXT_ENCODER_FILENAME.to_string(),
        },
    );
    nodes.insert(
        "5".to_string(),
        WorkflowNode::ImageToVideo {
            image: NodeRef("2", 0),
            width,
            height,
            frames: request.num_frames,
            batch_size: 1,
        },
    );
    nodes.insert(
        "6".to_string(),
        sampler_node(request, NodeRef("3", 0), NodeRef("4", 0), NodeRef("5", 0)),
    );
    nodes.insert(
        "7".to_string(),
        WorkflowNode::VaeDecode {
            samples: NodeRef("6", 0),
            vae: NodeRef("1", 2),
        },
    );
    nodes.insert(
        "8".to_string(),
        save_node(request, NodeRef("7", 0), "wan2_i2v_output"),
    );

    nodes
}

fn sampler_node(
    request: &GenerationRequest,
    positive: NodeRef,
    negative: NodeRef,
    latent_image: NodeRef,
) -> WorkflowNode {
    WorkflowNode::Sampler {
        model: NodeRef("1", 0),
        positive,
        negative,
        latent_image,
        seed: request.seed,
        steps: request.num_inference_steps,
        cfg: request.guidance_scale,
        sampler_name: SAMPLER_NAME.to_string(),
        scheduler: SCHEDULER_NAME.to_string(),
        sample_shift: request.sample_shift,
        motion_strength: request.motion_strength,
    }
}

fn save_node(request: &GenerationRequest, images: NodeRef, prefix: &str) -> WorkflowNode {
    WorkflowNode::SaveVideo {
        images,
        filename_prefix: prefix.to_string(),
        fps: request.fps,
        save_image: true,
        pingpong: false,
        save_output: true,
    }
}
