//! Outbound response shapes.
//!
//! A request either fully succeeds (encoded artifact returned) or fully
//! fails (`{error}` object).  There is no partial-success shape.

use serde::Serialize;

/// Successful generation response returned to the dispatch framework.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    /// Always `"success"`.
    pub status: &'static str,
    pub message: String,
    /// Base64-encoded video bytes.
    pub video_base64: String,
    pub filename: String,
    /// `"text_to_video"` or `"image_to_video"`.
    pub generation_type: &'static str,
    /// Positive prompt as received (empty when omitted).
    pub prompt: String,
    pub settings: ResponseSettings,
}

/// Echo of the effective generation settings.
#[derive(Debug, Serialize)]
pub struct ResponseSettings {
    /// Raw resolution string as requested (not the resolved preset).
    pub resolution: String,
    pub frames: u32,
    pub guidance_scale: f64,
    pub steps: u32,
    pub motion_strength: u32,
}

/// Uniform failure response. Every fatal error collapses to this shape
/// at the request-handler boundary.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_serializes_all_fields() {
        let resp = GenerationResponse {
            status: "success",
            message: "Wan 2.2 text_to_video generation completed".to_string(),
            video_base64: "AAAA".to_string(),
            filename: "wan2_t2v_output_00001.mp4".to_string(),
            generation_type: "text_to_video",
            prompt: "a cat".to_string(),
            settings: ResponseSettings {
                resolution: "480p".to_string(),
                frames: 60,
                guidance_scale: 4.0,
                steps: 30,
                motion_strength: 7,
            },
        };

        let value = serde_json::to_value(&resp).expect("serialization should succeed");
        assert_eq!(value["status"], "success");
        assert_eq!(value["video_base64"], "AAAA");
        assert_eq!(value["filename"], "wan2_t2v_output_00001.mp4");
        assert_eq!(value["generation_type"], "text_to_video");
        assert_eq!(value["settings"]["resolution"], "480p");
        assert_eq!(value["settings"]["frames"], 60);
        assert_eq!(value["settings"]["steps"], 30);
    }

    #[test]
    fn error_response_is_a_single_field_object() {
        let value = serde_json::to_value(ErrorResponse {
            error: "Generation timeout".to_string(),
        })
        .expect("serialization should succeed");
        assert_eq!(value, serde_json::json!({"error": "Generation timeout"}));
    }
}
