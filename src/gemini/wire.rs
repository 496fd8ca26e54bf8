//! Serde shapes for the generative-media backend's JSON API.
//!
//! Only the fields this application sends or reads are modeled; everything
//! else in the backend's responses is ignored by serde.

use serde::{Deserialize, Serialize};

// Request side -----------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            system_instruction: None,
            generation_config: None,
            tools: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_image(mime_type: impl Into<String>, base64_data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: base64_data,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
    #[serde(rename = "speechConfig", skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
pub struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    #[serde(rename = "imageSize")]
    pub image_size: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
pub struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
pub struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    pub voice_name: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Tool {
    #[serde(rename = "google_search")]
    pub google_search: GoogleSearchConfig,
}

#[derive(Debug, Default, Serialize)]
pub struct GoogleSearchConfig {}

// Response side ----------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(rename = "inlineData")]
    pub inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseInlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
pub struct WebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// First inline-data part across all candidates, as (mime, base64 data).
/// Carries the generated image for image calls and the PCM payload for
/// speech calls.
pub fn first_inline_data(response: &GenerateContentResponse) -> Option<(String, &str)> {
    for candidate in &response.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };
        for part in &content.parts {
            if let Some(inline) = &part.inline_data {
                let mime = inline
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "image/png".to_string());
                return Some((mime, inline.data.as_str()));
            }
        }
    }
    None
}

/// All non-empty text parts joined, or None when the response carried no
/// text at all.
pub fn joined_text(response: &GenerateContentResponse) -> Option<String> {
    let mut collected = Vec::new();
    for candidate in &response.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };
        for part in &content.parts {
            if let Some(text) = &part.text {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    collected.push(trimmed.to_string());
                }
            }
        }
    }
    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n\n"))
    }
}

/// A grounding citation attached to a chat answer.
#[derive(Debug, Clone)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// Deduplicated grounding citations across all candidates.
pub fn citations(response: &GenerateContentResponse) -> Vec<Citation> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for candidate in &response.candidates {
        let Some(metadata) = &candidate.grounding_metadata else {
            continue;
        };
        for chunk in &metadata.grounding_chunks {
            let Some(web) = &chunk.web else {
                continue;
            };
            let Some(uri) = &web.uri else {
                continue;
            };
            if !seen.insert(uri.clone()) {
                continue;
            }
            out.push(Citation {
                title: web.title.clone().unwrap_or_else(|| uri.clone()),
                uri: uri.clone(),
            });
        }
    }
    out
}

// Video operation (long-running) -----------------------------------------

#[derive(Debug, Serialize)]
pub struct VideoRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
pub struct VideoInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VideoImage>,
}

#[derive(Debug, Serialize)]
pub struct VideoImage {
    #[serde(rename = "bytesBase64Encoded")]
    pub bytes_base64_encoded: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct VideoParameters {
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    pub resolution: String,
    #[serde(rename = "sampleCount")]
    pub sample_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<OperationError>,
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    pub code: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OperationResponse {
    #[serde(rename = "generateVideoResponse")]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateVideoResponse {
    #[serde(rename = "generatedSamples", default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    pub video: VideoRef,
}

#[derive(Debug, Deserialize)]
pub struct VideoRef {
    pub uri: String,
}

impl OperationStatus {
    /// Resource locator of the first generated sample, once done.
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()
            .map(|sample| sample.video.uri.as_str())
    }
}

// Structured error body --------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: Option<i64>,
    pub status: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_inline_data_skips_text_parts() {
        let payload = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your redesign." },
                        { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                    ]
                }
            }]
        });
        let response: GenerateContentResponse =
            serde_json::from_value(payload).expect("response fixture should parse");
        let (mime, data) =
            first_inline_data(&response).expect("inline data part should be found");
        assert_eq!(mime, "image/png");
        assert_eq!(data, "QUJD");
    }

    #[test]
    fn missing_inline_part_yields_none() {
        let payload = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "no image here" }] } }]
        });
        let response: GenerateContentResponse =
            serde_json::from_value(payload).expect("response fixture should parse");
        assert!(first_inline_data(&response).is_none());
    }

    #[test]
    fn citations_deduplicate_by_uri() {
        let payload = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "try this shop" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.com/sofa", "title": "Sofa Shop" } },
                        { "web": { "uri": "https://example.com/sofa", "title": "Sofa Shop" } },
                        { "web": { "uri": "https://example.com/rug" } }
                    ]
                }
            }]
        });
        let response: GenerateContentResponse =
            serde_json::from_value(payload).expect("response fixture should parse");
        let sources = citations(&response);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Sofa Shop");
        // Untitled chunks fall back to the URI.
        assert_eq!(sources[1].title, "https://example.com/rug");
    }

    #[test]
    fn operation_status_exposes_video_uri_when_done() {
        let payload = serde_json::json!({
            "name": "operations/abc123",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [
                        { "video": { "uri": "https://files.example/video.mp4" } }
                    ]
                }
            }
        });
        let status: OperationStatus =
            serde_json::from_value(payload).expect("operation fixture should parse");
        assert!(status.done);
        assert_eq!(status.video_uri(), Some("https://files.example/video.mp4"));
    }

    #[test]
    fn pending_operation_defaults_done_to_false() {
        let payload = serde_json::json!({ "name": "operations/abc123" });
        let status: OperationStatus =
            serde_json::from_value(payload).expect("operation fixture should parse");
        assert!(!status.done);
        assert!(status.video_uri().is_none());
    }

    #[test]
    fn video_request_serializes_camel_case_fields() {
        let request = VideoRequest {
            instances: vec![VideoInstance {
                prompt: "slow pan".to_string(),
                image: Some(VideoImage {
                    bytes_base64_encoded: "QUJD".to_string(),
                    mime_type: "image/png".to_string(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: "16:9".to_string(),
                resolution: "720p".to_string(),
                sample_count: 1,
            },
        };
        let value = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(
            value["instances"][0]["image"]["bytesBase64Encoded"],
            "QUJD"
        );
        assert_eq!(value["parameters"]["aspectRatio"], "16:9");
        assert_eq!(value["parameters"]["sampleCount"], 1);
    }
}
