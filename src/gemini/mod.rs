//! Thin client for the generative-media backend: image edits,
//! text-to-image, long-running video renders, text-to-speech, and
//! grounded chat.
//!
//! Every operation is side-effect-free with respect to application state;
//! callers apply session updates after a call resolves or fails.

pub mod wire;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::audio::{self, SpeechClip, SPEECH_SAMPLE_RATE};
use crate::error::StudioError;
use crate::session::{DesignStyle, ImageData, ImageSize};
use wire::{
    Citation, GenerateContentRequest, GenerationConfig, ImageConfig, OperationStatus, Part,
    PrebuiltVoiceConfig, SpeechConfig, Tool, VideoImage, VideoInstance, VideoParameters,
    VideoRequest, VoiceConfig,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const IMAGE_EDIT_MODEL: &str = "gemini-2.5-flash-image";
const IMAGE_PRO_MODEL: &str = "gemini-3-pro-image-preview";
const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
const SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
const CHAT_MODEL: &str = "gemini-3-pro-preview";

const SPEECH_VOICE: &str = "Kore";

/// Motion prompt used when the caller supplies none.
pub const DEFAULT_MOTION_PROMPT: &str =
    "A cinematic slow pan around this beautiful interior space.";

const CHAT_SYSTEM_INSTRUCTION: &str = "You are an elite interior design consultant. Analyze \
     images provided and answer questions. When recommending furniture, describe them vividly \
     and provide shoppable descriptions. If you mention real-world items, use Google Search to \
     provide grounding links.";

/// Handle for an asynchronous video render. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct VideoOperation {
    pub name: String,
    pub done: bool,
    pub uri: Option<String>,
}

/// Grounded chat answer plus its supporting citations (possibly empty).
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub text: String,
    pub sources: Vec<Citation>,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    /// Redecorates the room in the given style while preserving the
    /// architectural layout (a prompt-level contract).
    pub async fn reimagine(
        &self,
        image: &ImageData,
        style: DesignStyle,
    ) -> Result<ImageData, StudioError> {
        let style = style.label();
        let prompt = format!(
            "Reimagine this room exactly as it is but completely redecorated in a {style} \
             style. Maintain the architectural layout (walls, windows, doors) but replace all \
             furniture, textures, and lighting with high-end {style} design elements."
        );
        let request = GenerateContentRequest::from_parts(vec![
            Part::inline_image(&image.mime, BASE64.encode(image.bytes.as_slice())),
            Part::text(prompt),
        ]);
        let response = self.post_generate(IMAGE_EDIT_MODEL, &request).await?;
        extract_image(&response)
    }

    /// Applies a free-text delta edit; the rest of the room stays as-is
    /// (again only guaranteed at the prompt level).
    pub async fn refine(
        &self,
        image: &ImageData,
        instruction: &str,
    ) -> Result<ImageData, StudioError> {
        let prompt = format!(
            "Update this interior design based on the following instruction: \
             \"{instruction}\". Keep the rest of the room exactly the same."
        );
        let request = GenerateContentRequest::from_parts(vec![
            Part::inline_image(&image.mime, BASE64.encode(image.bytes.as_slice())),
            Part::text(prompt),
        ]);
        let response = self.post_generate(IMAGE_EDIT_MODEL, &request).await?;
        extract_image(&response)
    }

    /// From-scratch render of a described room at the requested
    /// resolution tier.
    pub async fn generate_from_text(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<ImageData, StudioError> {
        let prompt = format!(
            "A photorealistic interior design render of: {prompt}. Cinematic lighting, 8k \
             resolution, professional architectural photography."
        );
        let mut request = GenerateContentRequest::from_parts(vec![Part::text(prompt)]);
        request.generation_config = Some(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: "16:9".to_string(),
                image_size: size.as_str().to_string(),
            }),
            ..GenerationConfig::default()
        });
        let response = self.post_generate(IMAGE_PRO_MODEL, &request).await?;
        extract_image(&response)
    }

    /// Submits a video render and returns the operation handle; the
    /// caller owns polling and loop termination.
    pub async fn animate(
        &self,
        image: &ImageData,
        prompt: Option<&str>,
    ) -> Result<VideoOperation, StudioError> {
        let prompt = match prompt {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => DEFAULT_MOTION_PROMPT.to_string(),
        };
        let request = VideoRequest {
            instances: vec![VideoInstance {
                prompt,
                image: Some(VideoImage {
                    bytes_base64_encoded: BASE64.encode(image.bytes.as_slice()),
                    mime_type: image.mime.clone(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: "16:9".to_string(),
                resolution: "720p".to_string(),
                sample_count: 1,
            },
        };

        let url = format!(
            "{}/models/{}:predictLongRunning?key={}",
            self.base_url, VIDEO_MODEL, self.api_key
        );
        let response = self.http.post(&url).json(&request).send().await?;
        let status: OperationStatus = self.read_json(response).await?;
        debug!(operation = %status.name, "video render submitted");
        Ok(operation_from_status(status))
    }

    /// Re-fetches a possibly-updated operation by name.
    pub async fn poll_operation(
        &self,
        operation: &VideoOperation,
    ) -> Result<VideoOperation, StudioError> {
        let url = format!("{}/{}?key={}", self.base_url, operation.name, self.api_key);
        let response = self.http.get(&url).send().await?;
        let status: OperationStatus = self.read_json(response).await?;
        if let Some(error) = &status.error {
            return Err(StudioError::Backend {
                status: error.code.unwrap_or(0) as u16,
                message: error
                    .message
                    .clone()
                    .unwrap_or_else(|| "video operation failed".to_string()),
            });
        }
        Ok(operation_from_status(status))
    }

    /// Downloads the finished render.
    pub async fn fetch_video_bytes(
        &self,
        operation: &VideoOperation,
    ) -> Result<Vec<u8>, StudioError> {
        let uri = operation.uri.as_deref().ok_or(StudioError::NoVideoReturned)?;
        let url = format!("{uri}&key={}", self.api_key);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(map_backend_error(status, &message));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Narrates the given text (capped at 500 characters) and decodes the
    /// returned PCM payload into normalized samples.
    pub async fn synthesize_speech(&self, text: &str) -> Result<SpeechClip, StudioError> {
        let capped = audio::truncate_for_speech(text);
        let mut request =
            GenerateContentRequest::from_parts(vec![Part::text(format!(
                "Narrate helpfully: {capped}"
            ))]);
        request.generation_config = Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: SPEECH_VOICE.to_string(),
                    },
                },
            }),
            ..GenerationConfig::default()
        });

        let response = self.post_generate(SPEECH_MODEL, &request).await?;
        let (_, data) =
            wire::first_inline_data(&response).ok_or(StudioError::NoAudioReturned)?;
        let bytes = BASE64.decode(data).map_err(|err| StudioError::Decode {
            what: "speech payload",
            detail: err.to_string(),
        })?;
        Ok(audio::decode_pcm16(&bytes, SPEECH_SAMPLE_RATE, 1))
    }

    /// Image-conditioned Q&A with search grounding enabled.
    pub async fn grounded_chat(
        &self,
        message: &str,
        image: Option<&ImageData>,
    ) -> Result<ChatAnswer, StudioError> {
        let mut parts = vec![Part::text(message)];
        if let Some(image) = image {
            parts.push(Part::inline_image(
                &image.mime,
                BASE64.encode(image.bytes.as_slice()),
            ));
        }
        let mut request = GenerateContentRequest::from_parts(parts);
        request.system_instruction = Some(wire::Content {
            parts: vec![Part::text(CHAT_SYSTEM_INSTRUCTION)],
        });
        request.tools = Some(vec![Tool::default()]);

        let response = self.post_generate(CHAT_MODEL, &request).await?;
        let text = wire::joined_text(&response)
            .unwrap_or_else(|| "I couldn't generate a response.".to_string());
        Ok(ChatAnswer {
            text,
            sources: wire::citations(&response),
        })
    }

    async fn post_generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<wire::GenerateContentResponse, StudioError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let response = self.http.post(&url).json(request).send().await?;
        self.read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StudioError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(map_backend_error(status, &body));
        }
        Ok(response.json().await?)
    }
}

fn operation_from_status(status: OperationStatus) -> VideoOperation {
    let uri = status.video_uri().map(|uri| uri.to_string());
    VideoOperation {
        name: status.name,
        done: status.done,
        uri,
    }
}

fn extract_image(response: &wire::GenerateContentResponse) -> Result<ImageData, StudioError> {
    let (mime, data) = wire::first_inline_data(response).ok_or(StudioError::NoImageReturned)?;
    let bytes = BASE64.decode(data).map_err(|err| StudioError::Decode {
        what: "image payload",
        detail: err.to_string(),
    })?;
    Ok(ImageData::new(bytes, mime))
}

/// Maps a non-success HTTP response to the error taxonomy using the
/// backend's structured error body. A NOT_FOUND status means the
/// configured credential or model identity is invalid and the user should
/// re-select a key.
fn map_backend_error(status: u16, body: &str) -> StudioError {
    if let Ok(parsed) = serde_json::from_str::<wire::ApiErrorBody>(body) {
        let detail = parsed.error;
        if detail.status.as_deref() == Some("NOT_FOUND") || detail.code == Some(404) {
            return StudioError::CredentialMissing;
        }
        return StudioError::Backend {
            status,
            message: detail
                .message
                .unwrap_or_else(|| "backend rejected the request".to_string()),
        };
    }
    StudioError::Backend {
        status,
        message: body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_maps_to_credential_missing() {
        let body = r#"{"error":{"code":404,"status":"NOT_FOUND","message":"Requested entity was not found."}}"#;
        assert!(matches!(
            map_backend_error(404, body),
            StudioError::CredentialMissing
        ));
    }

    #[test]
    fn other_structured_errors_keep_their_message() {
        let body = r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED","message":"Quota exceeded"}}"#;
        match map_backend_error(429, body) {
            StudioError::Backend { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_error_bodies_fall_back_to_raw_text() {
        match map_backend_error(502, "bad gateway\n") {
            StudioError::Backend { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[test]
    fn extract_image_requires_an_inline_part() {
        let response: wire::GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "all words, no pixels" }] } }]
        }))
        .expect("fixture should parse");
        assert!(matches!(
            extract_image(&response),
            Err(StudioError::NoImageReturned)
        ));
    }

    #[test]
    fn extract_image_decodes_base64_payload() {
        let response: wire::GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
            ] } }]
        }))
        .expect("fixture should parse");
        let image = extract_image(&response).expect("image should decode");
        assert_eq!(image.bytes.as_slice(), b"ABC");
        assert_eq!(image.mime, "image/png");
    }
}
