//! Live adapter for the Gemini generation APIs.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{ApiErrorKind, GenError};
use crate::ports::backend::{
    BackendFuture, GenerationBackend, ImageArtifact, ImageTask, TextRequest, TextResponse,
    VideoArtifact, VideoTask,
};
use crate::prompt::truncate;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Message signatures marking a failure as key-specific. This is a policy
/// table matched by case-sensitive substring, not a parsing grammar.
const CREDENTIAL_SIGNATURES: &[&str] = &["API key not valid", "API_KEY_INVALID"];
const QUOTA_SIGNATURES: &[&str] = &["RESOURCE_EXHAUSTED", "Quota exceeded"];

/// How often the video operation is polled, and for how long.
const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(10);
const VIDEO_POLL_LIMIT: u32 = 60;

/// Classify an HTTP failure so the key pool knows whether rotating helps.
fn classify_failure(status: u16, message: &str) -> ApiErrorKind {
    if CREDENTIAL_SIGNATURES.iter().any(|s| message.contains(s)) {
        ApiErrorKind::CredentialInvalid
    } else if status == 429 || QUOTA_SIGNATURES.iter().any(|s| message.contains(s)) {
        ApiErrorKind::QuotaExceeded
    } else {
        ApiErrorKind::Other
    }
}

fn malformed(message: impl Into<String>, raw: &str) -> GenError {
    GenError::MalformedResponse { message: message.into(), raw: truncate(raw, 500) }
}

/// Live Gemini backend speaking the REST API.
pub struct GeminiBackend {
    client: Client,
}

impl GeminiBackend {
    /// Create a new backend with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    async fn post_generate_content(
        &self,
        api_key: &str,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<(GenerateContentResponse, String), GenError> {
        let url = format!("{GEMINI_API_BASE}/models/{model}:generateContent");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GenError::Api {
                kind: classify_failure(status.as_u16(), &text),
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| malformed(format!("failed to parse response: {e}"), &text))?;
        Ok((parsed, text))
    }

    async fn generate_text_inner(
        &self,
        api_key: &str,
        request: &TextRequest,
    ) -> Result<TextResponse, GenError> {
        let mut parts = vec![serde_json::json!({"text": request.prompt})];
        for labeled in &request.images {
            parts.push(serde_json::json!({"text": labeled.label}));
            parts.push(serde_json::json!({
                "inlineData": {
                    "mimeType": labeled.image.mime_type,
                    "data": labeled.image.base64,
                }
            }));
        }
        if let Some(ref closing) = request.closing_instruction {
            parts.push(serde_json::json!({"text": closing}));
        }

        let mut generation_config =
            serde_json::json!({"responseMimeType": request.response_mime_type});
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = serde_json::json!(temperature);
        }

        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": parts}],
            "systemInstruction": {"parts": [{"text": request.system_instruction}]},
            "generationConfig": generation_config,
        });

        let (parsed, raw) = self.post_generate_content(api_key, &request.model, &body).await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() {
            return Err(malformed("no text in response", &raw));
        }
        Ok(TextResponse { text })
    }

    async fn generate_image_inner(
        &self,
        api_key: &str,
        request: &ImageTask,
    ) -> Result<ImageArtifact, GenError> {
        let mut parts = vec![serde_json::json!({"text": request.prompt})];
        for image in &request.images {
            parts.push(serde_json::json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.base64,
                }
            }));
        }

        let body = serde_json::json!({
            "contents": [{"parts": parts}],
            "generationConfig": {"responseModalities": ["IMAGE"]},
        });

        let (parsed, raw) = self.post_generate_content(api_key, &request.model, &body).await?;

        for candidate in parsed.candidates {
            for part in candidate.content.parts {
                if let Some(inline) = part.inline_data {
                    let data = base64::engine::general_purpose::STANDARD
                        .decode(&inline.data)
                        .map_err(|e| malformed(format!("failed to decode base64: {e}"), &raw))?;
                    return Ok(ImageArtifact { data, mime_type: inline.mime_type });
                }
            }
        }
        Err(malformed("no image in response", &raw))
    }

    async fn generate_video_inner(
        &self,
        api_key: &str,
        request: &VideoTask,
    ) -> Result<VideoArtifact, GenError> {
        let mut parameters = serde_json::json!({
            "aspectRatio": request.aspect_ratio,
            "resolution": request.resolution,
        });
        if let Some(ref negative) = request.negative_prompt {
            parameters["negativePrompt"] = serde_json::json!(negative);
        }
        let body = serde_json::json!({
            "instances": [{"prompt": request.prompt}],
            "parameters": parameters,
        });

        let url = format!("{GEMINI_API_BASE}/models/{}:predictLongRunning", request.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GenError::Api {
                kind: classify_failure(status.as_u16(), &text),
                status: status.as_u16(),
                message: text,
            });
        }
        let started: OperationHandle = serde_json::from_str(&text)
            .map_err(|e| malformed(format!("failed to parse operation handle: {e}"), &text))?;

        for _ in 0..VIDEO_POLL_LIMIT {
            tokio::time::sleep(VIDEO_POLL_INTERVAL).await;

            let url = format!("{GEMINI_API_BASE}/{}", started.name);
            let response =
                self.client.get(&url).header("x-goog-api-key", api_key).send().await?;
            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(GenError::Api {
                    kind: classify_failure(status.as_u16(), &text),
                    status: status.as_u16(),
                    message: text,
                });
            }
            let operation: OperationStatus = serde_json::from_str(&text)
                .map_err(|e| malformed(format!("failed to parse operation status: {e}"), &text))?;

            if let Some(error) = operation.error {
                return Err(GenError::Api {
                    kind: classify_failure(u16::try_from(error.code).unwrap_or(0), &error.message),
                    status: u16::try_from(error.code).unwrap_or(0),
                    message: error.message,
                });
            }
            if !operation.done {
                continue;
            }

            let uri = operation
                .response
                .as_ref()
                .and_then(|r| r.pointer("/generateVideoResponse/generatedSamples/0/video/uri"))
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| malformed("no video in finished operation", &text))?;

            let download =
                self.client.get(uri).header("x-goog-api-key", api_key).send().await?;
            let status = download.status();
            if !status.is_success() {
                let body = download.text().await?;
                return Err(GenError::Api {
                    kind: classify_failure(status.as_u16(), &body),
                    status: status.as_u16(),
                    message: body,
                });
            }
            let data = download.bytes().await?.to_vec();
            return Ok(VideoArtifact { data, mime_type: "video/mp4".into() });
        }

        Err(GenError::Api {
            kind: ApiErrorKind::Other,
            status: 0,
            message: "video operation did not finish within the polling window".into(),
        })
    }
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationBackend for GeminiBackend {
    fn generate_text<'a>(
        &'a self,
        api_key: &str,
        request: &TextRequest,
    ) -> BackendFuture<'a, TextResponse> {
        let api_key = api_key.to_string();
        let request = request.clone();
        Box::pin(async move { self.generate_text_inner(&api_key, &request).await })
    }

    fn generate_image<'a>(
        &'a self,
        api_key: &str,
        request: &ImageTask,
    ) -> BackendFuture<'a, ImageArtifact> {
        let api_key = api_key.to_string();
        let request = request.clone();
        Box::pin(async move { self.generate_image_inner(&api_key, &request).await })
    }

    fn generate_video<'a>(
        &'a self,
        api_key: &str,
        request: &VideoTask,
    ) -> BackendFuture<'a, VideoArtifact> {
        let api_key = api_key.to_string();
        let request = request.clone();
        Box::pin(async move { self.generate_video_inner(&api_key, &request).await })
    }
}

// --- Gemini API response types ---

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}
