//! Generation backend port for the remote model family.
//!
//! Every operation takes the API key to use for that attempt, so the key
//! pool can retry one logical call across keys. Operations must therefore be
//! idempotent or safe to repeat against the remote service. Failures carry
//! an [`crate::error::ApiErrorKind`] tag assigned by the adapter; the
//! rotation loop never pattern-matches message text.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::GenError;

/// An inline image attachment: name, MIME type, and base64 payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineImage {
    /// File name the models use to reference this image in instructions.
    pub name: String,
    /// MIME type, e.g. `"image/png"`.
    pub mime_type: String,
    /// Base64-encoded payload.
    pub base64: String,
}

/// An inline image plus the caption emitted just before it in model input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledImage {
    /// Caption text, e.g. `"Text Plate 1 (text_plate_1.png):"`.
    pub label: String,
    /// The attached image.
    pub image: InlineImage,
}

/// A text-model request (quote pass, prompt engineering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    /// Resolved model identifier.
    pub model: String,
    /// System instruction steering the model.
    pub system_instruction: String,
    /// Leading user text part.
    pub prompt: String,
    /// Labeled image attachments, in order.
    #[serde(default)]
    pub images: Vec<LabeledImage>,
    /// Trailing user text part emitted after all attachments.
    #[serde(default)]
    pub closing_instruction: Option<String>,
    /// Expected response MIME type (`"text/plain"` or `"application/json"`).
    pub response_mime_type: String,
    /// Sampling temperature override.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// A text-model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    /// Concatenated text of all reply parts.
    pub text: String,
}

/// An image-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTask {
    /// Resolved model identifier.
    pub model: String,
    /// The full generation prompt.
    pub prompt: String,
    /// Reference images passed inline (text plates first, then user
    /// references).
    #[serde(default)]
    pub images: Vec<InlineImage>,
}

/// A generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// Raw image bytes (decoded from base64).
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the image.
    pub mime_type: String,
}

/// A video-generation request for the long-running video API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTask {
    /// Resolved model identifier.
    pub model: String,
    /// The full generation prompt.
    pub prompt: String,
    /// Negative prompt, passed as a dedicated parameter.
    #[serde(default)]
    pub negative_prompt: Option<String>,
    /// Aspect ratio (`"16:9"`, `"9:16"`, ...).
    pub aspect_ratio: String,
    /// Output resolution (`"720p"`, `"1080p"`).
    pub resolution: String,
}

/// A generated video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoArtifact {
    /// Raw video bytes.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the video.
    pub mime_type: String,
}

/// Boxed future type returned by [`GenerationBackend`] operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GenError>> + Send + 'a>>;

/// The remote generation service, abstracted as per-key operations.
pub trait GenerationBackend: Send + Sync {
    /// Run a text model call (quote pass, prompt engineering).
    fn generate_text<'a>(
        &'a self,
        api_key: &str,
        request: &TextRequest,
    ) -> BackendFuture<'a, TextResponse>;

    /// Generate an image.
    fn generate_image<'a>(
        &'a self,
        api_key: &str,
        request: &ImageTask,
    ) -> BackendFuture<'a, ImageArtifact>;

    /// Generate a video via the long-running operation flow.
    fn generate_video<'a>(
        &'a self,
        api_key: &str,
        request: &VideoTask,
    ) -> BackendFuture<'a, VideoArtifact>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings in cassettes.
pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as a base64 string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize a base64 string to bytes.
    ///
    /// # Errors
    ///
    /// Fails on invalid base64.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
