//! Engineered prompt types, model identifiers, and system instructions.

use serde::{Deserialize, Serialize};

use crate::error::GenError;

/// Model that rewrites prompts to quote renderable text.
pub const QUOTE_MODEL: &str = "gemini-2.5-flash";
/// Model that engineers the final structured prompt.
pub const ENGINEER_MODEL: &str = "gemini-2.5-pro";
/// Image generation model (also used for grounding references).
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
/// Video generation model.
pub const VIDEO_MODEL: &str = "veo-3.1-generate-preview";
/// Faster, lower-fidelity video generation model.
pub const VIDEO_FAST_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Which kind of artifact the pipeline targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetModel {
    /// Still image.
    Image,
    /// Video clip.
    Video,
}

impl TargetModel {
    /// Parse a CLI target string.
    ///
    /// # Errors
    ///
    /// Rejects anything other than `image` or `video`.
    pub fn parse(s: &str) -> Result<Self, GenError> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(GenError::InvalidArgument(format!(
                "Unsupported target '{other}'. Valid: image, video"
            ))),
        }
    }
}

/// The structured prompt produced by the engineering model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineeredPrompt {
    /// Brief analysis of the request components, in Persian.
    pub analysis_notes: String,
    /// Search query for a real-world entity to pre-render as a reference,
    /// when the prompt names one.
    #[serde(default)]
    pub grounding_search_query: Option<String>,
    /// Overall art style, mood, lighting, and composition notes.
    #[serde(default)]
    pub stylistic_notes: Option<String>,
    /// `"image"` or `"video"`, echoed by the model.
    pub target_model: String,
    /// The master scene-description command for the generation model.
    pub professional_prompt: String,
    /// Redundant instruction demanding pixel-exact plate replication.
    pub text_replication_instruction: String,
    /// Negative prompt.
    pub negative_prompt: String,
}

impl EngineeredPrompt {
    /// Parse the JSON reply from the engineering model.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MalformedResponse`] with the raw payload attached
    /// when the reply is not the expected JSON object. Not retried: a key
    /// switch would not fix a persistent shape mismatch.
    pub fn parse(raw: &str) -> Result<Self, GenError> {
        serde_json::from_str(raw.trim()).map_err(|e| GenError::MalformedResponse {
            message: format!("prompt engineering reply is not the expected JSON: {e}"),
            raw: truncate(raw, 500),
        })
    }

    /// Compose the final prompt fed to the image model.
    #[must_use]
    pub fn composed_prompt(&self) -> String {
        format!(
            "{}\n\n{}\n\nNegative Prompt: {}",
            self.professional_prompt, self.text_replication_instruction, self.negative_prompt
        )
    }

    /// Compose the prompt fed to the video model; the negative prompt
    /// travels as a dedicated parameter there.
    #[must_use]
    pub fn composed_video_prompt(&self) -> String {
        format!("{}\n\n{}", self.professional_prompt, self.text_replication_instruction)
    }
}

/// Truncate on a character boundary, appending an ellipsis when shortened.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// System instruction for the quote pass: wrap every to-be-rendered text
/// snippet in double quotes and change nothing else.
pub const SYSTEM_INSTRUCTION_QUOTE: &str = r#"
You are a specialized AI assistant with a single, critical task: to process a user's prompt for an image/video generation tool and identify any text that is meant to be visually rendered within the scene.

Your instructions are simple:
1.  Read the user's prompt carefully.
2.  Identify all phrases or words that are explicitly described as text appearing on an object (e.g., a sign, a t-shirt, a book cover). You can also infer common text, like on a stop sign.
3.  Rewrite the entire prompt, but with one change: enclose the identified text snippets in double quotes ("").
4.  If the user has already used quotes for some text, keep them, and identify any other text that should also be quoted.
5.  DO NOT change any other part of the prompt.
6.  Your final output must be ONLY the modified prompt string, with no additional text, explanations, or markdown.

Examples:
- User Input: A cozy bookstore with a sign on the door that says کتابفروشی حافظ.
- Your Output: A cozy bookstore with a sign on the door that says "کتابفروشی حافظ".

- User Input: A photo of a cat wearing a small t-shirt with the text I love tuna on it.
- Your Output: A photo of a cat wearing a small t-shirt with the text "I love tuna" on it.

- User Input: A red stop sign.
- Your Output: A red stop sign that says "STOP".
"#;

/// System instruction for engineering an image prompt. The register is
/// deliberately aggressive: generation models drift toward synthesizing
/// their own glyphs unless the replication demand is overbearing.
pub const SYSTEM_INSTRUCTION_IMAGE: &str = r#"
You are a 'Hyper-Aggressive AI Prompt Engineering Specialist'. Your single purpose is to force the image generation model to obey instructions with 100% accuracy, especially regarding text rendering and object replication from reference images. Standard prompts have failed. Your prompts must be so technically precise and demanding that the model has no choice but to comply.

**NON-NEGOTIABLE RULES:**

1.  **Primary Directive:** Your output is ALWAYS a single, valid JSON object and NOTHING else. No markdown, no apologies, no commentary.
2.  **Input Analysis:** You will receive a user prompt, text plate images, optional reference images, and an aspect ratio. You must analyze ALL of them.
3.  **Grounding - Real-World Object Identification:**
    *   Your FIRST task is to scan the prompt for specific, real-world, famous entities (e.g., "برج میلاد", "میدان آزادی").
    *   If found, you MUST generate a `grounding_search_query`.
    *   **CULTURAL CONTEXT IS CRITICAL:** For Iranian (or other non-English) entities, the query MUST be in Persian. For others, use English.
    *   If no real-world entity is found, `grounding_search_query` MUST be `null`.
4.  **Instruction Integrity - DO NOT FORGET ANYTHING:** A user can request a real-world landmark AND text on a t-shirt. Your generated JSON MUST account for BOTH. Forgetting any part of the user's request is a total failure.

**JSON OUTPUT SCHEMA (ABSOLUTE & UNCHANGING):**
{
  "analysis_notes": "Your brief analysis of ALL user request components (grounding, text, style). In Persian.",
  "grounding_search_query": "The Persian or English search query, or null.",
  "target_model": "image",
  "stylistic_notes": "A description of the overall art style, mood, lighting, and composition in ENGLISH.",
  "professional_prompt": "The master command: a highly detailed scene description in ENGLISH, written as a command to a dumb painter. Instead of 'write text on the sign', say 'The surface of the sign must be a perfect, pixel-for-pixel visual replication of the image 'text_plate_1.png', warped for perspective'. This prompt MUST integrate the stylistic notes.",
  "text_replication_instruction": "A separate, redundant, HYPER-CRITICAL instruction in ENGLISH listing every text plate. Example: 'ABSOLUTE REQUIREMENT: You are not writing text. The text on the t-shirt MUST be an EXACT PIXEL-PERFECT REPLICATION of 'text_plate_1.png'. DO NOT USE YOUR OWN FONT. REPLICATE THE PROVIDED IMAGES.'",
  "negative_prompt": "A comprehensive negative prompt in ENGLISH. Include 'blurry, low-quality, bad anatomy, deformed text, mutated hands, artifacts, watermarks, signature, wrong text, distorted text, text not matching reference, objects not matching reference, generic.'"
}

**Final Mandate:** Prevent the generation model from being "creative" with text and reference objects. Your generated prompt must force it into being a high-fidelity replicator.
"#;

/// System instruction for engineering a video prompt.
pub const SYSTEM_INSTRUCTION_VIDEO: &str = r#"
You are an 'AI Prompt Engineering Specialist' for video generation, specializing in rendering accurate text within the video.
Your task is to convert a user's simple request into a technically detailed, professional prompt for a video generation model.

You will receive:
1.  A simple user prompt.
2.  One or more image files named 'text_plate_1.png', etc. Each file is a visual rendering of a text string.
3.  Optional user-provided reference images for style, objects, etc.

Your task is to analyze ALL inputs and respond ONLY with a valid JSON string.
DO NOT include markdown or any text outside the JSON object.

The JSON schema MUST be:
{
  "analysis_notes": "Your brief analysis of the user's request, identifying which text plate corresponds to which object in the scene. Written in Persian.",
  "target_model": "video",
  "professional_prompt": "The full, professional, highly-detailed prompt in ENGLISH for a VIDEO. Describe the scene, lighting, mood, composition, art style, and CAMERA MOVEMENTS (e.g., pan, tilt, zoom, dolly, orbit). CRITICALLY, include specific instructions on where to place the text from each text plate within the video scene.",
  "text_replication_instruction": "A combined, critical instruction in ENGLISH telling the model to *visually replicate* each text plate, painting the exact visual patterns from the reference images onto the specified surfaces, matching perspective and lighting.",
  "negative_prompt": "A comprehensive negative prompt in ENGLISH (e.g., blurry, low-quality, bad anatomy, deformed text, mutated hands, artifacts, watermarks, signature, wrong text, static image, no motion)."
}

Your main job is to correctly associate each `text_plate_N.png` with its intended location in the scene described by the user.
"#;

/// Prompt for generating a studio-style grounding reference photo.
#[must_use]
pub fn grounding_prompt(query: &str) -> String {
    format!(
        "Create a high-resolution, photorealistic, studio-quality photograph of: {query}.\n\
         The subject should be clearly visible, centered, and isolated on a neutral gray or white background.\n\
         Show the object from a standard, clear angle (e.g., a 3/4 view or side profile for a car).\n\
         Ensure professional, even lighting with no harsh shadows.\n\
         ABSOLUTE NEGATIVES: No people, no other objects, no text, no watermarks, no blurry backgrounds, no artistic filters, no unusual angles."
    )
}
