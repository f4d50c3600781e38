//! The generation pipeline: quote pass, plate rendering, prompt
//! engineering, optional grounding, and final generation.
//!
//! Every remote call goes through the key pool, so a quota failure on one
//! key is retried on the next before anything is reported to the user.

use crate::context::ServiceContext;
use crate::error::GenError;
use crate::plate::RenderedPlate;
use crate::ports::backend::{
    ImageArtifact, ImageTask, InlineImage, LabeledImage, TextRequest, VideoArtifact, VideoTask,
};
use crate::prompt::{
    grounding_prompt, EngineeredPrompt, TargetModel, ENGINEER_MODEL, IMAGE_MODEL, QUOTE_MODEL,
    SYSTEM_INSTRUCTION_IMAGE, SYSTEM_INSTRUCTION_QUOTE, SYSTEM_INSTRUCTION_VIDEO,
    VIDEO_FAST_MODEL, VIDEO_MODEL,
};

/// Name given to the pre-rendered grounding reference image.
pub const GROUNDING_IMAGE_NAME: &str = "grounding_reference.png";

/// Convert a rendered plate into an inline attachment.
#[must_use]
pub fn plate_to_inline(plate: &RenderedPlate) -> InlineImage {
    InlineImage {
        name: plate.name.clone(),
        mime_type: plate.mime_type.clone(),
        base64: plate.base64.clone(),
    }
}

/// Rewrite the prompt so every to-be-rendered text snippet is quoted.
///
/// This pass is best-effort: on any failure the original prompt is used
/// unchanged, since a missing quote pass only degrades plate extraction,
/// it does not invalidate the request.
pub async fn add_quotes(ctx: &ServiceContext, prompt: &str) -> String {
    let request = TextRequest {
        model: QUOTE_MODEL.to_string(),
        system_instruction: SYSTEM_INSTRUCTION_QUOTE.to_string(),
        prompt: format!("User Prompt: {prompt}"),
        images: Vec::new(),
        closing_instruction: None,
        response_mime_type: "text/plain".to_string(),
        temperature: Some(0.0),
    };

    let result = ctx
        .pool
        .call_with_rotation(|key| {
            let r = &request;
            async move { ctx.backend.generate_text(&key, r).await }
        })
        .await;

    match result {
        Ok(response) => {
            let text = response.text.trim();
            if text.is_empty() {
                prompt.to_string()
            } else {
                text.to_string()
            }
        }
        Err(e) => {
            eprintln!("Warning: quote pass failed ({e}); continuing with the original prompt.");
            prompt.to_string()
        }
    }
}

/// Engineer the structured generation prompt from the quoted prompt, the
/// rendered plates, any user reference images, and the requested aspect
/// ratio (which the engineering model folds into its composition notes).
///
/// # Errors
///
/// Returns [`GenError::MalformedResponse`] when the model reply is not the
/// expected JSON object, or any transport/API error from the backend.
pub async fn engineer_prompt(
    ctx: &ServiceContext,
    quoted_prompt: &str,
    plates: &[RenderedPlate],
    references: &[InlineImage],
    aspect_ratio: &str,
    target: TargetModel,
) -> Result<EngineeredPrompt, GenError> {
    let system_instruction = match target {
        TargetModel::Image => SYSTEM_INSTRUCTION_IMAGE,
        TargetModel::Video => SYSTEM_INSTRUCTION_VIDEO,
    };

    let mut images = Vec::with_capacity(plates.len() + references.len());
    for (i, plate) in plates.iter().enumerate() {
        images.push(LabeledImage {
            label: format!("Text Plate {} ({}):", i + 1, plate.name),
            image: plate_to_inline(plate),
        });
    }
    for (i, reference) in references.iter().enumerate() {
        images.push(LabeledImage {
            label: format!("User Reference Image {} ({}):", i + 1, reference.name),
            image: reference.clone(),
        });
    }

    let request = TextRequest {
        model: ENGINEER_MODEL.to_string(),
        system_instruction: system_instruction.to_string(),
        prompt: format!(
            "User's simple prompt: {quoted_prompt}\nDesired Aspect Ratio: {aspect_ratio}"
        ),
        images,
        closing_instruction: Some(
            "Now, generate the professional prompt JSON based on all inputs and the system instruction."
                .to_string(),
        ),
        response_mime_type: "application/json".to_string(),
        temperature: None,
    };

    let response = ctx
        .pool
        .call_with_rotation(|key| {
            let r = &request;
            async move { ctx.backend.generate_text(&key, r).await }
        })
        .await?;

    EngineeredPrompt::parse(&response.text)
}

/// Pre-render a studio reference photo of a real-world entity named by the
/// engineering model's grounding query.
///
/// # Errors
///
/// Propagates backend errors; grounding failures are not fatal to the
/// pipeline and the caller decides whether to continue without one.
pub async fn grounding_image(ctx: &ServiceContext, query: &str) -> Result<InlineImage, GenError> {
    let request = ImageTask {
        model: IMAGE_MODEL.to_string(),
        prompt: grounding_prompt(query),
        images: Vec::new(),
    };

    let artifact = ctx
        .pool
        .call_with_rotation(|key| {
            let r = &request;
            async move { ctx.backend.generate_image(&key, r).await }
        })
        .await?;

    use base64::Engine;
    Ok(InlineImage {
        name: GROUNDING_IMAGE_NAME.to_string(),
        mime_type: artifact.mime_type,
        base64: base64::engine::general_purpose::STANDARD.encode(&artifact.data),
    })
}

/// Generate the final image from the engineered prompt and all reference
/// attachments (plates first, then grounding, then user references).
///
/// # Errors
///
/// Propagates backend errors, including [`GenError::PoolExhausted`] when
/// every key fails retryably.
pub async fn generate_image(
    ctx: &ServiceContext,
    engineered: &EngineeredPrompt,
    plates: &[RenderedPlate],
    grounding: Option<&InlineImage>,
    references: &[InlineImage],
) -> Result<ImageArtifact, GenError> {
    let mut images: Vec<InlineImage> = plates.iter().map(plate_to_inline).collect();
    if let Some(g) = grounding {
        images.push(g.clone());
    }
    images.extend(references.iter().cloned());

    let request = ImageTask {
        model: IMAGE_MODEL.to_string(),
        prompt: engineered.composed_prompt(),
        images,
    };

    ctx.pool
        .call_with_rotation(|key| {
            let r = &request;
            async move { ctx.backend.generate_image(&key, r).await }
        })
        .await
}

/// Generate the final video from the engineered prompt.
///
/// # Errors
///
/// Propagates backend errors, including [`GenError::PoolExhausted`] when
/// every key fails retryably.
pub async fn generate_video(
    ctx: &ServiceContext,
    engineered: &EngineeredPrompt,
    aspect_ratio: &str,
    resolution: &str,
    fast: bool,
) -> Result<VideoArtifact, GenError> {
    let model = if fast { VIDEO_FAST_MODEL } else { VIDEO_MODEL };

    let request = VideoTask {
        model: model.to_string(),
        prompt: engineered.composed_video_prompt(),
        negative_prompt: Some(engineered.negative_prompt.clone()),
        aspect_ratio: aspect_ratio.to_string(),
        resolution: resolution.to_string(),
    };

    ctx.pool
        .call_with_rotation(|key| {
            let r = &request;
            async move { ctx.backend.generate_video(&key, r).await }
        })
        .await
}
