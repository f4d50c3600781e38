//! Negar - Persian-text-faithful AI image and video generation CLI.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod error;
mod keypool;
mod output;
mod params;
mod pipeline;
mod plate;
mod ports;
mod prompt;

use std::path::Path;
use std::process;

use clap::Parser;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::GenError;
use crate::output::{auto_filename, resolve_output_path, save_image, save_video};
use crate::params::{validate_aspect_ratio, validate_format, validate_resolution};
use crate::plate::PlateRenderer;
use crate::ports::backend::InlineImage;
use crate::prompt::TargetModel;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), GenError> {
    // Load config
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(GenError::Config)?;

    // Resolve prompt
    let prompt = cli.resolve_prompt().map_err(GenError::Io)?;

    // Validate parameters
    let target = TargetModel::parse(&cli.target)?;
    validate_aspect_ratio(&cli.aspect_ratio).map_err(GenError::InvalidArgument)?;
    validate_resolution(&cli.resolution).map_err(GenError::InvalidArgument)?;
    validate_format(&cli.format).map_err(GenError::InvalidArgument)?;

    // Create context based on mode (live / recording / replaying)
    let replay_path = std::env::var("NEGAR_REPLAY").ok();
    let is_recording = std::env::var("NEGAR_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session) = if let Some(ref cassette_path) = replay_path {
        if cli.verbose {
            eprintln!("Replaying from: {cassette_path}");
        }
        (ServiceContext::replaying(Path::new(cassette_path))?, None)
    } else if is_recording {
        if cli.verbose {
            eprintln!("Recording mode enabled");
        }
        let (ctx, session) = ServiceContext::recording(&config)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&config)?, None)
    };
    if cli.verbose {
        eprintln!("Key pool size: {}", ctx.pool.len());
    }

    // Load user reference images
    let mut references = Vec::with_capacity(cli.references.len());
    for path in &cli.references {
        references.push(load_reference(path)?);
    }

    // Quote pass: wrap renderable text in quotes so plate extraction sees it
    let quoted_prompt = if cli.no_quote_pass {
        prompt.clone()
    } else {
        pipeline::add_quotes(&ctx, &prompt).await
    };
    if cli.verbose && quoted_prompt != prompt {
        eprintln!("Quoted prompt: {quoted_prompt}");
    }

    // Render a text plate for every quoted span
    let mut renderer = PlateRenderer::new(config.plate.clone());
    let plates = renderer.extract_plates(&quoted_prompt)?;
    if cli.verbose {
        for plate in &plates {
            eprintln!("Rendered plate: {}", plate.name);
        }
    }

    // Engineer the structured prompt
    let engineered = pipeline::engineer_prompt(
        &ctx,
        &quoted_prompt,
        &plates,
        &references,
        &cli.aspect_ratio,
        target,
    )
    .await?;
    if cli.verbose {
        eprintln!("Analysis: {}", engineered.analysis_notes);
    }

    // Pre-render a grounding reference when the model asked for one
    let grounding = match engineered.grounding_search_query.as_deref() {
        Some(query) if !query.trim().is_empty() => {
            if cli.verbose {
                eprintln!("Grounding query: {query}");
            }
            match pipeline::grounding_image(&ctx, query).await {
                Ok(image) => Some(image),
                Err(e) => {
                    eprintln!("Warning: grounding failed ({e}); continuing without a reference.");
                    None
                }
            }
        }
        _ => None,
    };

    // Generate and save the artifact
    match target {
        TargetModel::Image => {
            let artifact = pipeline::generate_image(
                &ctx,
                &engineered,
                &plates,
                grounding.as_ref(),
                &references,
            )
            .await?;
            let output_path = resolve_output_path(cli.output.as_deref(), &prompt, &cli.format);
            save_image(&artifact.data, &artifact.mime_type, &cli.format, &output_path)?;
            eprintln!("Saved: {}", output_path.display());
        }
        TargetModel::Video => {
            let artifact = pipeline::generate_video(
                &ctx,
                &engineered,
                &cli.aspect_ratio,
                &cli.resolution,
                cli.fast,
            )
            .await?;
            let output_path = match cli.output.as_deref() {
                Some(p) => std::path::PathBuf::from(p),
                None => std::path::PathBuf::from(auto_filename(&prompt, "mp4")),
            };
            save_video(&artifact.data, &output_path)?;
            eprintln!("Saved: {}", output_path.display());
        }
    }

    // Finish recording if active
    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    Ok(())
}

/// Load a user reference image, inferring its MIME type from the extension.
fn load_reference(path: &str) -> Result<InlineImage, GenError> {
    use base64::Engine;

    let p = Path::new(path);
    let mime_type = match p.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => {
            return Err(GenError::InvalidArgument(format!(
                "Unsupported reference image '{path}'. Valid extensions: png, jpg, jpeg, webp"
            )));
        }
    };

    let data = std::fs::read(p)?;
    let name = p
        .file_name()
        .map_or_else(|| path.to_string(), |n| n.to_string_lossy().to_string());

    Ok(InlineImage {
        name,
        mime_type: mime_type.to_string(),
        base64: base64::engine::general_purpose::STANDARD.encode(&data),
    })
}
