//! CLI argument parsing with clap.

use clap::Parser;

/// Persian-text-faithful AI image and video generation CLI.
#[derive(Parser, Debug)]
#[command(name = "negar", version, about)]
pub struct Cli {
    /// Text prompt describing the desired scene.
    #[arg(conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long, conflicts_with = "prompt")]
    pub prompt_file: Option<String>,

    /// Target artifact: image, video.
    #[arg(short, long, default_value = "image")]
    pub target: String,

    /// Aspect ratio: 1:1, 16:9, 9:16.
    #[arg(short, long, default_value = "1:1")]
    pub aspect_ratio: String,

    /// Video resolution: 720p, 1080p.
    #[arg(long, default_value = "720p")]
    pub resolution: String,

    /// Reference image file (repeatable).
    #[arg(short = 'r', long = "reference")]
    pub references: Vec<String>,

    /// Image output format: jpeg, png, webp.
    #[arg(short, long, default_value = "png")]
    pub format: String,

    /// Output file path (auto-generated if not specified).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Use the faster, lower-fidelity video model.
    #[arg(long)]
    pub fast: bool,

    /// Skip the quote pass and use the prompt as written.
    #[arg(long)]
    pub no_quote_pass: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the prompt from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if neither prompt nor prompt-file is provided,
    /// or if the file cannot be read.
    pub fn resolve_prompt(&self) -> Result<String, std::io::Error> {
        if let Some(ref text) = self.prompt {
            Ok(text.clone())
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Provide a prompt string or use -p/--prompt-file",
            ))
        }
    }
}
