//! Service context that bundles the backend port and key pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::gemini::GeminiBackend;
use crate::adapters::recording::backend::RecordingBackend;
use crate::adapters::replaying::backend::ReplayingBackend;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::Config;
use crate::error::GenError;
use crate::keypool::KeyPool;
use crate::ports::GenerationBackend;

/// Bundles the backend port and the rotating key pool.
pub struct ServiceContext {
    /// Generation backend port.
    pub backend: Box<dyn GenerationBackend>,
    /// Round-robin API key pool shared across pipeline stages.
    pub pool: KeyPool,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write cassette files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<std::path::PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create a live context backed by the Gemini REST API.
    ///
    /// # Errors
    ///
    /// Returns an error if no API keys are configured.
    pub fn live(config: &Config) -> Result<Self, GenError> {
        let pool = KeyPool::new(config.api_keys())?;
        let backend: Box<dyn GenerationBackend> = Box::new(GeminiBackend::new());
        Ok(Self { backend, pool })
    }

    /// Create a recording context that wraps a live adapter with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if no API keys are configured.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), GenError> {
        let live_ctx = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = std::path::PathBuf::from(".negar/cassettes").join(&timestamp);

        let commit = get_commit_hash();
        let path = output_dir.join("backend.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-backend"),
            &commit,
        )));

        let recording_backend = RecordingBackend::new(live_ctx.backend, Arc::clone(&recorder));

        let ctx = Self { backend: Box::new(recording_backend), pool: live_ctx.pool };
        let session = RecordingSession { recorder };

        Ok((ctx, session))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// Replay never contacts the API, so the pool holds a placeholder key.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, GenError> {
        let replayer = Arc::new(Mutex::new(load_cassette(path)?));
        let backend = Box::new(ReplayingBackend::new(replayer));
        let pool = KeyPool::new(vec!["replay".to_string()])?;
        Ok(Self { backend, pool })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
