//! Records backend interactions into a cassette file.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};

/// Accumulates interactions for one session and writes them out as a YAML
/// cassette. The session timestamp is taken at construction, when the first
/// backend call is about to happen, not at flush time.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Create a recorder that will write to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            cassette: Cassette {
                name: name.into(),
                recorded_at: Utc::now(),
                commit: commit.into(),
                interactions: Vec::new(),
            },
        }
    }

    /// Append one interaction; `seq` reflects the global call order.
    pub fn record(
        &mut self,
        port: &str,
        method: &str,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let seq = u64::try_from(self.cassette.interactions.len()).unwrap_or(u64::MAX);
        self.cassette.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Write the cassette YAML file to disk, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let yaml = serde_yaml::to_string(&self.cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_and_finish() {
        let dir = std::env::temp_dir().join("negar_cassette_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "test-recording", "deadbeef");
        recorder.record(
            "backend",
            "generate_text",
            json!({"prompt": "a sign"}),
            json!({"Ok": {"text": "a \"sign\""}}),
        );
        recorder.record(
            "backend",
            "generate_image",
            json!({"prompt": "paint it"}),
            json!({"Ok": {"data": "", "mime_type": "image/png"}}),
        );

        let result_path = recorder.finish().expect("finish should succeed");
        assert_eq!(result_path, path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("generate_text"));
        assert!(content.contains("generate_image"));

        let cassette: super::super::format::Cassette = serde_yaml::from_str(&content).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].seq, 0);
        assert_eq!(cassette.interactions[1].seq, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn finish_creates_missing_parent_dirs() {
        let dir = std::env::temp_dir().join("negar_cassette_nested_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("deep/session/backend.cassette.yaml");

        let recorder = CassetteRecorder::new(&path, "empty-session", "unknown");
        let written = recorder.finish().expect("finish should create parents");
        assert!(written.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
