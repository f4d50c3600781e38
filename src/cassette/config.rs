//! Loading cassettes for replay mode.

use std::path::Path;

use super::format::Cassette;
use super::replayer::CassetteReplayer;
use crate::error::GenError;

/// Load a cassette file and build a replayer over it.
///
/// # Errors
///
/// Returns [`GenError::Config`] if the file cannot be read or parsed.
pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, GenError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GenError::Config(format!("Failed to load cassette {}: {e}", path.display()))
    })?;
    let cassette: Cassette = serde_yaml::from_str(&content).map_err(|e| {
        GenError::Config(format!("Failed to load cassette {}: {e}", path.display()))
    })?;
    Ok(CassetteReplayer::new(&cassette))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn load_valid_cassette() {
        let dir = std::env::temp_dir().join("negar_cassette_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.cassette.yaml");

        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "backend".into(),
                method: "generate_text".into(),
                input: json!({}),
                output: json!({"Ok": {"text": "quoted"}}),
            }],
        };
        let yaml = serde_yaml::to_string(&cassette).unwrap();
        std::fs::write(&path, yaml).unwrap();

        let mut replayer = load_cassette(&path).unwrap();
        let i = replayer.next_interaction("backend", "generate_text");
        assert_eq!(i.seq, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_nonexistent_fails() {
        let result = load_cassette(Path::new("/nonexistent/cassette.yaml"));
        assert!(matches!(result, Err(GenError::Config(msg)) if msg.contains("Failed to load")));
    }
}
