//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::plate::PlateStyle;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Text plate rendering style.
    #[serde(default)]
    pub plate: PlateStyle,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API keys used round-robin.
    #[serde(default)]
    pub pool: Vec<String>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Resolve the API key pool.
    ///
    /// Resolution order:
    /// 1. `GEMINI_API_KEYS` environment variable (comma-separated)
    /// 2. `GEMINI_API_KEY` environment variable (single key)
    /// 3. `[keys] pool` from the config file
    #[must_use]
    pub fn api_keys(&self) -> Vec<String> {
        if let Ok(raw) = std::env::var("GEMINI_API_KEYS") {
            let keys: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string)
                .collect();
            if !keys.is_empty() {
                return keys;
            }
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                return vec![key.trim().to_string()];
            }
        }

        self.keys.pool.clone()
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `NEGAR_CONFIG` environment variable
/// 3. `~/.config/negar/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("NEGAR_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/negar/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/negar/config.toml")
    } else {
        PathBuf::from("negar.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.pool.is_empty());
        assert_eq!(config.plate.width, 512);
        assert_eq!(config.plate.height, 128);
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.keys.pool.is_empty());
    }

    #[test]
    fn load_valid_toml() {
        let dir = std::env::temp_dir().join("negar_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
pool = ["key-a", "key-b"]

[plate]
width = 512
height = 256
font_size = 64.0
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.pool, vec!["key-a", "key-b"]);
        assert_eq!(config.plate.height, 256);
        assert!((config.plate.font_size - 64.0).abs() < f32::EPSILON);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = std::env::temp_dir().join("negar_config_bad_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn pool_from_file_when_env_unset() {
        let config = Config {
            keys: KeysConfig { pool: vec!["from-file".into()] },
            ..Config::default()
        };

        std::env::remove_var("GEMINI_API_KEYS");
        std::env::remove_var("GEMINI_API_KEY");
        assert_eq!(config.api_keys(), vec!["from-file"]);
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
