//! This module provides functionality for loading and handling the application's configuration.
//!
//! It defines the `MuseConfig` struct, which holds the configuration parameters,
//! and a `load_config` function to load the configuration from a YAML file.
//!
//! Every field has a default, so a partial file (or no file at all) is fine. The
//! `OPENAI_API_KEY` environment variable, when set, takes precedence over `api_key`.
//!
//! # Examples
//!
//! ```no_run
//! use subtext_muse::config::load_config;
//!
//! let config = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config.notes_dir);
//! ```

use serde::{Deserialize, Serialize};
use std::{error::Error, fs, path::Path, path::PathBuf, time::Duration};
use tracing::*;

use crate::index::StalePolicy;

/// Environment variable that overrides [`MuseConfig::api_key`].
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Represents the application's configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct MuseConfig {
    /// The API key used to authenticate requests to the API.
    pub api_key: String,

    /// The base URL of the API, e.g. `https://api.openai.com/v1`.
    pub api_base: String,

    /// Model used by the prompt commands.
    pub chat_model: String,

    /// Model used to embed notes and queries.
    pub embedding_model: String,

    /// Optional completion length cap for chat requests.
    pub max_tokens: Option<u32>,

    /// Directory holding the notes.
    pub notes_dir: PathBuf,

    /// File suffix that marks a note; stripped to form the note key.
    pub note_suffix: String,

    /// Where the embedding cache lives.
    pub cache_path: PathBuf,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    /// Whether already-cached notes are re-embedded when their text changes.
    pub stale_policy: StalePolicy,
}

impl Default for MuseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            max_tokens: None,
            notes_dir: PathBuf::from("./notes"),
            note_suffix: ".subtext".to_string(),
            cache_path: PathBuf::from("embeddings.json"),
            request_timeout_secs: 30,
            stale_policy: StalePolicy::Keep,
        }
    }
}

impl MuseConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Replace `api_key` with `key` when it is present and non-empty.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {API_KEY_ENV}");
            self.api_key = key;
        }
        self
    }
}

/// Loads the application's configuration from a YAML file.
///
/// # Returns
///
/// - `Ok(MuseConfig)`: The loaded configuration.
/// - `Err(Box<dyn Error>)`: An error occurred while reading the file or parsing the YAML.
pub fn load_config(file: impl AsRef<Path>) -> Result<MuseConfig, Box<dyn Error>> {
    let file = file.as_ref();
    debug!("Loading config from: {}", file.display());
    let content = fs::read_to_string(file)?;
    let config: MuseConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults. Applies the
/// `OPENAI_API_KEY` override either way.
pub fn load_config_or_default(file: impl AsRef<Path>) -> Result<MuseConfig, Box<dyn Error>> {
    let file = file.as_ref();
    let config = if file.exists() {
        load_config(file)?
    } else {
        info!(
            "No config at {}, using defaults (run `muse init` to create one)",
            file.display()
        );
        MuseConfig::default()
    };
    Ok(config.with_api_key_override(std::env::var(API_KEY_ENV).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
api_key: "example_api_key"
api_base: "http://example.com"
chat_model: "example_model"
embedding_model: "example_embedder"
notes_dir: "/tmp/notes"
cache_path: "/tmp/cache.json"
request_timeout_secs: 5
stale_policy: rehash
"#
        )
        .unwrap();

        let config = load_config(temp_file.path());

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.api_key, "example_api_key");
        assert_eq!(config.api_base, "http://example.com");
        assert_eq!(config.chat_model, "example_model");
        assert_eq!(config.embedding_model, "example_embedder");
        assert_eq!(config.notes_dir, PathBuf::from("/tmp/notes"));
        assert_eq!(config.cache_path, PathBuf::from("/tmp/cache.json"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.stale_policy, StalePolicy::Rehash);
        // not in the file, so defaulted
        assert_eq!(config.note_suffix, ".subtext");
    }

    #[test]
    fn test_load_config_invalid_file() {
        let config = load_config("non/existent/path");
        assert!(config.is_err());
    }

    #[test]
    fn test_load_config_invalid_format() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"invalid: config: format"#).unwrap();

        let config = load_config(temp_file.path());
        assert!(config.is_err());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config_or_default("non/existent/config.yaml").unwrap();
        assert_eq!(config.notes_dir, MuseConfig::default().notes_dir);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_api_key_override() {
        let base = MuseConfig {
            api_key: "from-file".to_string(),
            ..MuseConfig::default()
        };
        assert_eq!(
            base.clone().with_api_key_override(Some("from-env".into())).api_key,
            "from-env"
        );
        assert_eq!(base.clone().with_api_key_override(Some("  ".into())).api_key, "from-file");
        assert_eq!(base.with_api_key_override(None).api_key, "from-file");
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&MuseConfig::default()).unwrap();
        let parsed: MuseConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, MuseConfig::default());
    }
}
