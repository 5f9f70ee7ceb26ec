//! Configuration types for the tutor application.

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted for the model API key.
pub const API_KEY_ENV: &str = "ANKID_API_KEY";

/// Placeholder value shipped in example configs. Treated the same as an
/// absent key so users get guidance instead of an opaque HTTP 403.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hosted generative-language API settings.
    pub model: ModelConfig,
    /// Speech capture settings.
    pub capture: CaptureConfig,
    /// Speech playback settings.
    pub playback: PlaybackConfig,
    /// Conversation mode settings.
    pub conversation: ConversationConfig,
}

/// Hosted model API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// API base URL.
    pub api_url: String,
    /// Model identifier appended to the generate endpoint.
    pub api_model: String,
    /// API key. Leave empty (or the placeholder) to read from the
    /// `ANKID_API_KEY` environment variable instead.
    pub api_key: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens per generated response.
    pub max_output_tokens: u32,
    /// Request timeout in seconds.
    pub request_timeout_s: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_owned(),
            api_model: "gemini-1.5-flash".to_owned(),
            api_key: String::new(),
            temperature: 0.7,
            max_output_tokens: 512,
            request_timeout_s: 30,
        }
    }
}

impl ModelConfig {
    /// Resolve the API key from config or the environment.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Credential`] with guidance on obtaining a key
    /// when neither source provides a real value.
    pub fn resolve_api_key(&self) -> Result<String> {
        let env_value = std::env::var(API_KEY_ENV).ok();
        self.resolve_api_key_with(env_value.as_deref())
    }

    fn resolve_api_key_with(&self, env_value: Option<&str>) -> Result<String> {
        for candidate in [Some(self.api_key.as_str()), env_value].into_iter().flatten() {
            let candidate = candidate.trim();
            if !candidate.is_empty() && candidate != API_KEY_PLACEHOLDER {
                return Ok(candidate.to_owned());
            }
        }
        Err(TutorError::Credential(format!(
            "no API key configured: set {API_KEY_ENV} or [model].api_key in config.toml \
             (create a free key at https://aistudio.google.com/app/apikey)"
        )))
    }
}

/// Speech capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recognition locale.
    pub locale: String,
    /// Keep listening across utterances instead of stopping after the first.
    pub continuous: bool,
    /// Emit interim transcripts while the user is still speaking.
    pub interim_results: bool,
    /// Number of recognition alternatives to request per result.
    pub max_alternatives: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_owned(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

/// Speech playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Speaking rate multiplier.
    pub rate: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
    /// Preferred voice name (None = heuristic selection).
    pub voice: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

/// Conversation mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Delay in ms before re-arming capture after an empty listen or a
    /// finished reply, while conversation mode is on.
    pub rearm_delay_ms: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            rearm_delay_ms: 1_000,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TutorError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TutorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/ankid/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ankid")
            .join("config.toml")
    }
}
