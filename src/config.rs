//! Configuration types for the voice session core.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection settings.
    pub websocket: WebSocketConfig,
    /// Voice activity detection settings.
    pub vad: VadSettings,
    /// Microphone lifecycle settings.
    pub mic: MicConfig,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// WebSocket endpoint of the conversation backend.
    pub ws_url: String,
    /// Base HTTP URL used to resolve relative asset paths sent by the backend.
    pub base_url: String,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:12393/client-ws".to_owned(),
            base_url: "http://127.0.0.1:12393".to_owned(),
        }
    }
}

/// Voice activity detection settings.
///
/// Thresholds are configured on a 0–100 scale and converted to 0–1
/// probability fractions only when a detector is constructed. Changing
/// settings never reconfigures a live detector; the session performs a full
/// stop/restart cycle instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadSettings {
    /// Probability threshold (0–100) above which a frame counts as speech.
    pub positive_speech_threshold: f32,
    /// Probability threshold (0–100) below which a frame counts as silence.
    pub negative_speech_threshold: f32,
    /// Consecutive sub-threshold frames tolerated before speech is declared
    /// ended.
    pub redemption_frames: u32,
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            positive_speech_threshold: 50.0,
            negative_speech_threshold: 35.0,
            redemption_frames: 40,
        }
    }
}

impl VadSettings {
    /// Positive threshold as a 0–1 fraction for detector construction.
    #[must_use]
    pub fn positive_fraction(&self) -> f32 {
        (self.positive_speech_threshold / 100.0).clamp(0.0, 1.0)
    }

    /// Negative threshold as a 0–1 fraction for detector construction.
    #[must_use]
    pub fn negative_fraction(&self) -> f32 {
        (self.negative_speech_threshold / 100.0).clamp(0.0, 1.0)
    }

    /// Whether a frame probability classifies as speech.
    ///
    /// The boundary is inclusive: a probability exactly at the positive
    /// threshold counts as speech.
    #[must_use]
    pub fn is_speech(&self, probability: f32) -> bool {
        probability >= self.positive_fraction()
    }

    /// Whether a frame probability classifies as silence.
    ///
    /// The boundary is exclusive: a probability exactly at the negative
    /// threshold does not count as silence.
    #[must_use]
    pub fn is_silence(&self, probability: f32) -> bool {
        probability < self.negative_fraction()
    }
}

/// Microphone lifecycle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MicConfig {
    /// Stop the microphone after each detected utterance.
    pub auto_stop_mic: bool,
    /// Start the microphone after the AI response is interrupted.
    pub auto_start_on_interrupt: bool,
    /// Restart the microphone when the AI turn ends.
    pub auto_start_on_conversation_end: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::SessionError::Config(e.to_string()))
    }

    /// Load from the default config path, or defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_default() -> crate::error::Result<Self> {
        let path = Self::default_config_path();
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot
    /// be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SessionError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/hibiki/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("hibiki")
            .join("config.toml")
    }
}
