//! Frontend collaborator contracts.
//!
//! The rendering/playback side of the application (avatar renderer, audio
//! output, toast notifications) is injected behind these traits at
//! construction time; the session never reaches for ambient globals.

use crate::protocol::{ConfigFile, DisplayText, Expression, ModelInfo};

/// One synthesized-speech playback unit with lip-sync data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioTask {
    pub audio_base64: String,
    pub volumes: Vec<f32>,
    pub slice_length: u32,
    pub display_text: Option<DisplayText>,
    pub expressions: Vec<Expression>,
    /// Whether this audio was forwarded from another group member.
    pub forwarded: bool,
}

/// Queued playback and lip-sync of synthesized speech.
///
/// Implementations must not block the session loop; enqueueing is a handoff.
pub trait PlaybackSink: Send + Sync {
    fn enqueue(&self, task: AudioTask);

    /// Stop the currently playing audio and its lip-sync immediately.
    fn stop_current(&self);

    /// Drop all queued playback tasks.
    fn clear_queue(&self);

    /// Whether any task is queued or playing.
    fn has_pending(&self) -> bool;
}

/// Avatar/character display state consumed by the renderer.
pub trait AvatarSink: Send + Sync {
    /// Display a new avatar model. The URL is already resolved against the
    /// base HTTP URL.
    fn set_model(&self, model: ModelInfo);

    /// Update the active character configuration name/uid.
    fn set_config(&self, name: Option<String>, uid: Option<String>);

    /// Replace the list of available character configurations.
    fn set_config_files(&self, files: Vec<ConfigFile>);
}

/// Severity of a user-facing transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-facing notifications (toasts). Localization happens on the
/// frontend side; the session passes stable English keys or server text.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, text: &str);
}
