//! Audio capture collaborator contract.
//!
//! The session does not touch the microphone directly; a capture
//! implementation (platform audio + VAD model) delivers speech-segmented
//! events through this seam. The callback sequence per detector instance is
//! strictly sequential: start → confirmed → frames → (end | misfire).

use crate::config::VadSettings;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Events emitted by a running capture driver.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Raw activity crossed the positive threshold. Provisional: may be
    /// retracted by a misfire.
    SpeechStart,
    /// Activity sustained across the redemption window; this is real speech.
    SpeechConfirmed,
    /// One processed audio frame with its speech probability.
    FrameProcessed { probability: f32, frame: Vec<f32> },
    /// Speech ended; carries the detector's concatenated utterance audio.
    SpeechEnd { audio: Vec<f32> },
    /// A provisional speech start was retracted without confirmation.
    Misfire,
}

/// One live detector instance.
#[async_trait]
pub trait CaptureDriver: Send {
    /// Start or resume capturing.
    async fn start(&mut self) -> anyhow::Result<()>;

    /// Pause capturing without releasing resources.
    fn pause(&mut self);

    /// Tear down the detector. A destroyed driver is never reused; the next
    /// start constructs a fresh instance with current settings.
    fn destroy(self: Box<Self>);
}

/// Constructs capture drivers.
///
/// Settings are baked in at construction; there is no hot-reload of
/// thresholds into a live detector. Implementations classify frame
/// probabilities with [`VadSettings::is_speech`] and
/// [`VadSettings::is_silence`] so the boundary semantics (inclusive
/// positive, exclusive negative) stay uniform across drivers.
#[async_trait]
pub trait CaptureFactory: Send + Sync {
    /// Build a detector that delivers events into `events`.
    async fn create(
        &self,
        settings: &VadSettings,
        events: mpsc::Sender<CaptureEvent>,
    ) -> anyhow::Result<Box<dyn CaptureDriver>>;
}
