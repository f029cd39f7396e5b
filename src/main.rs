//! Headless session runner.
//!
//! Connects to the configured backend and runs the session loop until
//! Ctrl+C. Playback, avatar, and notifications are logged; audio capture is
//! reported unavailable (platform capture lives in the embedding
//! application, which injects its own implementations).

use async_trait::async_trait;
use hibiki::config::{AppConfig, VadSettings};
use hibiki::connection::ConnectionManager;
use hibiki::connection::transport::WsTransportFactory;
use hibiki::protocol::{ConfigFile, ModelInfo};
use hibiki::session::{
    AudioTask, AvatarSink, CaptureDriver, CaptureEvent, CaptureFactory, NoticeLevel, Notifier,
    PlaybackSink, SessionCoordinator,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Logs playback tasks instead of playing them.
#[derive(Default)]
struct LogPlayback {
    queued: AtomicUsize,
}

impl PlaybackSink for LogPlayback {
    fn enqueue(&self, task: AudioTask) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        let text = task
            .display_text
            .as_ref()
            .map_or("", |display| display.text.as_str());
        info!(bytes = task.audio_base64.len(), text, "audio task queued");
    }

    fn stop_current(&self) {
        info!("playback stopped");
    }

    fn clear_queue(&self) {
        self.queued.store(0, Ordering::Relaxed);
    }

    fn has_pending(&self) -> bool {
        self.queued.load(Ordering::Relaxed) > 0
    }
}

struct LogAvatar;

impl AvatarSink for LogAvatar {
    fn set_model(&self, model: ModelInfo) {
        info!(name = ?model.name, url = ?model.url, "avatar model set");
    }

    fn set_config(&self, name: Option<String>, uid: Option<String>) {
        info!(?name, ?uid, "character config set");
    }

    fn set_config_files(&self, files: Vec<ConfigFile>) {
        info!(count = files.len(), "character config list updated");
    }
}

struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, text: &str) {
        match level {
            NoticeLevel::Error => warn!(text, "notice"),
            NoticeLevel::Info | NoticeLevel::Success => info!(text, "notice"),
        }
    }
}

/// No microphone in the headless runner.
struct NoCapture;

#[async_trait]
impl CaptureFactory for NoCapture {
    async fn create(
        &self,
        _settings: &VadSettings,
        _events: mpsc::Sender<CaptureEvent>,
    ) -> anyhow::Result<Box<dyn CaptureDriver>> {
        anyhow::bail!("audio capture is not available in the headless runner")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing — default to our own info logs; override with
    // RUST_LOG for more.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hibiki=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(std::path::Path::new(&path))?,
        None => AppConfig::load_default()?,
    };

    info!(url = %config.websocket.ws_url, "starting session");

    let connection = ConnectionManager::new(Arc::new(WsTransportFactory));
    let (coordinator, handle) = SessionCoordinator::new(
        connection.clone(),
        Arc::new(NoCapture),
        Arc::new(LogPlayback::default()),
        Arc::new(LogAvatar),
        Arc::new(LogNotifier),
        &config,
    );
    let session = tokio::spawn(coordinator.run());

    connection.connect(&config.websocket.ws_url);

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down");
    let _ = handle.stop_mic().await;
    connection.disconnect();
    session.abort();
    Ok(())
}
