//! Shared test doubles: scripted transports for the connection manager and
//! recording collaborators for the session coordinator.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use hibiki::config::{AppConfig, VadSettings};
use hibiki::connection::transport::{Transport, TransportFactory};
use hibiki::connection::{ConnectionManager, ConnectionState};
use hibiki::protocol::{ConfigFile, ModelInfo};
use hibiki::session::{
    AudioTask, AvatarSink, CaptureDriver, CaptureEvent, CaptureFactory, NoticeLevel, Notifier,
    PlaybackSink, SessionCoordinator, SessionHandle,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted inbound frame.
pub enum Frame {
    Text(String),
    Error(String),
    Close,
}

/// Test-side handle to one accepted transport.
#[derive(Clone)]
pub struct TransportHandle {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
    inbound: mpsc::UnboundedSender<Frame>,
}

impl TransportHandle {
    /// Deliver a raw text frame from the fake backend.
    pub fn push_text(&self, raw: &str) {
        let _ = self.inbound.send(Frame::Text(raw.to_owned()));
    }

    /// Deliver a transport-level read error.
    pub fn push_error(&self, reason: &str) {
        let _ = self.inbound.send(Frame::Error(reason.to_owned()));
    }

    /// Close the connection from the backend side.
    pub fn close(&self) {
        let _ = self.inbound.send(Frame::Close);
    }

    /// Snapshot of frames the client has written so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// The `type` tags of frames the client has written so far.
    pub fn sent_kinds(&self) -> Vec<String> {
        self.sent().iter().map(|raw| kind_of(raw)).collect()
    }
}

struct ScriptedTransport {
    rx: mpsc::UnboundedReceiver<Frame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_text(&mut self, text: String) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<anyhow::Result<String>> {
        match self.rx.recv().await {
            Some(Frame::Text(text)) => Some(Ok(text)),
            Some(Frame::Error(reason)) => Some(Err(anyhow::anyhow!(reason))),
            Some(Frame::Close) | None => None,
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Transport factory with scripted accept/refuse outcomes.
///
/// Every accepted dial is recorded as a [`TransportHandle`] the test can
/// drive. An empty script means accept.
#[derive(Default)]
pub struct ScriptedFactory {
    outcomes: Mutex<VecDeque<bool>>,
    pub attempts: AtomicUsize,
    transports: Mutex<Vec<TransportHandle>>,
}

impl ScriptedFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue dial outcomes; `false` refuses the connection.
    pub fn script(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.outcomes.lock().unwrap().extend(outcomes);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Handle to the `index`-th accepted transport.
    pub fn transport(&self, index: usize) -> TransportHandle {
        self.transports.lock().unwrap()[index].clone()
    }

    pub fn transport_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }
}

#[async_trait]
impl TransportFactory for ScriptedFactory {
    async fn connect(&self, _url: &str) -> anyhow::Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let accept = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
        if !accept {
            anyhow::bail!("connection refused");
        }
        let (inbound, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        self.transports.lock().unwrap().push(TransportHandle {
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
            inbound,
        });
        Ok(Box::new(ScriptedTransport { rx, sent, closed }))
    }
}

/// Extract the `type` tag from a raw outbound frame.
pub fn kind_of(raw: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(raw).expect("outbound frame is JSON");
    value["type"].as_str().unwrap_or_default().to_owned()
}

/// Poll `cond` until it holds, panicking after a generous timeout.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}

/// Per-driver lifecycle counters.
#[derive(Default)]
pub struct DriverStats {
    pub starts: AtomicUsize,
    pub pauses: AtomicUsize,
    pub destroys: AtomicUsize,
}

struct MockDriver {
    stats: Arc<DriverStats>,
}

#[async_trait]
impl CaptureDriver for MockDriver {
    async fn start(&mut self) -> anyhow::Result<()> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) {
        self.stats.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(self: Box<Self>) {
        self.stats.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

/// Capture factory recording every created driver and the settings it saw.
#[derive(Default)]
pub struct MockCaptureFactory {
    pub fail: AtomicBool,
    pub drivers: Mutex<Vec<Arc<DriverStats>>>,
    pub settings_seen: Mutex<Vec<VadSettings>>,
    /// Event sender handed to the most recently created driver, so tests can
    /// inject capture events through the real channel.
    pub events: Mutex<Option<mpsc::Sender<CaptureEvent>>>,
}

impl MockCaptureFactory {
    pub fn driver(&self, index: usize) -> Arc<DriverStats> {
        Arc::clone(&self.drivers.lock().unwrap()[index])
    }

    pub fn created(&self) -> usize {
        self.drivers.lock().unwrap().len()
    }

    /// Inject a capture event through the channel of the latest driver.
    pub async fn emit(&self, event: CaptureEvent) {
        let sender = self
            .events
            .lock()
            .unwrap()
            .clone()
            .expect("a capture driver was created");
        sender.send(event).await.expect("session loop alive");
    }
}

#[async_trait]
impl CaptureFactory for MockCaptureFactory {
    async fn create(
        &self,
        settings: &VadSettings,
        events: mpsc::Sender<CaptureEvent>,
    ) -> anyhow::Result<Box<dyn CaptureDriver>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("no microphone available");
        }
        *self.events.lock().unwrap() = Some(events);
        self.settings_seen.lock().unwrap().push(settings.clone());
        let stats = Arc::new(DriverStats::default());
        self.drivers.lock().unwrap().push(Arc::clone(&stats));
        Ok(Box::new(MockDriver { stats }))
    }
}

/// Playback sink recording enqueued tasks and control calls.
#[derive(Default)]
pub struct RecordingPlayback {
    pub tasks: Mutex<Vec<AudioTask>>,
    pub stops: AtomicUsize,
    pub clears: AtomicUsize,
    pub pending: AtomicBool,
}

impl RecordingPlayback {
    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn set_pending(&self, value: bool) {
        self.pending.store(value, Ordering::SeqCst);
    }
}

impl PlaybackSink for RecordingPlayback {
    fn enqueue(&self, task: AudioTask) {
        self.tasks.lock().unwrap().push(task);
    }

    fn stop_current(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_queue(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn has_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Avatar sink recording display updates.
#[derive(Default)]
pub struct RecordingAvatar {
    pub models: Mutex<Vec<ModelInfo>>,
    pub configs: Mutex<Vec<(Option<String>, Option<String>)>>,
    pub config_files: Mutex<Vec<Vec<ConfigFile>>>,
}

impl AvatarSink for RecordingAvatar {
    fn set_model(&self, model: ModelInfo) {
        self.models.lock().unwrap().push(model);
    }

    fn set_config(&self, name: Option<String>, uid: Option<String>) {
        self.configs.lock().unwrap().push((name, uid));
    }

    fn set_config_files(&self, files: Vec<ConfigFile>) {
        self.config_files.lock().unwrap().push(files);
    }
}

/// Notifier recording every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, text: &str) {
        self.notices.lock().unwrap().push((level, text.to_owned()));
    }
}

/// A coordinator wired to recording collaborators and a scripted backend.
pub struct SessionFixture {
    pub coordinator: SessionCoordinator,
    pub handle: SessionHandle,
    pub connection: ConnectionManager,
    pub factory: Arc<ScriptedFactory>,
    pub capture: Arc<MockCaptureFactory>,
    pub playback: Arc<RecordingPlayback>,
    pub avatar: Arc<RecordingAvatar>,
    pub notifier: Arc<RecordingNotifier>,
}

impl SessionFixture {
    /// Build a fixture with an already-open backend connection.
    pub async fn connected() -> Self {
        Self::connected_with(&AppConfig::default()).await
    }

    /// Build a fixture with a custom config and an open backend connection.
    pub async fn connected_with(config: &AppConfig) -> Self {
        let fixture = Self::disconnected_with(config);
        fixture.connection.connect("ws://test/client-ws");
        let connection = fixture.connection.clone();
        wait_until(move || connection.state() == ConnectionState::Open).await;
        // Let the bootstrap handshake drain before tests inspect sends.
        let transport = fixture.factory.transport(0);
        wait_until(move || transport.sent().len() >= 4).await;
        fixture
    }

    /// Build a fixture without connecting.
    pub fn disconnected() -> Self {
        Self::disconnected_with(&AppConfig::default())
    }

    /// Build a disconnected fixture with a custom config.
    pub fn disconnected_with(config: &AppConfig) -> Self {
        let factory = ScriptedFactory::new();
        let connection =
            ConnectionManager::with_reconnect_delay(Arc::clone(&factory) as _, Duration::from_secs(10));
        let capture = Arc::new(MockCaptureFactory::default());
        let playback = Arc::new(RecordingPlayback::default());
        let avatar = Arc::new(RecordingAvatar::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (coordinator, handle) = SessionCoordinator::new(
            connection.clone(),
            Arc::clone(&capture) as _,
            Arc::clone(&playback) as _,
            Arc::clone(&avatar) as _,
            Arc::clone(&notifier) as _,
            config,
        );
        Self {
            coordinator,
            handle,
            connection,
            factory,
            capture,
            playback,
            avatar,
            notifier,
        }
    }

    /// Handle to the first accepted transport.
    pub fn transport(&self) -> TransportHandle {
        self.factory.transport(0)
    }

    /// Wait until `count` frames have been written after the bootstrap
    /// handshake, then return their `type` tags.
    pub async fn sends_after_bootstrap(&self, count: usize) -> Vec<String> {
        let transport = self.transport();
        let expected = 4 + count;
        wait_until(move || transport.sent().len() >= expected).await;
        self.transport().sent_kinds()[4..].to_vec()
    }

    /// Raw frames written after the bootstrap handshake.
    pub async fn raw_sends_after_bootstrap(&self, count: usize) -> Vec<String> {
        let transport = self.transport();
        let expected = 4 + count;
        wait_until(move || transport.sent().len() >= expected).await;
        self.transport().sent()[4..].to_vec()
    }
}
