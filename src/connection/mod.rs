//! Persistent backend connection with typed send/receive and automatic
//! reconnection.
//!
//! The manager owns exactly one logical connection to the conversation
//! backend. Connecting replaces any live transport; a dropped transport is
//! redialed after a fixed delay until `disconnect` is called. Inbound frames
//! are parsed into [`ServerMessage`] envelopes and broadcast to subscribers
//! in arrival order.

pub mod transport;

use crate::protocol::{ClientMessage, ServerMessage};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use transport::TransportFactory;

/// Delay between a transport drop and the next redial attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Broadcast capacity for message and state subscribers.
const SUBSCRIBER_CHANNEL_SIZE: usize = 256;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Render the state for logs and UI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

/// Requests the backend expects immediately after a connection opens.
///
/// This session-initialization handshake runs once per successful
/// connection, reconnects included.
const BOOTSTRAP_REQUESTS: [ClientMessage; 4] = [
    ClientMessage::FetchBackgrounds,
    ClientMessage::FetchConfigs,
    ClientMessage::FetchHistoryList,
    ClientMessage::CreateNewHistory,
];

struct Inner {
    factory: Arc<dyn TransportFactory>,
    reconnect_delay: Duration,
    state: Mutex<ConnectionState>,
    target_url: Mutex<Option<String>>,
    auto_reconnect: AtomicBool,
    /// Bumped on every connect/disconnect; stale connection tasks observe a
    /// mismatch and stop mutating shared state.
    generation: AtomicU64,
    outbound_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    reconnect_timer: Mutex<Option<JoinHandle<()>>>,
    connection_task: Mutex<Option<JoinHandle<()>>>,
    message_tx: broadcast::Sender<ServerMessage>,
    state_tx: broadcast::Sender<ConnectionState>,
}

impl Inner {
    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != next {
            debug!("connection state {} -> {}", state.as_str(), next.as_str());
            *state = next;
            let _ = self.state_tx.send(next);
        }
    }

    fn cancel_reconnect_timer(&self) {
        if let Some(timer) = self
            .reconnect_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            timer.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Handle to the single logical backend connection.
///
/// Cheap to clone; all clones refer to the same connection. Constructed once
/// at startup and passed to consumers rather than accessed as a global.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager with the production reconnect delay.
    #[must_use]
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self::with_reconnect_delay(factory, RECONNECT_DELAY)
    }

    /// Create a manager with a custom reconnect delay (tests use short or
    /// paused-clock delays).
    #[must_use]
    pub fn with_reconnect_delay(factory: Arc<dyn TransportFactory>, delay: Duration) -> Self {
        let (message_tx, _) = broadcast::channel(SUBSCRIBER_CHANNEL_SIZE);
        let (state_tx, _) = broadcast::channel(SUBSCRIBER_CHANNEL_SIZE);
        Self {
            inner: Arc::new(Inner {
                factory,
                reconnect_delay: delay,
                state: Mutex::new(ConnectionState::Closed),
                target_url: Mutex::new(None),
                auto_reconnect: AtomicBool::new(true),
                generation: AtomicU64::new(0),
                outbound_tx: Mutex::new(None),
                reconnect_timer: Mutex::new(None),
                connection_task: Mutex::new(None),
                message_tx,
                state_tx,
            }),
        }
    }

    /// Connect to `url`, replacing any live or pending connection.
    ///
    /// Cancels a pending reconnect timer, tears down an existing transport,
    /// and re-enables auto-reconnect.
    pub fn connect(&self, url: &str) {
        let inner = &self.inner;
        inner.cancel_reconnect_timer();
        *inner.target_url.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_owned());
        inner.auto_reconnect.store(true, Ordering::SeqCst);

        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Self::teardown_transport(inner);

        inner.set_state(ConnectionState::Connecting);
        let task = tokio::spawn(Self::run_connection(
            Arc::clone(inner),
            url.to_owned(),
            generation,
        ));
        *inner
            .connection_task
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(task);
    }

    /// Send a message when the connection is open.
    ///
    /// Fire-and-forget: when the connection is not open the message is
    /// dropped with a warning. Never errors, never queues.
    pub fn send(&self, message: &ClientMessage) {
        if self.state() != ConnectionState::Open {
            warn!(
                kind = message.kind(),
                "connection not open; dropping outbound message"
            );
            return;
        }
        let Some(text) = encode(message) else {
            return;
        };
        let guard = self
            .inner
            .outbound_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(tx) if tx.send(text).is_ok() => {}
            _ => warn!(
                kind = message.kind(),
                "transport gone; dropping outbound message"
            ),
        }
    }

    /// Disconnect and disable reconnection until the next `connect`.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        inner.auto_reconnect.store(false, Ordering::SeqCst);
        inner.cancel_reconnect_timer();
        inner.generation.fetch_add(1, Ordering::SeqCst);
        inner.set_state(ConnectionState::Closing);
        Self::teardown_transport(inner);
        inner.set_state(ConnectionState::Closed);
    }

    /// Subscribe to inbound messages, delivered in arrival order.
    #[must_use]
    pub fn subscribe_messages(&self) -> broadcast::Receiver<ServerMessage> {
        self.inner.message_tx.subscribe()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn teardown_transport(inner: &Arc<Inner>) {
        inner
            .outbound_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = inner
            .connection_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }

    async fn run_connection(inner: Arc<Inner>, url: String, generation: u64) {
        let mut transport = match inner.factory.connect(&url).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!(url, "failed to connect: {e}");
                if inner.is_current(generation) {
                    inner.set_state(ConnectionState::Closed);
                    Self::schedule_reconnect(&inner);
                }
                return;
            }
        };

        if !inner.is_current(generation) {
            transport.close().await;
            return;
        }

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        *inner
            .outbound_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(outbound_tx);
        inner.set_state(ConnectionState::Open);
        info!(url, "connected to backend");

        for request in &BOOTSTRAP_REQUESTS {
            let Some(text) = encode(request) else {
                continue;
            };
            if let Err(e) = transport.send_text(text).await {
                warn!("bootstrap request failed: {e}");
                break;
            }
        }

        loop {
            tokio::select! {
                outgoing = outbound_rx.recv() => {
                    let Some(text) = outgoing else { break };
                    if let Err(e) = transport.send_text(text).await {
                        warn!("send failed: {e}");
                        break;
                    }
                }
                incoming = transport.next_text() => {
                    match incoming {
                        Some(Ok(raw)) => match ServerMessage::parse(&raw) {
                            Ok(message) => {
                                let _ = inner.message_tx.send(message);
                            }
                            Err(e) => error!("dropping malformed message: {e}"),
                        },
                        Some(Err(e)) => {
                            warn!("transport error: {e}");
                            break;
                        }
                        None => {
                            info!("backend closed the connection");
                            break;
                        }
                    }
                }
            }
        }

        transport.close().await;
        if inner.is_current(generation) {
            inner
                .outbound_tx
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take();
            inner.set_state(ConnectionState::Closed);
            Self::schedule_reconnect(&inner);
        }
    }

    /// Schedule exactly one reconnect attempt after the fixed delay.
    ///
    /// Replaces any pending timer; retries indefinitely until `disconnect`.
    fn schedule_reconnect(inner: &Arc<Inner>) {
        if !inner.auto_reconnect.load(Ordering::SeqCst) {
            return;
        }
        let Some(url) = inner
            .target_url
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        else {
            return;
        };

        inner.cancel_reconnect_timer();
        info!(
            "reconnecting in {} seconds",
            inner.reconnect_delay.as_secs_f32()
        );

        let timer_inner = Arc::clone(inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timer_inner.reconnect_delay).await;
            if !timer_inner.auto_reconnect.load(Ordering::SeqCst) {
                return;
            }
            let manager = ConnectionManager {
                inner: Arc::clone(&timer_inner),
            };
            manager.connect(&url);
        });
        *inner
            .reconnect_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(timer);
    }
}

fn encode(message: &ClientMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(e) => {
            error!(kind = message.kind(), "failed to serialize message: {e}");
            None
        }
    }
}
