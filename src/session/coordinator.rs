//! Session coordinator: turn-taking state machine for voice interaction.
//!
//! One task owns every piece of mutable session state — the speech buffers,
//! the previous-turn snapshot, and the turn state itself — and consumes three
//! event sources: inbound backend messages, capture (VAD) events, and user
//! commands. All transitions happen on this single logical loop; collaborators
//! only observe derived state through watch handles.

use crate::config::{AppConfig, MicConfig, VadSettings};
use crate::connection::ConnectionManager;
use crate::error::{Result, SessionError};
use crate::protocol::{
    ChatMessage, ClientMessage, ControlCommand, MessageKind, Role, ServerMessage,
};
use crate::session::capture::{CaptureDriver, CaptureEvent, CaptureFactory};
use crate::session::frontend::{AudioTask, AvatarSink, Notifier, NoticeLevel, PlaybackSink};
use crate::session::history::ChatHistory;
use crate::session::turn::{TurnState, TurnStateHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Channel buffer sizes.
const COMMAND_CHANNEL_SIZE: usize = 32;
const CAPTURE_CHANNEL_SIZE: usize = 64;

/// Delay before the microphone restarts after a settings update.
const SETTINGS_RESTART_DELAY: Duration = Duration::from_millis(100);

/// User-initiated session commands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Start (or resume) the microphone. `hold_open` selects the
    /// multi-utterance accumulation mode: utterances are collected and sent
    /// as one payload on the next explicit stop.
    StartMic { hold_open: bool },
    /// Stop the microphone, flushing any buffered audio.
    StopMic,
    /// Replace VAD settings; restarts a running capture so the new detector
    /// picks up fresh thresholds.
    UpdateSettings(VadSettings),
    /// Interrupt the in-progress AI response (e.g. keyboard shortcut).
    Interrupt,
    /// Ask the backend for a fresh, empty history.
    NewHistory,
    /// Load an existing history and make it current.
    LoadHistory { uid: String },
    /// Delete a history. Deleting the current one also requests a fresh
    /// history so the session never points at a dead uid.
    DeleteHistory { uid: String },
    /// Switch the active character configuration.
    SwitchCharacter { file: String },
}

/// Cloneable handle for driving a running session and observing its state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    turn: watch::Receiver<TurnState>,
    mic_on: watch::Receiver<bool>,
    peak: watch::Receiver<f32>,
}

impl SessionHandle {
    /// Start the microphone in the default auto-flush mode.
    pub async fn start_mic(&self) -> Result<()> {
        self.send(SessionCommand::StartMic { hold_open: false }).await
    }

    /// Start the microphone in held-open (multi-utterance) mode.
    pub async fn start_mic_hold_open(&self) -> Result<()> {
        self.send(SessionCommand::StartMic { hold_open: true }).await
    }

    /// Stop the microphone, flushing any buffered audio.
    pub async fn stop_mic(&self) -> Result<()> {
        self.send(SessionCommand::StopMic).await
    }

    /// Replace VAD settings.
    pub async fn update_settings(&self, settings: VadSettings) -> Result<()> {
        self.send(SessionCommand::UpdateSettings(settings)).await
    }

    /// Interrupt the in-progress AI response.
    pub async fn interrupt(&self) -> Result<()> {
        self.send(SessionCommand::Interrupt).await
    }

    /// Ask the backend for a fresh, empty history.
    pub async fn new_history(&self) -> Result<()> {
        self.send(SessionCommand::NewHistory).await
    }

    /// Load an existing history and make it current.
    pub async fn load_history(&self, uid: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::LoadHistory { uid: uid.into() }).await
    }

    /// Delete a history by uid.
    pub async fn delete_history(&self, uid: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::DeleteHistory { uid: uid.into() }).await
    }

    /// Switch the active character configuration.
    pub async fn switch_character(&self, file: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::SwitchCharacter { file: file.into() }).await
    }

    /// Current AI turn state.
    #[must_use]
    pub fn turn_state(&self) -> TurnState {
        *self.turn.borrow()
    }

    /// Observe turn state changes.
    #[must_use]
    pub fn watch_turn(&self) -> watch::Receiver<TurnState> {
        self.turn.clone()
    }

    /// Whether the microphone is currently active.
    #[must_use]
    pub fn is_mic_on(&self) -> bool {
        *self.mic_on.borrow()
    }

    /// Peak speech probability observed in the current utterance (UI meter).
    #[must_use]
    pub fn peak_probability(&self) -> f32 {
        *self.peak.borrow()
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Channel("session loop stopped".to_owned()))
    }
}

/// The session state machine.
pub struct SessionCoordinator {
    connection: ConnectionManager,
    capture_factory: Arc<dyn CaptureFactory>,
    playback: Arc<dyn PlaybackSink>,
    avatar: Arc<dyn AvatarSink>,
    notifier: Arc<dyn Notifier>,

    turn: TurnStateHandle,
    history: ChatHistory,
    settings: VadSettings,
    mic_config: MicConfig,
    base_url: String,

    capture: Option<Box<dyn CaptureDriver>>,
    capture_tx: mpsc::Sender<CaptureEvent>,
    capture_rx: Option<mpsc::Receiver<CaptureEvent>>,
    command_tx: mpsc::Sender<SessionCommand>,
    command_rx: Option<mpsc::Receiver<SessionCommand>>,
    mic_tx: watch::Sender<bool>,
    peak_tx: watch::Sender<f32>,

    // Per-speech-session state. `previous_turn` is the turn state snapshot
    // taken at the provisional speech start; the interrupt decision at
    // confirmation is based on it, never on the live state.
    speech_open: bool,
    interrupt_sent: bool,
    previous_turn: TurnState,
    frames: Vec<Vec<f32>>,
    peak_probability: f32,

    hold_open: bool,
    held_utterances: Vec<Vec<f32>>,

    backend_synth_complete: bool,
    client_uid: Option<String>,
    group_members: Vec<String>,
    is_group_owner: bool,

    restart_timer: Option<JoinHandle<()>>,
}

impl SessionCoordinator {
    /// Build a coordinator and its control handle.
    #[must_use]
    pub fn new(
        connection: ConnectionManager,
        capture_factory: Arc<dyn CaptureFactory>,
        playback: Arc<dyn PlaybackSink>,
        avatar: Arc<dyn AvatarSink>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (capture_tx, capture_rx) = mpsc::channel(CAPTURE_CHANNEL_SIZE);
        let turn = TurnStateHandle::new();
        let mic_tx = watch::Sender::new(false);
        let peak_tx = watch::Sender::new(0.0);

        let handle = SessionHandle {
            commands: command_tx.clone(),
            turn: turn.subscribe(),
            mic_on: mic_tx.subscribe(),
            peak: peak_tx.subscribe(),
        };

        let coordinator = Self {
            connection,
            capture_factory,
            playback,
            avatar,
            notifier,
            turn,
            history: ChatHistory::new(),
            settings: config.vad.clone(),
            mic_config: config.mic.clone(),
            base_url: config.websocket.base_url.clone(),
            capture: None,
            capture_tx,
            capture_rx: Some(capture_rx),
            command_tx,
            command_rx: Some(command_rx),
            mic_tx,
            peak_tx,
            speech_open: false,
            interrupt_sent: false,
            previous_turn: TurnState::Idle,
            frames: Vec::new(),
            peak_probability: 0.0,
            hold_open: false,
            held_utterances: Vec::new(),
            backend_synth_complete: false,
            client_uid: None,
            group_members: Vec::new(),
            is_group_owner: false,
            restart_timer: None,
        };
        (coordinator, handle)
    }

    /// Run the session loop until every command handle is dropped.
    pub async fn run(mut self) {
        let (Some(mut command_rx), Some(mut capture_rx)) =
            (self.command_rx.take(), self.capture_rx.take())
        else {
            error!("session coordinator already running");
            return;
        };
        let mut messages = self.connection.subscribe_messages();

        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Ok(message) => self.handle_message(message).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session fell behind on backend messages");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                command = command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = capture_rx.recv() => {
                    if let Some(event) = event {
                        self.handle_capture_event(event).await;
                    }
                }
            }
        }
        info!("session loop stopped");
    }

    // ----- commands -----

    /// Apply one user command.
    pub async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::StartMic { hold_open } => {
                // Cancel-and-replace: an explicit start supersedes a pending
                // settings-restart timer.
                self.cancel_restart_timer();
                self.start_mic(hold_open).await;
            }
            SessionCommand::StopMic => {
                self.cancel_restart_timer();
                self.stop_mic().await;
            }
            SessionCommand::UpdateSettings(settings) => self.update_settings(settings).await,
            SessionCommand::Interrupt => self.interrupt(true).await,
            SessionCommand::NewHistory => {
                self.connection.send(&ClientMessage::CreateNewHistory);
            }
            SessionCommand::LoadHistory { uid } => {
                self.history.set_current_uid(uid.clone());
                self.connection
                    .send(&ClientMessage::FetchAndSetHistory { history_uid: uid });
            }
            SessionCommand::DeleteHistory { uid } => {
                let deleting_current = self.history.current_uid() == Some(uid.as_str());
                self.connection
                    .send(&ClientMessage::DeleteHistory { history_uid: uid });
                if deleting_current {
                    self.connection.send(&ClientMessage::CreateNewHistory);
                }
            }
            SessionCommand::SwitchCharacter { file } => {
                self.turn.set(TurnState::Loading);
                self.connection.send(&ClientMessage::SwitchConfig { file });
            }
        }
    }

    async fn start_mic(&mut self, hold_open: bool) {
        self.hold_open = hold_open;
        if let Some(driver) = self.capture.as_mut() {
            debug!("resuming paused capture");
            if let Err(e) = driver.start().await {
                error!("failed to resume capture: {e}");
                self.notifier
                    .notify(NoticeLevel::Error, "failed to start voice capture");
                return;
            }
            self.set_mic_on(true);
            return;
        }

        match self
            .capture_factory
            .create(&self.settings, self.capture_tx.clone())
            .await
        {
            Ok(mut driver) => {
                if let Err(e) = driver.start().await {
                    error!("failed to start capture: {e}");
                    self.notifier
                        .notify(NoticeLevel::Error, "failed to start voice capture");
                    driver.destroy();
                    return;
                }
                self.capture = Some(driver);
                self.set_mic_on(true);
                info!(hold_open, "microphone started");
            }
            Err(e) => {
                // Capture state is left unchanged: mic stays off.
                error!("failed to initialize capture: {e}");
                self.notifier
                    .notify(NoticeLevel::Error, "failed to start voice capture");
            }
        }
    }

    async fn stop_mic(&mut self) {
        // Capture and clear every buffer synchronously before teardown so a
        // subsequent start never observes stale frames.
        let mut pending = std::mem::take(&mut self.held_utterances);
        if self.speech_open {
            pending.append(&mut self.frames);
        }
        self.frames.clear();
        self.close_speech_session();
        self.hold_open = false;

        let total: usize = pending.iter().map(Vec::len).sum();
        if total > 0 {
            let mut audio = Vec::with_capacity(total);
            for chunk in &pending {
                audio.extend_from_slice(chunk);
            }
            info!(samples = total, "flushing buffered audio on stop");
            self.connection.send(&ClientMessage::audio_input(&audio));
            self.turn.set(TurnState::ThinkingSpeaking);
        } else if self.turn.get() == TurnState::Listening {
            self.turn.set(TurnState::Idle);
        }

        if let Some(mut driver) = self.capture.take() {
            driver.pause();
            driver.destroy();
            debug!("capture destroyed");
        }
        self.set_mic_on(false);
    }

    async fn update_settings(&mut self, settings: VadSettings) {
        info!(
            positive = settings.positive_speech_threshold,
            negative = settings.negative_speech_threshold,
            redemption = settings.redemption_frames,
            "updating VAD settings"
        );
        self.settings = settings;
        if !self.is_mic_on() {
            return;
        }
        // A live detector cannot hot-reload thresholds: full stop (flushing
        // pending audio), then a delayed restart with the new settings.
        let hold_open = self.hold_open;
        self.stop_mic().await;
        self.schedule_restart(hold_open);
    }

    fn schedule_restart(&mut self, hold_open: bool) {
        self.cancel_restart_timer();
        let commands = self.command_tx.clone();
        self.restart_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(SETTINGS_RESTART_DELAY).await;
            let _ = commands.send(SessionCommand::StartMic { hold_open }).await;
        }));
    }

    fn cancel_restart_timer(&mut self) {
        if let Some(timer) = self.restart_timer.take() {
            timer.abort();
        }
    }

    // ----- capture events -----

    /// Apply one capture (VAD) event.
    pub async fn handle_capture_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::SpeechStart => self.on_speech_start(),
            CaptureEvent::SpeechConfirmed => self.on_speech_confirmed().await,
            CaptureEvent::FrameProcessed { probability, frame } => {
                self.on_frame(probability, frame);
            }
            CaptureEvent::SpeechEnd { audio } => self.on_speech_end(audio).await,
            CaptureEvent::Misfire => self.on_misfire(),
        }
    }

    /// Provisional speech start: snapshot the turn state and open a buffer,
    /// but change nothing visible yet — this may be a false positive.
    fn on_speech_start(&mut self) {
        debug!(
            previous = self.turn.get().as_str(),
            "speech started (provisional)"
        );
        self.previous_turn = self.turn.get();
        self.speech_open = true;
        self.interrupt_sent = false;
        self.frames.clear();
    }

    /// Confirmed speech: interrupt the AI exactly once if it was speaking
    /// when this speech session began, then switch to listening.
    async fn on_speech_confirmed(&mut self) {
        if !self.speech_open {
            debug!("ignoring stray speech confirmation");
            return;
        }
        if self.previous_turn == TurnState::ThinkingSpeaking && !self.interrupt_sent {
            self.interrupt(true).await;
            self.interrupt_sent = true;
        }
        self.turn.set(TurnState::Listening);
    }

    fn on_frame(&mut self, probability: f32, frame: Vec<f32>) {
        if probability > self.peak_probability {
            self.peak_probability = probability;
            self.peak_tx.send_replace(probability);
        }
        if self.speech_open {
            self.frames.push(frame);
        }
    }

    async fn on_speech_end(&mut self, audio: Vec<f32>) {
        if !self.speech_open {
            debug!("ignoring stray speech end");
            return;
        }
        self.playback.clear_queue();
        self.frames.clear();
        self.close_speech_session();

        if self.hold_open {
            debug!(samples = audio.len(), "holding utterance for combined send");
            self.held_utterances.push(audio);
        } else {
            self.connection.send(&ClientMessage::audio_input(&audio));
            self.turn.set(TurnState::ThinkingSpeaking);
            if self.mic_config.auto_stop_mic {
                self.stop_mic().await;
            }
        }
    }

    fn on_misfire(&mut self) {
        if !self.speech_open {
            return;
        }
        debug!(
            restored = self.previous_turn.as_str(),
            "VAD misfire; discarding provisional buffer"
        );
        self.frames.clear();
        self.close_speech_session();
        // No interrupt was sent for an unconfirmed session, so restoring the
        // snapshot undoes everything.
        self.turn.set(self.previous_turn);
    }

    fn close_speech_session(&mut self) {
        self.speech_open = false;
        self.interrupt_sent = false;
        self.peak_probability = 0.0;
        self.peak_tx.send_replace(0.0);
    }

    /// Cut off the in-progress AI response.
    ///
    /// `send_signal` is false when the interrupt originated from the backend
    /// itself, to avoid echoing the signal back.
    async fn interrupt(&mut self, send_signal: bool) {
        if self.turn.get() != TurnState::ThinkingSpeaking {
            return;
        }
        info!("interrupting AI response");
        self.playback.stop_current();
        self.playback.clear_queue();
        self.turn.set(TurnState::Interrupted);
        if send_signal {
            let text = self.history.take_response();
            self.connection
                .send(&ClientMessage::InterruptSignal { text });
        } else {
            self.history.clear_response();
        }
        if self.mic_config.auto_start_on_interrupt && !self.is_mic_on() {
            self.start_mic(false).await;
        }
    }

    // ----- backend messages -----

    /// Dispatch one inbound backend message to its handler.
    ///
    /// Exactly one handler runs per message; unknown types are logged and
    /// dropped.
    pub async fn handle_message(&mut self, message: ServerMessage) {
        let Some(kind) = message.known_kind() else {
            warn!(kind = %message.kind, "unknown server message type");
            return;
        };
        match kind {
            MessageKind::Control => self.handle_control(message.text.as_deref()).await,
            MessageKind::SetModelAndConf => self.handle_set_model(message),
            MessageKind::ConfigFiles => {
                if let Some(files) = message.configs {
                    self.avatar.set_config_files(files);
                }
            }
            MessageKind::ConfigSwitched => {
                self.turn.set(TurnState::Idle);
                self.notifier
                    .notify(NoticeLevel::Success, "character switched");
                self.connection.send(&ClientMessage::FetchHistoryList);
                self.connection.send(&ClientMessage::CreateNewHistory);
            }
            MessageKind::Audio => self.handle_audio(message),
            MessageKind::HistoryData => {
                if let Some(messages) = message.messages {
                    self.history.set_messages(messages);
                }
                self.notifier.notify(NoticeLevel::Success, "history loaded");
            }
            MessageKind::NewHistoryCreated => {
                self.turn.set(TurnState::Idle);
                if let Some(uid) = message.history_uid {
                    self.history.start_new(uid);
                    self.notifier
                        .notify(NoticeLevel::Success, "new chat history created");
                }
            }
            MessageKind::HistoryDeleted => {
                if message.success.unwrap_or_default() {
                    self.notifier.notify(NoticeLevel::Success, "history deleted");
                } else {
                    self.notifier
                        .notify(NoticeLevel::Error, "failed to delete history");
                }
            }
            MessageKind::HistoryList => {
                if let Some(histories) = message.histories {
                    if let Some(first) = histories.first() {
                        self.history.set_current_uid(first.uid.clone());
                    }
                    self.history.set_history_list(histories);
                }
            }
            MessageKind::UserInputTranscription => {
                if let Some(text) = message.text {
                    self.history.push_human(text);
                }
            }
            MessageKind::Error => {
                let text = message.message.as_deref().unwrap_or("backend error");
                self.notifier.notify(NoticeLevel::Error, text);
            }
            MessageKind::GroupUpdate => {
                if let Some(members) = message.members {
                    self.group_members = members;
                }
                if let Some(is_owner) = message.is_owner {
                    self.is_group_owner = is_owner;
                }
            }
            MessageKind::GroupOperationResult => {
                let level = if message.success.unwrap_or_default() {
                    NoticeLevel::Success
                } else {
                    NoticeLevel::Error
                };
                if let Some(text) = message.message {
                    self.notifier.notify(level, &text);
                }
            }
            MessageKind::BackendSynthComplete => self.backend_synth_complete = true,
            MessageKind::ConversationChainEnd => self.on_conversation_chain_end().await,
            MessageKind::ForceNewMessage => self.history.set_force_new_message(true),
            // Backend-initiated interrupt runs the local path but must not
            // echo the signal back.
            MessageKind::InterruptSignal => self.interrupt(false).await,
            MessageKind::ToolCallStatus => self.handle_tool_call(message),
            // Routine playback acknowledgement; deliberately silent.
            MessageKind::FrontendPlaybackComplete => {}
        }
    }

    async fn handle_control(&mut self, text: Option<&str>) {
        let Some(raw) = text else {
            warn!("control message without a sub-command");
            return;
        };
        match ControlCommand::parse(raw) {
            Some(ControlCommand::StartMic) => {
                self.cancel_restart_timer();
                self.start_mic(false).await;
            }
            Some(ControlCommand::StopMic) => {
                self.cancel_restart_timer();
                self.stop_mic().await;
            }
            Some(ControlCommand::ConversationChainStart) => {
                self.turn.set(TurnState::ThinkingSpeaking);
                self.backend_synth_complete = false;
                self.playback.clear_queue();
                self.history.clear_response();
            }
            Some(ControlCommand::ConversationChainEnd) => {
                self.on_conversation_chain_end().await;
            }
            None => warn!(command = raw, "unknown control sub-command"),
        }
    }

    async fn on_conversation_chain_end(&mut self) {
        if self.playback.has_pending() {
            debug!("chain ended with playback pending; keeping turn state");
            return;
        }
        if self.turn.get() == TurnState::ThinkingSpeaking {
            self.turn.set(TurnState::Idle);
            if self.mic_config.auto_start_on_conversation_end {
                self.start_mic(false).await;
            }
        }
    }

    fn handle_set_model(&mut self, message: ServerMessage) {
        self.turn.set(TurnState::Loading);
        if message.conf_name.is_some() || message.conf_uid.is_some() {
            self.avatar
                .set_config(message.conf_name, message.conf_uid);
        }
        if let Some(uid) = message.client_uid {
            self.client_uid = Some(uid);
        }
        if let Some(mut info) = message.model_info {
            info.resolve_url(&self.base_url);
            self.avatar.set_model(info);
        }
        self.turn.set(TurnState::Idle);
    }

    fn handle_audio(&mut self, message: ServerMessage) {
        let state = self.turn.get();
        if matches!(state, TurnState::Interrupted | TurnState::Listening) {
            debug!(state = state.as_str(), "discarding synthesized audio");
            return;
        }
        if let Some(display) = &message.display_text {
            self.history.append_response(&display.text);
        }
        self.playback.enqueue(AudioTask {
            audio_base64: message.audio.unwrap_or_default(),
            volumes: message.volumes.unwrap_or_default(),
            slice_length: message.slice_length.unwrap_or_default(),
            display_text: message.display_text,
            expressions: message
                .actions
                .and_then(|actions| actions.expressions)
                .unwrap_or_default(),
            forwarded: message.forwarded.unwrap_or_default(),
        });
    }

    fn handle_tool_call(&mut self, message: ServerMessage) {
        let (Some(tool_id), Some(tool_name), Some(status)) =
            (message.tool_id, message.tool_name, message.status)
        else {
            return;
        };
        self.history.upsert_tool_call(ChatMessage {
            id: Some(tool_id.clone()),
            content: message.content.unwrap_or_default(),
            role: Role::Ai,
            timestamp: message
                .timestamp
                .or_else(|| Some(chrono::Utc::now().to_rfc3339())),
            name: message.name,
            kind: Some("tool_call_status".to_owned()),
            tool_id: Some(tool_id),
            tool_name: Some(tool_name),
            status: Some(status),
            ..ChatMessage::default()
        });
    }

    // ----- observers -----

    /// Conversation history state (messages, listing, partial response).
    #[must_use]
    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Current AI turn state.
    #[must_use]
    pub fn turn_state(&self) -> TurnState {
        self.turn.get()
    }

    /// Whether the microphone is active.
    #[must_use]
    pub fn is_mic_on(&self) -> bool {
        *self.mic_tx.borrow()
    }

    /// Active VAD settings.
    #[must_use]
    pub fn vad_settings(&self) -> &VadSettings {
        &self.settings
    }

    /// Peak speech probability for the current utterance.
    #[must_use]
    pub fn peak_probability(&self) -> f32 {
        self.peak_probability
    }

    /// This client's uid as assigned by the backend, if any.
    #[must_use]
    pub fn client_uid(&self) -> Option<&str> {
        self.client_uid.as_deref()
    }

    /// Current group membership, when in a group session.
    #[must_use]
    pub fn group_members(&self) -> &[String] {
        &self.group_members
    }

    /// Whether this client owns the current group session.
    #[must_use]
    pub fn is_group_owner(&self) -> bool {
        self.is_group_owner
    }

    /// Whether the backend has finished synthesizing the current response.
    /// Playback may still be draining when this turns true.
    #[must_use]
    pub fn backend_synth_complete(&self) -> bool {
        self.backend_synth_complete
    }

    fn set_mic_on(&self, value: bool) {
        self.mic_tx.send_replace(value);
    }
}
