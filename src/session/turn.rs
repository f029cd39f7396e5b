//! AI turn state, owned by the session and published to UI collaborators.

use tokio::sync::watch;
use tracing::debug;

/// Whose conversational turn it is, as displayed by the avatar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnState {
    /// Nobody is speaking; the avatar is at rest.
    #[default]
    Idle,
    /// The user is speaking and the AI is listening.
    Listening,
    /// The AI is generating and/or speaking a response.
    ThinkingSpeaking,
    /// An in-progress AI response was cut off by the user.
    Interrupted,
    /// A character/model switch is in progress.
    Loading,
}

impl TurnState {
    /// Render the state for logs and UI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::ThinkingSpeaking => "thinking-speaking",
            Self::Interrupted => "interrupted",
            Self::Loading => "loading",
        }
    }
}

/// Writable turn-state slot. Only the session coordinator holds this;
/// collaborators observe through [`TurnStateHandle::subscribe`].
#[derive(Debug)]
pub struct TurnStateHandle {
    tx: watch::Sender<TurnState>,
}

impl Default for TurnStateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnStateHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(TurnState::default()),
        }
    }

    /// Current turn state.
    #[must_use]
    pub fn get(&self) -> TurnState {
        *self.tx.borrow()
    }

    /// Transition to `next`, notifying observers.
    pub fn set(&self, next: TurnState) {
        let previous = self.tx.send_replace(next);
        if previous != next {
            debug!("turn state {} -> {}", previous.as_str(), next.as_str());
        }
    }

    /// Read-only observer for UI collaborators.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TurnState> {
        self.tx.subscribe()
    }
}
