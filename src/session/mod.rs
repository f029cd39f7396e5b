//! Voice session: turn-taking state machine and its collaborator seams.
//!
//! The [`coordinator::SessionCoordinator`] owns all mutable session state and
//! consumes backend messages, capture events, and user commands on a single
//! loop. Capture, playback, avatar display, and notifications are injected
//! behind traits so the core stays headless and testable.

pub mod capture;
pub mod coordinator;
pub mod frontend;
pub mod history;
pub mod turn;

pub use capture::{CaptureDriver, CaptureEvent, CaptureFactory};
pub use coordinator::{SessionCommand, SessionCoordinator, SessionHandle};
pub use frontend::{AudioTask, AvatarSink, NoticeLevel, Notifier, PlaybackSink};
pub use history::ChatHistory;
pub use turn::{TurnState, TurnStateHandle};
