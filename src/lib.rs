//! Hibiki: voice session core for an AI avatar companion.
//!
//! This crate implements the client side of a voice conversation with an AI
//! character backend:
//! Microphone → VAD → WebSocket backend → synthesized speech + avatar display
//!
//! # Architecture
//!
//! Two cooperating pieces, connected by async channels:
//! - **Connection**: A reconnecting WebSocket client
//!   ([`connection::ConnectionManager`]) that bootstraps each session and
//!   fans inbound messages out to subscribers
//! - **Session**: A single-loop state machine
//!   ([`session::SessionCoordinator`]) that coordinates VAD-driven recording
//!   with the AI's conversational turn, including interruption, buffering,
//!   and held-open multi-utterance capture
//!
//! Audio capture, playback, and avatar rendering live behind traits in
//! [`session`]; the crate itself is headless.

pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod session;

pub use config::{AppConfig, MicConfig, VadSettings, WebSocketConfig};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{Result, SessionError};
pub use protocol::{ClientMessage, MessageKind, ServerMessage};
pub use session::{SessionCoordinator, SessionHandle, TurnState};
