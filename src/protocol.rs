//! Typed wire protocol for the backend session channel.
//!
//! The backend speaks JSON text frames. Every frame carries a `type` string
//! used as the sole dispatch key; all other fields are optional and vary by
//! type. Unknown types and unknown fields must never fail envelope parsing.

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Known inbound message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Control,
    SetModelAndConf,
    ConfigFiles,
    ConfigSwitched,
    Audio,
    HistoryData,
    NewHistoryCreated,
    HistoryDeleted,
    HistoryList,
    UserInputTranscription,
    Error,
    GroupUpdate,
    GroupOperationResult,
    BackendSynthComplete,
    ConversationChainEnd,
    ForceNewMessage,
    InterruptSignal,
    ToolCallStatus,
    /// Routine playback-completion acknowledgement. Dispatched as a no-op
    /// and never reported as an unknown type.
    FrontendPlaybackComplete,
}

impl MessageKind {
    /// Render the message type to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::SetModelAndConf => "set-model-and-conf",
            Self::ConfigFiles => "config-files",
            Self::ConfigSwitched => "config-switched",
            Self::Audio => "audio",
            Self::HistoryData => "history-data",
            Self::NewHistoryCreated => "new-history-created",
            Self::HistoryDeleted => "history-deleted",
            Self::HistoryList => "history-list",
            Self::UserInputTranscription => "user-input-transcription",
            Self::Error => "error",
            Self::GroupUpdate => "group-update",
            Self::GroupOperationResult => "group-operation-result",
            Self::BackendSynthComplete => "backend-synth-complete",
            Self::ConversationChainEnd => "conversation-chain-end",
            Self::ForceNewMessage => "force-new-message",
            Self::InterruptSignal => "interrupt-signal",
            Self::ToolCallStatus => "tool_call_status",
            Self::FrontendPlaybackComplete => "frontend-playback-complete",
        }
    }

    /// Parse a message type from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "control" => Some(Self::Control),
            "set-model-and-conf" => Some(Self::SetModelAndConf),
            "config-files" => Some(Self::ConfigFiles),
            "config-switched" => Some(Self::ConfigSwitched),
            "audio" => Some(Self::Audio),
            "history-data" => Some(Self::HistoryData),
            "new-history-created" => Some(Self::NewHistoryCreated),
            "history-deleted" => Some(Self::HistoryDeleted),
            "history-list" => Some(Self::HistoryList),
            "user-input-transcription" => Some(Self::UserInputTranscription),
            "error" => Some(Self::Error),
            "group-update" => Some(Self::GroupUpdate),
            "group-operation-result" => Some(Self::GroupOperationResult),
            "backend-synth-complete" => Some(Self::BackendSynthComplete),
            "conversation-chain-end" => Some(Self::ConversationChainEnd),
            "force-new-message" => Some(Self::ForceNewMessage),
            "interrupt-signal" => Some(Self::InterruptSignal),
            "tool_call_status" => Some(Self::ToolCallStatus),
            "frontend-playback-complete" => Some(Self::FrontendPlaybackComplete),
            _ => None,
        }
    }
}

/// Sub-commands carried by `control` messages in the `text` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    StartMic,
    StopMic,
    ConversationChainStart,
    ConversationChainEnd,
}

impl ControlCommand {
    /// Parse a control sub-command from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "start-mic" => Some(Self::StartMic),
            "stop-mic" => Some(Self::StopMic),
            "conversation-chain-start" => Some(Self::ConversationChainStart),
            "conversation-chain-end" => Some(Self::ConversationChainEnd),
            _ => None,
        }
    }
}

/// Subtitle text attached to a synthesized audio chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayText {
    pub text: String,
    pub name: String,
    pub avatar: String,
}

/// An avatar expression reference: servers send either an index or a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Index(i64),
    Name(String),
}

/// Non-verbal actions attached to a synthesized audio chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actions {
    pub expressions: Option<Vec<Expression>>,
    pub pictures: Option<Vec<String>>,
    pub sounds: Option<Vec<String>>,
}

/// Avatar model descriptor sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl ModelInfo {
    /// Resolve a relative model URL against the configured base HTTP URL.
    ///
    /// Absolute URLs are left untouched.
    pub fn resolve_url(&mut self, base_url: &str) {
        let Some(raw) = self.url.as_deref() else {
            return;
        };
        if raw.starts_with("http") {
            return;
        }
        match url::Url::parse(base_url).and_then(|base| base.join(raw)) {
            Ok(resolved) => self.url = Some(resolved.to_string()),
            Err(e) => {
                warn!(base_url, url = raw, "failed to resolve model URL: {e}");
            }
        }
    }
}

/// A character configuration file advertised by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub name: String,
    pub filename: String,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Ai,
    Human,
}

/// One conversation history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    pub id: Option<String>,
    pub content: String,
    pub role: Role,
    pub timestamp: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    /// `"text"` (implied when absent) or `"tool_call_status"`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tool_id: Option<String>,
    pub tool_name: Option<String>,
    pub status: Option<String>,
}

/// Latest message preview inside a history listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestMessage {
    pub role: Role,
    pub timestamp: Option<String>,
    pub content: String,
}

/// One conversation history in the backend's history list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryInfo {
    pub uid: String,
    pub latest_message: Option<LatestMessage>,
    pub timestamp: Option<String>,
}

/// Inbound message envelope.
///
/// Deserialized leniently: every payload field is optional so that an absent
/// or unknown field never fails envelope parsing. The `type` tag is kept as
/// the raw string so unrecognized types can still be logged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: String,

    pub text: Option<String>,
    pub audio: Option<String>,
    pub volumes: Option<Vec<f32>>,
    pub slice_length: Option<u32>,
    pub display_text: Option<DisplayText>,
    pub actions: Option<Actions>,
    pub forwarded: Option<bool>,

    pub model_info: Option<ModelInfo>,
    pub conf_name: Option<String>,
    pub conf_uid: Option<String>,
    pub client_uid: Option<String>,
    pub configs: Option<Vec<ConfigFile>>,

    pub messages: Option<Vec<ChatMessage>>,
    pub histories: Option<Vec<HistoryInfo>>,
    pub history_uid: Option<String>,
    pub success: Option<bool>,
    pub message: Option<String>,

    pub members: Option<Vec<String>>,
    pub is_owner: Option<bool>,

    pub tool_id: Option<String>,
    pub tool_name: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub content: Option<String>,
    pub timestamp: Option<String>,
}

impl ServerMessage {
    /// Parse a raw JSON text frame into a message envelope.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the frame is not a JSON object with the
    /// expected field shapes.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        serde_json::from_str(raw).map_err(|e| crate::error::SessionError::Protocol(e.to_string()))
    }

    /// The message type, when recognized.
    #[must_use]
    pub fn known_kind(&self) -> Option<MessageKind> {
        MessageKind::parse(&self.kind)
    }
}

/// Outbound messages sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    FetchBackgrounds,
    FetchConfigs,
    FetchHistoryList,
    CreateNewHistory,
    FetchAndSetHistory { history_uid: String },
    DeleteHistory { history_uid: String },
    SwitchConfig { file: String },
    InterruptSignal { text: String },
    AudioInput { audio: String },
}

impl ClientMessage {
    /// Wrap raw f32 microphone frames as a base64 `audio-input` payload.
    ///
    /// Samples are encoded as little-endian IEEE-754 bytes, matching the
    /// backend's expected microphone format.
    #[must_use]
    pub fn audio_input(samples: &[f32]) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Self::AudioInput {
            audio: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// The wire `type` tag of this message, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FetchBackgrounds => "fetch-backgrounds",
            Self::FetchConfigs => "fetch-configs",
            Self::FetchHistoryList => "fetch-history-list",
            Self::CreateNewHistory => "create-new-history",
            Self::FetchAndSetHistory { .. } => "fetch-and-set-history",
            Self::DeleteHistory { .. } => "delete-history",
            Self::SwitchConfig { .. } => "switch-config",
            Self::InterruptSignal { .. } => "interrupt-signal",
            Self::AudioInput { .. } => "audio-input",
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn message_kinds_round_trip_through_wire_format() {
        let kinds = [
            MessageKind::Control,
            MessageKind::SetModelAndConf,
            MessageKind::Audio,
            MessageKind::HistoryList,
            MessageKind::InterruptSignal,
            MessageKind::ToolCallStatus,
            MessageKind::FrontendPlaybackComplete,
        ];
        for kind in kinds {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("no-such-type"), None);
    }

    #[test]
    fn client_messages_serialize_with_type_tags() {
        let json = serde_json::to_string(&ClientMessage::FetchHistoryList).unwrap();
        assert_eq!(json, r#"{"type":"fetch-history-list"}"#);

        let json = serde_json::to_string(&ClientMessage::InterruptSignal {
            text: "partial answer".to_owned(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"interrupt-signal","text":"partial answer"}"#);
    }

    #[test]
    fn audio_input_encodes_little_endian_f32() {
        let ClientMessage::AudioInput { audio } = ClientMessage::audio_input(&[0.5, -1.0]) else {
            panic!("expected audio-input");
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(audio)
            .unwrap();
        assert_eq!(&bytes[..4], &0.5_f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-1.0_f32).to_le_bytes());
    }

    #[test]
    fn envelope_parsing_tolerates_unknown_fields() {
        let msg = ServerMessage::parse(
            r#"{"type":"audio","audio":"QUJD","volumes":[0.1],"slice_length":20,
                "brand_new_field":{"nested":true}}"#,
        )
        .unwrap();
        assert_eq!(msg.known_kind(), Some(MessageKind::Audio));
        assert_eq!(msg.audio.as_deref(), Some("QUJD"));
        assert_eq!(msg.slice_length, Some(20));
    }

    #[test]
    fn envelope_parsing_keeps_unknown_types() {
        let msg = ServerMessage::parse(r#"{"type":"future-feature"}"#).unwrap();
        assert_eq!(msg.known_kind(), None);
        assert_eq!(msg.kind, "future-feature");
    }

    #[test]
    fn malformed_frames_are_protocol_errors() {
        assert!(ServerMessage::parse("not json").is_err());
        assert!(ServerMessage::parse(r#"{"type":42}"#).is_err());
    }

    #[test]
    fn relative_model_urls_resolve_against_base() {
        let mut info = ModelInfo {
            name: Some("A".to_owned()),
            url: Some("/m.vrm".to_owned()),
        };
        info.resolve_url("http://host");
        assert_eq!(info.url.as_deref(), Some("http://host/m.vrm"));
    }

    #[test]
    fn absolute_model_urls_are_untouched() {
        let mut info = ModelInfo {
            name: None,
            url: Some("https://cdn.example/m.vrm".to_owned()),
        };
        info.resolve_url("http://host");
        assert_eq!(info.url.as_deref(), Some("https://cdn.example/m.vrm"));
    }

    #[test]
    fn expressions_accept_indices_and_names() {
        let actions: Actions =
            serde_json::from_str(r#"{"expressions":[1,"smile"]}"#).unwrap();
        assert_eq!(
            actions.expressions,
            Some(vec![
                Expression::Index(1),
                Expression::Name("smile".to_owned())
            ])
        );
    }

    #[test]
    fn control_commands_parse() {
        assert_eq!(ControlCommand::parse("start-mic"), Some(ControlCommand::StartMic));
        assert_eq!(
            ControlCommand::parse("conversation-chain-end"),
            Some(ControlCommand::ConversationChainEnd)
        );
        assert_eq!(ControlCommand::parse("dance"), None);
    }
}
