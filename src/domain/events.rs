use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Payload of an "update" notification.
///
/// Only `message` is interpreted, and only for logging. The raw payload is
/// kept so reloaders can forward it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNotice {
    pub message: Option<String>,
    pub payload: Value,
}

impl UpdateNotice {
    /// Builds a notice from whatever the server sent.
    ///
    /// `{"message": "..."}` and a bare string both yield a message. Anything
    /// else (missing field, non-string field, no payload at all) yields `None`.
    pub fn from_payload(payload: Value) -> Self {
        let message = match &payload {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };

        Self { message, payload }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            payload: serde_json::json!({ "message": message }),
            message: Some(message),
        }
    }

    /// Message text for log lines.
    pub fn display_message(&self) -> &str {
        self.message.as_deref().unwrap_or("<no message>")
    }
}

/// A named event pushed by the server on the listener's namespace
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEvent {
    pub name: String,
    pub payload: Value,
}

/// Why a live session ended. Display strings follow the Socket.IO client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server sent a DISCONNECT for our namespace; not retried.
    ServerDisconnect,
    ClientDisconnect,
    PingTimeout,
    TransportClose,
    TransportError(String),
}

impl DisconnectReason {
    /// Whether the transport should try to reconnect after this reason.
    pub fn should_reconnect(&self) -> bool {
        !matches!(
            self,
            DisconnectReason::ServerDisconnect | DisconnectReason::ClientDisconnect
        )
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ServerDisconnect => write!(f, "io server disconnect"),
            DisconnectReason::ClientDisconnect => write!(f, "io client disconnect"),
            DisconnectReason::PingTimeout => write!(f, "ping timeout"),
            DisconnectReason::TransportClose => write!(f, "transport close"),
            DisconnectReason::TransportError(e) => write!(f, "transport error: {}", e),
        }
    }
}

/// Events delivered by a push transport to the listener, in causal order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected { sid: Option<String> },
    Event(ServerEvent),
    Disconnected { reason: DisconnectReason },
}
