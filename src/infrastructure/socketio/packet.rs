//! Engine.IO v4 and Socket.IO v5 text framing.
//!
//! Each WebSocket text frame carries one Engine.IO packet; Engine.IO `message`
//! packets carry one Socket.IO packet:
//!
//! ```text
//! 42["update",{"message":"Data updated"}]
//! ^^ socket.io EVENT
//! ^  engine.io MESSAGE
//! ```

use crate::domain::errors::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

/// Body of the Engine.IO `open` packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let kind = text.chars().next().ok_or(ProtocolError::Empty)?;
        let body = &text[kind.len_utf8()..];

        match kind {
            '0' => serde_json::from_str(body)
                .map(EnginePacket::Open)
                .map_err(|e| ProtocolError::Malformed {
                    reason: format!("open handshake: {}", e),
                }),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ProtocolError::UnknownType {
                layer: "engine.io",
                kind: other,
            }),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            // Serializing a struct of strings and integers cannot fail
            EnginePacket::Open(handshake) => format!(
                "0{}",
                serde_json::to_string(handshake).unwrap_or_default()
            ),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    pub fn connect(namespace: &str) -> Self {
        SocketPacket::Connect {
            namespace: namespace.to_string(),
            data: None,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Parses `<type>[<attachments>-][<nsp>,][<id>][<json>]`.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let kind = text.chars().next().ok_or(ProtocolError::Empty)?;
        match kind {
            '0'..='4' => {}
            '5' | '6' => return Err(ProtocolError::BinaryUnsupported),
            other => {
                return Err(ProtocolError::UnknownType {
                    layer: "socket.io",
                    kind: other,
                });
            }
        }

        let mut rest = &text[1..];

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(i) => {
                    let ns = &rest[..i];
                    rest = &rest[i + 1..];
                    ns
                }
                None => std::mem::take(&mut rest),
            }
        } else {
            DEFAULT_NAMESPACE
        }
        .to_string();

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|e| malformed(format!("ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(rest)
                    .map_err(|e| malformed(format!("payload: {}", e)))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut items = match data {
                    Some(Value::Array(items)) if !items.is_empty() => items,
                    _ => return Err(malformed("event payload must be a non-empty array")),
                };
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => return Err(malformed(format!("event name is not a string: {}", other))),
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| malformed("ack without id"))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(other) => vec![other],
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    id,
                    args,
                })
            }
            _ => {
                // v5 sends {"message": ...}, v4 servers send a bare string
                let message = match data {
                    Some(Value::String(s)) => s,
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| Value::Object(map).to_string()),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Ok(SocketPacket::ConnectError { namespace, message })
            }
        }
    }

    pub fn encode(&self) -> String {
        let (kind, id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event { id, name, args, .. } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                ('2', *id, Some(Value::Array(items)))
            }
            SocketPacket::Ack { id, args, .. } => ('3', Some(*id), Some(Value::Array(args.clone()))),
            SocketPacket::ConnectError { message, .. } => (
                '4',
                None,
                Some(serde_json::json!({ "message": message })),
            ),
        };

        let mut out = String::new();
        out.push(kind);

        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }
}

fn malformed(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_handshake() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();

        match packet {
            EnginePacket::Open(h) => {
                assert_eq!(h.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(h.ping_interval, 25000);
                assert_eq!(h.ping_timeout, 20000);
                assert_eq!(h.max_payload, Some(1_000_000));
            }
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_engine_control_packets() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::decode("1").unwrap(), EnginePacket::Close);
        assert_eq!(
            EnginePacket::decode("40").unwrap(),
            EnginePacket::Message("0".to_string())
        );
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::Empty));
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownType { kind: '9', .. })
        ));
    }

    #[test]
    fn test_pong_echoes_ping_data() {
        assert_eq!(EnginePacket::Pong("hb".to_string()).encode(), "3hb");
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
    }

    #[test]
    fn test_decode_update_event() {
        let packet = SocketPacket::decode(r#"2["update",{"message":"Data updated"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/".to_string(),
                id: None,
                name: "update".to_string(),
                args: vec![json!({"message": "Data updated"})],
            }
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/admin,13["update"]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".to_string(),
                id: Some(13),
                name: "update".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                namespace: "/".to_string(),
                data: Some(json!({"sid": "abc"})),
            }
        );

        let bare = SocketPacket::decode("0/admin").unwrap();
        assert_eq!(bare.namespace(), "/admin");
    }

    #[test]
    fn test_decode_connect_error_variants() {
        let v5 = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            v5,
            SocketPacket::ConnectError {
                namespace: "/".to_string(),
                message: "Not authorized".to_string(),
            }
        );

        let v4 = SocketPacket::decode(r#"4"Invalid namespace""#).unwrap();
        assert!(matches!(v4, SocketPacket::ConnectError { message, .. } if message == "Invalid namespace"));
    }

    #[test]
    fn test_reject_bad_socket_packets() {
        assert_eq!(
            SocketPacket::decode(r#"51-["update",{"_placeholder":true,"num":0}]"#),
            Err(ProtocolError::BinaryUnsupported)
        );
        assert!(matches!(
            SocketPacket::decode("2{}"),
            Err(ProtocolError::Malformed { .. })
        ));
        assert!(matches!(
            SocketPacket::decode("2[42]"),
            Err(ProtocolError::Malformed { .. })
        ));
        assert!(matches!(
            SocketPacket::decode("3"),
            Err(ProtocolError::Malformed { .. })
        ));
    }

    #[test]
    fn test_encode_client_frames() {
        assert_eq!(SocketPacket::connect("/").encode(), "0");
        assert_eq!(SocketPacket::connect("/admin").encode(), "0/admin,");
        assert_eq!(
            EnginePacket::Message(SocketPacket::connect("/").encode()).encode(),
            "40"
        );
        assert_eq!(
            SocketPacket::Event {
                namespace: "/".to_string(),
                id: None,
                name: "update".to_string(),
                args: vec![json!({"message": "new data"})],
            }
            .encode(),
            r#"2["update",{"message":"new data"}]"#
        );
    }
}
