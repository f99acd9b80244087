use crate::domain::errors::{ProtocolError, TransportError};
use crate::domain::events::{DisconnectReason, ServerEvent, TransportEvent};
use crate::domain::ports::PushTransport;
use crate::infrastructure::socketio::backoff::{Backoff, ReconnectPolicy};
use crate::infrastructure::socketio::packet::{EnginePacket, OpenHandshake, SocketPacket};
use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, error, info, warn};
use url::Url;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Longest heartbeat window accepted from a server's open packet
const MAX_HEARTBEAT: Duration = Duration::from_secs(24 * 60 * 60);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct SocketIoOptions {
    pub endpoint: Url,
    pub namespace: String,
    pub connect_timeout: Duration,
    /// Skip certificate verification (self-signed dev servers)
    pub accept_invalid_certs: bool,
    pub reconnect: ReconnectPolicy,
}

/// What a single text frame asks the session to do
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FrameAction {
    Pong(String),
    Connected { sid: Option<String> },
    Event(ServerEvent),
    Rejected(String),
    ServerDisconnect,
    EngineClose,
    Ignore,
}

/// Window after which a silent server counts as gone: `pingInterval + pingTimeout`.
pub(crate) fn heartbeat_window(handshake: &OpenHandshake) -> Result<Duration, TransportError> {
    let millis = handshake.ping_interval.saturating_add(handshake.ping_timeout);
    let window = Duration::from_millis(millis);
    if window > MAX_HEARTBEAT {
        return Err(TransportError::Handshake {
            reason: format!(
                "heartbeat window of {}ms exceeds {}ms",
                millis,
                MAX_HEARTBEAT.as_millis()
            ),
        });
    }
    Ok(window)
}

fn deadline_after(window: Duration) -> Result<Instant, TransportError> {
    Instant::now()
        .checked_add(window)
        .ok_or_else(|| TransportError::Handshake {
            reason: format!("deadline {}ms out of range", window.as_millis()),
        })
}

/// Interprets one Engine.IO frame received after the open handshake.
pub(crate) fn interpret_frame(text: &str, namespace: &str) -> Result<FrameAction, ProtocolError> {
    let body = match EnginePacket::decode(text)? {
        EnginePacket::Ping(data) => return Ok(FrameAction::Pong(data)),
        EnginePacket::Close => return Ok(FrameAction::EngineClose),
        EnginePacket::Message(body) => body,
        EnginePacket::Open(_) | EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {
            return Ok(FrameAction::Ignore);
        }
    };

    let packet = SocketPacket::decode(&body)?;
    if packet.namespace() != namespace {
        debug!(
            "SocketIo: Ignoring packet for namespace {}",
            packet.namespace()
        );
        return Ok(FrameAction::Ignore);
    }

    Ok(match packet {
        SocketPacket::Connect { data, .. } => FrameAction::Connected {
            sid: data
                .as_ref()
                .and_then(|d| d.get("sid"))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        SocketPacket::Event { name, args, .. } => FrameAction::Event(ServerEvent {
            name,
            payload: args.into_iter().next().unwrap_or(Value::Null),
        }),
        SocketPacket::ConnectError { message, .. } => FrameAction::Rejected(message),
        SocketPacket::Disconnect { .. } => FrameAction::ServerDisconnect,
        SocketPacket::Ack { .. } => FrameAction::Ignore,
    })
}

/// Socket.IO client over the WebSocket transport.
///
/// Owns the connection task and its reconnection policy; the listener only
/// ever sees the resulting [`TransportEvent`] stream.
pub struct SocketIoTransport {
    options: SocketIoOptions,
    // Handle for the active connection task to allow cancellation
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SocketIoTransport {
    pub fn new(options: SocketIoOptions) -> Self {
        Self {
            options,
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.options.endpoint
    }

    async fn run_transport(options: SocketIoOptions, tx: mpsc::Sender<TransportEvent>) {
        let mut backoff = Backoff::new(options.reconnect.clone());

        loop {
            info!("SocketIo: Connecting to {}...", options.endpoint);

            match Self::run_session(&options, &tx).await {
                Ok(reason) => {
                    backoff.reset();
                    if !reason.should_reconnect() {
                        info!("SocketIo: Session ended ({}), not reconnecting", reason);
                        return;
                    }
                }
                Err(e) => {
                    warn!("SocketIo: Connection attempt failed: {}", e);
                }
            }

            if tx.is_closed() {
                debug!("SocketIo: Listener dropped, stopping transport");
                return;
            }

            match backoff.next_delay() {
                Some(delay) => {
                    info!(
                        "SocketIo: Reconnecting in {}ms (attempt {})",
                        delay.as_millis(),
                        backoff.attempts()
                    );
                    time::sleep(delay).await;
                }
                None => {
                    error!(
                        "SocketIo: Giving up after {} reconnection attempts",
                        backoff.attempts()
                    );
                    return;
                }
            }
        }
    }

    /// Runs one connection attempt.
    ///
    /// Returns `Ok(reason)` if the namespace connected and the session later
    /// ended, `Err` if it never got that far.
    async fn run_session(
        options: &SocketIoOptions,
        tx: &mpsc::Sender<TransportEvent>,
    ) -> Result<DisconnectReason, TransportError> {
        let ws_stream = Self::open_socket(options).await?;
        let (mut write, mut read) = ws_stream.split();

        // 1. Engine.IO open handshake
        let handshake = time::timeout(options.connect_timeout, Self::read_handshake(&mut read))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                secs: options.connect_timeout.as_secs(),
            })??;
        debug!(
            "SocketIo: Engine open sid={} pingInterval={}ms pingTimeout={}ms",
            handshake.sid, handshake.ping_interval, handshake.ping_timeout
        );
        let heartbeat = heartbeat_window(&handshake)?;

        // 2. Namespace connect
        let connect_frame =
            EnginePacket::Message(SocketPacket::connect(&options.namespace).encode()).encode();
        write
            .send(Message::Text(connect_frame.into()))
            .await
            .map_err(|e| TransportError::Handshake {
                reason: e.to_string(),
            })?;

        let mut ping_deadline = deadline_after(heartbeat)?;
        let connect_deadline = deadline_after(options.connect_timeout)?;
        let mut connected = false;

        let reason = loop {
            tokio::select! {
                frame = read.next() => {
                    let msg = match frame {
                        Some(Ok(msg)) => msg,
                        Some(Err(e)) => break DisconnectReason::TransportError(e.to_string()),
                        None => break DisconnectReason::TransportClose,
                    };

                    match msg {
                        Message::Text(text) => {
                            let action = match interpret_frame(text.as_str(), &options.namespace) {
                                Ok(action) => action,
                                Err(e) => {
                                    warn!("SocketIo: Unhandled frame '{}': {}", text.as_str(), e);
                                    continue;
                                }
                            };

                            match action {
                                FrameAction::Pong(data) => {
                                    ping_deadline = match deadline_after(heartbeat) {
                                        Ok(deadline) => deadline,
                                        Err(e) => break DisconnectReason::TransportError(e.to_string()),
                                    };
                                    let pong = EnginePacket::Pong(data).encode();
                                    if let Err(e) = write.send(Message::Text(pong.into())).await {
                                        break DisconnectReason::TransportError(e.to_string());
                                    }
                                }
                                FrameAction::Connected { sid } => {
                                    if connected {
                                        continue;
                                    }
                                    connected = true;
                                    info!("SocketIo: Namespace {} connected", options.namespace);
                                    if tx.send(TransportEvent::Connected { sid }).await.is_err() {
                                        break DisconnectReason::ClientDisconnect;
                                    }
                                }
                                FrameAction::Event(event) => {
                                    if !connected {
                                        debug!("SocketIo: Dropping event '{}' before connect", event.name);
                                        continue;
                                    }
                                    if tx.send(TransportEvent::Event(event)).await.is_err() {
                                        break DisconnectReason::ClientDisconnect;
                                    }
                                }
                                FrameAction::Rejected(message) => {
                                    if connected {
                                        warn!("SocketIo: Ignoring connect error on live session: {}", message);
                                        continue;
                                    }
                                    return Err(TransportError::ConnectRejected {
                                        namespace: options.namespace.clone(),
                                        message,
                                    });
                                }
                                FrameAction::ServerDisconnect => break DisconnectReason::ServerDisconnect,
                                FrameAction::EngineClose => break DisconnectReason::TransportClose,
                                FrameAction::Ignore => {}
                            }
                        }
                        Message::Close(frame) => {
                            if let Some(cf) = frame {
                                info!(
                                    "SocketIo: WebSocket closed by server: Code {} Reason '{}'",
                                    cf.code, cf.reason
                                );
                            }
                            break DisconnectReason::TransportClose;
                        }
                        Message::Binary(_) => {
                            debug!("SocketIo: Ignoring binary frame");
                        }
                        // tungstenite queues the WebSocket-level pong for pings itself
                        _ => {}
                    }
                }
                _ = time::sleep_until(ping_deadline) => {
                    break DisconnectReason::PingTimeout;
                }
                _ = time::sleep_until(connect_deadline), if !connected => {
                    return Err(TransportError::Handshake {
                        reason: format!("no CONNECT ack for namespace {}", options.namespace),
                    });
                }
            }
        };

        if reason == DisconnectReason::ClientDisconnect {
            let _ = write.send(Message::Close(None)).await;
        }

        if !connected {
            return Err(TransportError::Closed {
                reason: reason.to_string(),
            });
        }

        info!("SocketIo: Session ended: {}", reason);
        // Receiver may already be gone; nothing left to notify then
        let _ = tx
            .send(TransportEvent::Disconnected {
                reason: reason.clone(),
            })
            .await;

        Ok(reason)
    }

    async fn open_socket(options: &SocketIoOptions) -> Result<WsStream, TransportError> {
        let url = options.endpoint.as_str();

        let connector = if options.accept_invalid_certs {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| TransportError::ConnectFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        let (ws_stream, _) = time::timeout(
            options.connect_timeout,
            connect_async_tls_with_config(url, None, false, connector),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            secs: options.connect_timeout.as_secs(),
        })?
        .map_err(|e| TransportError::ConnectFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ws_stream)
    }

    async fn read_handshake<S>(read: &mut S) -> Result<OpenHandshake, TransportError>
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        while let Some(frame) = read.next().await {
            let msg = frame.map_err(|e| TransportError::Handshake {
                reason: e.to_string(),
            })?;

            match msg {
                Message::Text(text) => {
                    return match EnginePacket::decode(text.as_str())? {
                        EnginePacket::Open(handshake) => Ok(handshake),
                        other => Err(TransportError::Handshake {
                            reason: format!("expected open packet, got {:?}", other),
                        }),
                    };
                }
                Message::Close(_) => break,
                _ => continue,
            }
        }

        Err(TransportError::Handshake {
            reason: "connection closed before open packet".to_string(),
        })
    }
}

#[async_trait]
impl PushTransport for SocketIoTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        let mut handle_guard = self.task_handle.lock().await;
        if handle_guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(TransportError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let options = self.options.clone();

        let handle = tokio::spawn(async move {
            Self::run_transport(options, tx).await;
        });
        *handle_guard = Some(handle);

        Ok(rx)
    }

    async fn shutdown(&self) {
        let mut handle_guard = self.task_handle.lock().await;
        if let Some(handle) = handle_guard.take() {
            debug!("SocketIo: Aborting connection task");
            handle.abort();
        }
    }
}
