//! Socket.IO (v5 over Engine.IO v4) push transport, WebSocket only.

pub mod backoff;
pub mod client;
pub mod endpoint;
pub mod packet;

pub use backoff::{Backoff, ReconnectPolicy};
pub use client::{SocketIoOptions, SocketIoTransport};
pub use endpoint::websocket_url;
