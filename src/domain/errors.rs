use thiserror::Error;

/// Errors raised while decoding Engine.IO / Socket.IO frames
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown {layer} packet type: '{kind}'")]
    UnknownType { layer: &'static str, kind: char },

    #[error("Malformed packet: {reason}")]
    Malformed { reason: String },

    #[error("Binary packets are not supported")]
    BinaryUnsupported,
}

/// Errors related to the push transport connection
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid page origin '{url}': {reason}")]
    InvalidOrigin { url: String, reason: String },

    #[error("Connection to {url} failed: {reason}")]
    ConnectFailed { url: String, reason: String },

    #[error("Connection attempt timed out after {secs}s")]
    ConnectTimeout { secs: u64 },

    #[error("Handshake failed: {reason}")]
    Handshake { reason: String },

    #[error("Server rejected namespace '{namespace}': {message}")]
    ConnectRejected { namespace: String, message: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Transport already started")]
    AlreadyStarted,

    #[error("Transport closed: {reason}")]
    Closed { reason: String },
}

/// Errors related to the injected reload action
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("Reload command '{command}' exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("Reload command '{command}' could not be started: {reason}")]
    Spawn { command: String, reason: String },

    #[error("Reload timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Reload webhook {url} failed: {reason}")]
    Webhook { url: String, reason: String },

    #[error("No reload subscribers are listening")]
    NoSubscribers,
}

/// Errors related to configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{key} is required when RELOAD_MODE={mode}")]
    Missing { key: &'static str, mode: String },
}
