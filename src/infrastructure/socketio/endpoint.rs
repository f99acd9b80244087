use crate::domain::errors::TransportError;
use url::Url;

const ENGINE_IO_QUERY: &str = "EIO=4&transport=websocket";

/// Derives the Socket.IO WebSocket endpoint for the origin that served `page_url`.
///
/// Scheme follows the page (`http` -> `ws`, `https` -> `wss`); host and port are
/// the page's own, with the scheme default when the page has no explicit port.
pub fn websocket_url(page_url: &str, socketio_path: &str) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidOrigin {
        url: page_url.to_string(),
        reason,
    };

    let page = Url::parse(page_url).map_err(|e| invalid(e.to_string()))?;

    let scheme = match page.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    };
    let host = page
        .host_str()
        .ok_or_else(|| invalid("missing host".to_string()))?;
    let port = page
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port".to_string()))?;

    let path = socketio_path.trim_matches('/');
    let path = if path.is_empty() {
        String::from("/")
    } else {
        format!("/{}/", path)
    };

    let endpoint = format!("{}://{}:{}{}?{}", scheme, host, port, path, ENGINE_IO_QUERY);
    Url::parse(&endpoint).map_err(|e| invalid(e.to_string()))
}
