pub mod http_client_factory;
pub mod observability;
pub mod reloader;
pub mod socketio;

pub use reloader::ReloaderFactory;
pub use socketio::SocketIoTransport;
