// Connection state and listener counters
pub mod connection;

// Domain-specific error types
pub mod errors;

// Transport events and update payloads
pub mod events;

// Port interfaces
pub mod ports;
