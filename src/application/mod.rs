// Push-update listener
pub mod listener;

// System orchestrator
pub mod system;

pub use listener::PushUpdateListener;
pub use system::{Application, ApplicationHandle};
