//! Push-based observability
//!
//! Outbound data only: log lines through `tracing`, plus an optional periodic
//! JSON stats line on stdout.

pub mod logging;
pub mod reporter;

pub use logging::init_tracing;
pub use reporter::StatsReporter;
