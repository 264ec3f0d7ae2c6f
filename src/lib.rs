pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod logging;
pub mod metrics;
pub mod platform;
pub mod remediation;
pub mod server;
pub mod shutdown;
