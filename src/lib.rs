pub mod constants;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

// Layered boundaries for application use cases
pub mod app;

// Domain data shapes shared across layers
pub mod domain;
