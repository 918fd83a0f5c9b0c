pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod provider;
pub mod telemetry;
