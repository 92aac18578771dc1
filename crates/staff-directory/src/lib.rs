pub mod config;
pub mod departments;
pub mod error;
pub mod telemetry;
pub mod workflows;
