//! Services orchestrating ports and domain types.

pub mod config_service;

pub use config_service::ConfigService;
