//! ---
//! cdc_section: "01-bus-core"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Shared configuration and logging for the changer runtime."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Core shared primitives for the ibus-cdc workspace.
//! This crate exposes configuration loading and tracing initialisation
//! consumed by the daemon and the protocol crates.

pub mod config;
pub mod logging;

pub use config::{AppConfig, BusConfig, ChangerConfig, LoggingConfig};
pub use logging::{init_tracing, LogFormat};
