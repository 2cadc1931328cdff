//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory and falls back to defaults when it does not
//! exist yet.

pub mod config;
