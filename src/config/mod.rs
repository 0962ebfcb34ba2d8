//! Configuration module
//!
//! Loads, parses and validates the TOML configuration file.
//!
//! # Example
//!
//! ```no_run
//! use schulnetz_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Portal: {}", config.portal.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CredentialsConfig, OutputConfig, PortalConfig, SessionConfig};

// Re-export parser functions
pub use parser::load_config;
