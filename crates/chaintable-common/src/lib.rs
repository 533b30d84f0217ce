//! Chain table common types
//!
//! Identifiers, target/chain records, error definitions and configuration
//! shared by the placement library and the generator binary.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, LoggingConfig, OutputConfig, TopologyParams};
pub use error::{Error, ErrorKind, Result};
pub use types::*;
