//! Configuration types for chain table generation
//!
//! A TOML file can supply any subset of these settings; every field has a
//! default so a partial file deserializes cleanly.

use crate::error::{Error, Result};
use crate::types::ChainTableType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Node ids must stay below this value (6 decimal digits in a target id)
pub const MAX_NODE_ID: u32 = 1_000_000;
/// `node_id_end - node_id_begin` must stay below this value
pub const MAX_NODE_SPAN: u32 = 1_000;
/// Disks per node must stay below this value (3 decimal digits)
pub const MAX_DISKS_PER_NODE: u32 = 1_000;
/// Targets per disk must stay below this value (2 decimal digits)
pub const MAX_TARGETS_PER_DISK: u32 = 100;
/// Target and chain id prefixes must stay below this value
pub const MAX_ID_PREFIX: u32 = 100;
/// Incidence relations must have fewer entries than this
pub const MAX_INCIDENCE_ENTRIES: usize = 100_000;

/// Root configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Topology parameters for generation
    pub topology: TopologyParams,
    /// Output emitter settings
    pub output: OutputConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::configuration(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

/// Parameters describing the physical layout to generate chains for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyParams {
    /// CR (chain replication) or EC (erasure coding)
    pub chain_table_type: ChainTableType,
    /// First node id (inclusive)
    pub node_id_begin: u32,
    /// Last node id (inclusive)
    pub node_id_end: u32,
    /// Number of disks on each storage node
    pub num_disks_per_node: u32,
    /// Number of storage targets on each disk
    pub num_targets_per_disk: u32,
    /// Prefix of generated target ids
    pub target_id_prefix: u32,
    /// Prefix of generated chain ids
    pub chain_id_prefix: u32,
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            chain_table_type: ChainTableType::Cr,
            node_id_begin: 1,
            node_id_end: 1,
            num_disks_per_node: 1,
            num_targets_per_disk: 1,
            target_id_prefix: 10,
            chain_id_prefix: 10,
        }
    }
}

impl TopologyParams {
    /// Number of nodes in the inclusive id range
    #[must_use]
    pub const fn num_nodes(&self) -> u32 {
        self.node_id_end - self.node_id_begin + 1
    }

    /// Number of physical slots per disk layer (`num_nodes * num_targets_per_disk`)
    #[must_use]
    pub const fn num_slots(&self) -> usize {
        self.num_nodes() as usize * self.num_targets_per_disk as usize
    }

    /// Total number of targets the generator must produce
    #[must_use]
    pub const fn total_targets(&self) -> usize {
        self.num_slots() * self.num_disks_per_node as usize
    }

    /// Check the bounds that keep packed identifiers collision free
    pub fn validate(&self) -> Result<()> {
        if self.node_id_begin > self.node_id_end {
            return Err(Error::invalid_parameter(format!(
                "node_id_begin {} > node_id_end {}",
                self.node_id_begin, self.node_id_end
            )));
        }
        if self.node_id_end - self.node_id_begin >= MAX_NODE_SPAN {
            return Err(Error::invalid_parameter(format!(
                "node_id_end {} - node_id_begin {} must be below {MAX_NODE_SPAN}",
                self.node_id_end, self.node_id_begin
            )));
        }
        if self.node_id_end >= MAX_NODE_ID {
            return Err(Error::invalid_parameter(format!(
                "node_id_end {} must be below {MAX_NODE_ID}",
                self.node_id_end
            )));
        }
        if self.num_disks_per_node == 0 || self.num_disks_per_node >= MAX_DISKS_PER_NODE {
            return Err(Error::invalid_parameter(format!(
                "num_disks_per_node {} must be in 1..{MAX_DISKS_PER_NODE}",
                self.num_disks_per_node
            )));
        }
        if self.num_targets_per_disk == 0 || self.num_targets_per_disk >= MAX_TARGETS_PER_DISK {
            return Err(Error::invalid_parameter(format!(
                "num_targets_per_disk {} must be in 1..{MAX_TARGETS_PER_DISK}",
                self.num_targets_per_disk
            )));
        }
        if self.target_id_prefix >= MAX_ID_PREFIX {
            return Err(Error::invalid_parameter(format!(
                "target_id_prefix {} must be below {MAX_ID_PREFIX}",
                self.target_id_prefix
            )));
        }
        if self.chain_id_prefix >= MAX_ID_PREFIX {
            return Err(Error::invalid_parameter(format!(
                "chain_id_prefix {} must be below {MAX_ID_PREFIX}",
                self.chain_id_prefix
            )));
        }
        Ok(())
    }
}

/// Output emitter configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the generated files are written to
    pub output_path: PathBuf,
    /// Supported file chunk sizes passed to `create-target`
    pub chunk_sizes: Vec<String>,
    /// Append `--use-new-chunk-engine` to `create-target`
    pub use_new_chunk_engine: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("output"),
            chunk_sizes: Vec::new(),
            use_new_chunk_engine: true,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
