//! Core type definitions for chain table generation
//!
//! This module defines the identifiers, the replication scheme selector,
//! and the target/chain records handed to the output layers.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a storage node as registered with the cluster manager
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[display("{_0}")]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node ID from its raw value
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identifier of a placement group in the incidence relation (1-based)
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[display("{_0}")]
pub struct GroupId(u32);

impl GroupId {
    /// Create a group ID from its raw value
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

/// Packed numeric identifier of a storage target
///
/// Layout (decimal): `prefix | node_id:6 | disk_index+1:3 | target_index+1:2`.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[display("{_0}")]
pub struct TargetId(u64);

impl TargetId {
    /// Wrap an already packed value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// Packed numeric identifier of a chain
///
/// Layout (decimal): `prefix | disk_index+1:3 | chain_index:5`.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[display("{_0}")]
pub struct ChainId(u64);

impl ChainId {
    /// Wrap an already packed value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.0)
    }
}

/// How targets of a placement group are organized into chains
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChainTableType {
    /// Erasure coding: every target is a singleton chain, the chain index
    /// encodes the group and the rank within it
    #[serde(rename = "EC")]
    Ec,
    /// Chain replication: all targets of a group on one disk form one chain
    #[default]
    #[serde(rename = "CR")]
    Cr,
}

impl ChainTableType {
    /// Short name used on the command line and in config files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ec => "EC",
            Self::Cr => "CR",
        }
    }

    /// Number of targets every chain must hold under this scheme
    #[must_use]
    pub const fn chain_width(&self, group_size: usize) -> usize {
        match self {
            Self::Ec => 1,
            Self::Cr => group_size,
        }
    }
}

impl fmt::Display for ChainTableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainTableType {
    type Err = ChainTableTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EC" => Ok(Self::Ec),
            "CR" => Ok(Self::Cr),
            _ => Err(ChainTableTypeError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown chain table type
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown chain table type '{0}': expected EC or CR")]
pub struct ChainTableTypeError(String);

/// One physical storage target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Unique target identifier
    pub target_id: TargetId,
    /// Node hosting the target
    pub node_id: NodeId,
    /// Disk on the node (0-based)
    pub disk_index: u32,
}

impl Target {
    /// Create a new target record
    #[must_use]
    pub const fn new(target_id: TargetId, node_id: NodeId, disk_index: u32) -> Self {
        Self {
            target_id,
            node_id,
            disk_index,
        }
    }
}

/// Ordered set of targets forming one replication or EC placement unit
///
/// Member order is the construction order and carries the replication role
/// (head of the chain first), so it is never re-sorted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Unique chain identifier
    pub chain_id: ChainId,
    /// Member targets in chain order
    pub target_list: Vec<Target>,
}

impl Chain {
    /// Create a chain from its members
    #[must_use]
    pub const fn new(chain_id: ChainId, target_list: Vec<Target>) -> Self {
        Self {
            chain_id,
            target_list,
        }
    }

    /// Number of member targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.target_list.len()
    }

    /// Whether the chain has no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_list.is_empty()
    }

    /// Member target IDs in chain order
    pub fn target_ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.target_list.iter().map(|t| t.target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_table_type_parse() {
        assert_eq!("EC".parse::<ChainTableType>().unwrap(), ChainTableType::Ec);
        assert_eq!("cr".parse::<ChainTableType>().unwrap(), ChainTableType::Cr);
        assert!("RAID".parse::<ChainTableType>().is_err());
        assert_eq!(ChainTableType::Ec.to_string(), "EC");
    }

    #[test]
    fn test_chain_width() {
        assert_eq!(ChainTableType::Ec.chain_width(3), 1);
        assert_eq!(ChainTableType::Cr.chain_width(3), 3);
    }

    #[test]
    fn test_ids_serialize_as_numbers() {
        let target = Target::new(TargetId::new(1_000_000_100_101), NodeId::new(1), 0);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(
            json,
            r#"{"target_id":1000000100101,"node_id":1,"disk_index":0}"#
        );
    }

    #[test]
    fn test_chain_target_ids_preserve_order() {
        let chain = Chain::new(
            ChainId::new(1_000_100_001),
            vec![
                Target::new(TargetId::new(30), NodeId::new(3), 0),
                Target::new(TargetId::new(10), NodeId::new(1), 0),
            ],
        );
        let ids: Vec<u64> = chain.target_ids().map(TargetId::get).collect();
        assert_eq!(ids, vec![30, 10]);
        assert_eq!(chain.len(), 2);
    }
}
