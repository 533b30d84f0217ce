//! Error types for chain table generation
//!
//! Every failure is fatal for a generation run. Variants carry the values
//! that violated the check so the diagnostic alone identifies the problem.

use crate::types::{ChainId, GroupId, NodeId, TargetId};
use thiserror::Error;

/// Common result type for chain table operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The incidence relation does not describe a valid slot to group mapping
    MalformedIncidence,
    /// A computed identifier component exceeds its reserved digits
    CapacityOverflow,
    /// The generated targets or chains violate a required shape
    PostconditionViolation,
    /// A topology parameter is outside the supported bounds
    InvalidParameter,
    /// Configuration file could not be parsed
    Configuration,
    /// Input could not be read or decoded
    Input,
}

/// Common error type for chain table generation
#[derive(Debug, Error)]
pub enum Error {
    // Incidence relation errors
    #[error("incidence relation is empty")]
    EmptyIncidence,

    #[error("incidence relation has {entries} entries, must be below {limit}")]
    IncidenceTooLarge { entries: usize, limit: usize },

    #[error("slot {slot} is assigned to group 0, group ids start at 1")]
    ZeroGroupId { slot: u32 },

    #[error("duplicate incidence entry: slot {slot}, group {group}")]
    DuplicateEntry { slot: u32, group: GroupId },

    #[error("slot {slot} is assigned to more than one group: {first} and {second}")]
    SlotInMultipleGroups {
        slot: u32,
        first: GroupId,
        second: GroupId,
    },

    #[error("slot position {slot} out of range 1..={max}")]
    SlotOutOfRange { slot: u32, max: u32 },

    #[error("slot position {slot} has no group assignment")]
    MissingSlot { slot: u32 },

    #[error("not all group sizes the same: {sizes:?}")]
    NonUniformGroupSizes { sizes: Vec<usize> },

    #[error("incidence entry count {entries} is not divisible by group size {group_size}")]
    IndivisibleEntryCount { entries: usize, group_size: usize },

    #[error(
        "incidence entry count {entries} != num_nodes {num_nodes} * num_targets_per_disk {num_targets_per_disk}"
    )]
    EntryCountMismatch {
        entries: usize,
        num_nodes: u32,
        num_targets_per_disk: u32,
    },

    #[error("highest node position {max_node} != num_nodes {num_nodes}")]
    NodeCountMismatch { max_node: u32, num_nodes: u32 },

    #[error("node position {node} belongs to {memberships} groups, expected {expected}")]
    NodeMembershipMismatch {
        node: u32,
        memberships: usize,
        expected: u32,
    },

    // Capacity errors
    #[error("chain index {chain_index} >= {limit}")]
    ChainIndexOverflow { chain_index: u64, limit: u64 },

    // Postcondition errors
    #[error("generated {actual} targets, expected {expected}")]
    TargetCountMismatch { actual: usize, expected: usize },

    #[error("duplicate target id {target_id}")]
    DuplicateTargetId { target_id: TargetId },

    #[error("node {node_id} holds {actual} targets, other nodes hold {expected}")]
    NonUniformNodeLoad {
        node_id: NodeId,
        actual: usize,
        expected: usize,
    },

    #[error("disk {disk_index} of node {node_id} holds {actual} targets, other disks hold {expected}")]
    NonUniformDiskLoad {
        node_id: NodeId,
        disk_index: u32,
        actual: usize,
        expected: usize,
    },

    #[error("chain {chain_id} has {actual} targets, {scheme} chains must have {expected}")]
    ChainSizeMismatch {
        chain_id: ChainId,
        scheme: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("generated {actual} chains, {scheme} table expects {expected}")]
    ChainCountMismatch {
        scheme: &'static str,
        actual: usize,
        expected: usize,
    },

    // Ambient errors
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a deserialization error
    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyIncidence
            | Self::IncidenceTooLarge { .. }
            | Self::ZeroGroupId { .. }
            | Self::DuplicateEntry { .. }
            | Self::SlotInMultipleGroups { .. }
            | Self::SlotOutOfRange { .. }
            | Self::MissingSlot { .. }
            | Self::NonUniformGroupSizes { .. }
            | Self::IndivisibleEntryCount { .. }
            | Self::EntryCountMismatch { .. }
            | Self::NodeCountMismatch { .. }
            | Self::NodeMembershipMismatch { .. } => ErrorKind::MalformedIncidence,

            Self::ChainIndexOverflow { .. } => ErrorKind::CapacityOverflow,

            Self::TargetCountMismatch { .. }
            | Self::DuplicateTargetId { .. }
            | Self::NonUniformNodeLoad { .. }
            | Self::NonUniformDiskLoad { .. }
            | Self::ChainSizeMismatch { .. }
            | Self::ChainCountMismatch { .. } => ErrorKind::PostconditionViolation,

            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Deserialization(_) => ErrorKind::Input,
        }
    }

    /// Check if the error points at the upstream incidence relation
    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(self.kind(), ErrorKind::MalformedIncidence)
    }
}
