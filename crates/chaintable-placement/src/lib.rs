//! Chain table placement - target ids and chains from an incidence relation
//!
//! This crate turns a placement-model incidence relation (which physical
//! slot belongs to which placement group) and a handful of topology
//! parameters into a deterministic, collision-free table of storage targets
//! grouped into chains.
//!
//! # Schemes
//!
//! ## CR (chain replication)
//! All targets of a group on one disk form one multi-target chain.
//!
//! ## EC (erasure coding)
//! Every target is its own chain; the chain index encodes the group and the
//! rank of the target within it.
//!
//! # Example
//! ```ignore
//! use chaintable_placement::{IncidenceRelation, generate_chains};
//!
//! let relation = IncidenceRelation::from_pairs([(1, 1), (2, 1), (3, 2), (4, 2)]);
//! let table = generate_chains(&params, &relation)?;
//! for chain in table.chains() { /* ... */ }
//! ```

pub mod encoding;
pub mod generator;
pub mod incidence;
pub mod validate;

pub use encoding::{
    ChainIdParts, TargetIdParts, decode_chain_id, decode_target_id, encode_chain_id,
    encode_target_id,
};
pub use generator::{ChainTable, ChainTableGenerator, generate_chains};
pub use incidence::{IncidenceLayout, IncidenceRelation};
pub use validate::{IncidenceShape, validate_chains, validate_incidence, validate_targets};
