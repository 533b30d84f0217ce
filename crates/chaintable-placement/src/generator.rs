//! Chain assignment
//!
//! The generator walks the physical slot space in a fixed order (disk, then
//! node, then target slot), gives every slot a packed target id, looks up
//! the slot's placement group and appends the target to the chain derived
//! from that group. The same incidence relation is applied to every disk.
//!
//! # Chain indices
//!
//! - **CR**: `chain_index = group_id`; all targets of a group on one disk
//!   form one chain, in node order.
//! - **EC**: `chain_index = (group_id - 1) * group_size + rank`, where rank
//!   counts the group's targets seen so far on the current disk. Every
//!   target becomes a singleton chain and each group owns a contiguous
//!   block of chain indices.

use crate::encoding::{encode_chain_id, encode_target_id};
use crate::incidence::IncidenceRelation;
use crate::validate::{IncidenceShape, validate_chains, validate_incidence, validate_targets};
use chaintable_common::{
    Chain, ChainId, ChainTableType, Error, GroupId, NodeId, Result, Target, TopologyParams,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Rank of each group's targets within one disk layer
///
/// A fresh counter is created for every disk.
#[derive(Debug, Default)]
struct GroupSlotCounter {
    counts: HashMap<GroupId, u64>,
}

impl GroupSlotCounter {
    /// Count one more target of `group` and return its 1-based rank
    fn next_rank(&mut self, group: GroupId) -> u64 {
        let count = self.counts.entry(group).or_default();
        *count += 1;
        *count
    }
}

/// Validated result of a generation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainTable {
    scheme: ChainTableType,
    group_size: usize,
    chains: Vec<Chain>,
    targets: Vec<Target>,
}

impl ChainTable {
    /// Scheme the table was generated for
    #[must_use]
    pub const fn scheme(&self) -> ChainTableType {
        self.scheme
    }

    /// Group size detected in the incidence relation
    #[must_use]
    pub const fn group_size(&self) -> usize {
        self.group_size
    }

    /// Chains in ascending chain id order
    #[must_use]
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Targets in generation order
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Consume the table, keeping the chains
    #[must_use]
    pub fn into_chains(self) -> Vec<Chain> {
        self.chains
    }
}

/// Chain table generator for one topology and incidence relation
pub struct ChainTableGenerator<'a> {
    params: &'a TopologyParams,
    incidence: &'a IncidenceRelation,
    shape: IncidenceShape,
}

impl<'a> ChainTableGenerator<'a> {
    /// Validate the parameters and the incidence relation.
    ///
    /// Nothing is generated if either is rejected.
    pub fn new(params: &'a TopologyParams, incidence: &'a IncidenceRelation) -> Result<Self> {
        params.validate()?;
        let shape = validate_incidence(incidence, params)?;
        debug!(
            "Incidence relation: {} slots, {} groups of {}",
            shape.num_slots, shape.num_groups, shape.group_size
        );
        Ok(Self {
            params,
            incidence,
            shape,
        })
    }

    /// Shape of the validated incidence relation
    #[must_use]
    pub const fn shape(&self) -> IncidenceShape {
        self.shape
    }

    /// Build and check the chain table
    pub fn generate(&self) -> Result<ChainTable> {
        let params = self.params;
        let mut targets = Vec::with_capacity(params.total_targets());
        let mut chain_targets: BTreeMap<ChainId, Vec<Target>> = BTreeMap::new();

        for disk_index in 0..params.num_disks_per_node {
            self.assign_disk(disk_index, &mut targets, &mut chain_targets)?;
        }

        let chains: Vec<Chain> = chain_targets
            .into_iter()
            .map(|(chain_id, target_list)| Chain::new(chain_id, target_list))
            .collect();

        validate_targets(&targets, params)?;
        validate_chains(
            &chains,
            params.chain_table_type,
            self.shape.group_size,
            targets.len(),
        )?;

        info!(
            "Generated {} chain table: {} targets, {} chains, group size {}",
            params.chain_table_type,
            targets.len(),
            chains.len(),
            self.shape.group_size
        );

        Ok(ChainTable {
            scheme: params.chain_table_type,
            group_size: self.shape.group_size,
            chains,
            targets,
        })
    }

    fn assign_disk(
        &self,
        disk_index: u32,
        targets: &mut Vec<Target>,
        chain_targets: &mut BTreeMap<ChainId, Vec<Target>>,
    ) -> Result<()> {
        let params = self.params;
        let mut ranks = GroupSlotCounter::default();

        for node in params.node_id_begin..=params.node_id_end {
            let node_id = NodeId::new(node);
            for target_index in 0..params.num_targets_per_disk {
                let target_id =
                    encode_target_id(params.target_id_prefix, node_id, disk_index, target_index);
                let slot = (node - params.node_id_begin) * params.num_targets_per_disk
                    + target_index
                    + 1;
                let group = self
                    .incidence
                    .group_of_slot(slot)
                    .ok_or(Error::MissingSlot { slot })?;

                let chain_index = self.chain_index(group, &mut ranks);
                let chain_id = encode_chain_id(params.chain_id_prefix, disk_index, chain_index)?;

                let target = Target::new(target_id, node_id, disk_index);
                targets.push(target);
                chain_targets.entry(chain_id).or_default().push(target);
            }
        }

        debug!(
            "Disk {} assigned, {} chains so far",
            disk_index,
            chain_targets.len()
        );
        Ok(())
    }

    fn chain_index(&self, group: GroupId, ranks: &mut GroupSlotCounter) -> u64 {
        let group_id = u64::from(group.get());
        match self.params.chain_table_type {
            ChainTableType::Ec => {
                (group_id - 1) * self.shape.group_size as u64 + ranks.next_rank(group)
            }
            ChainTableType::Cr => group_id,
        }
    }
}

/// Validate the inputs and generate the chain table in one step
pub fn generate_chains(
    params: &TopologyParams,
    incidence: &IncidenceRelation,
) -> Result<ChainTable> {
    ChainTableGenerator::new(params, incidence)?.generate()
}
