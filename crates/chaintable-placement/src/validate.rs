//! Invariant checks around chain assignment
//!
//! [`validate_incidence`] runs before any target is built and derives the
//! group size the generator relies on. [`validate_targets`] and
//! [`validate_chains`] run on the finished collections; nothing is handed to
//! the output layers unless all of them pass.

use crate::incidence::IncidenceRelation;
use chaintable_common::config::MAX_INCIDENCE_ENTRIES;
use chaintable_common::{
    Chain, ChainTableType, Error, GroupId, NodeId, Result, Target, TopologyParams,
};
use std::collections::{BTreeMap, HashSet};

/// Shape of a validated incidence relation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncidenceShape {
    /// Number of slots in every group
    pub group_size: usize,
    /// Number of distinct groups
    pub num_groups: usize,
    /// Number of slot positions (`num_nodes * num_targets_per_disk`)
    pub num_slots: usize,
}

/// Check that the relation is a total function from `1..=num_slots` onto
/// equally sized groups.
pub fn validate_incidence(
    relation: &IncidenceRelation,
    params: &TopologyParams,
) -> Result<IncidenceShape> {
    let entries = relation.entries();
    if entries.is_empty() {
        return Err(Error::EmptyIncidence);
    }
    if entries.len() >= MAX_INCIDENCE_ENTRIES {
        return Err(Error::IncidenceTooLarge {
            entries: entries.len(),
            limit: MAX_INCIDENCE_ENTRIES,
        });
    }

    if let Some(&(slot, _)) = entries.iter().find(|(_, group)| group.get() == 0) {
        return Err(Error::ZeroGroupId { slot });
    }

    // Sorted, so repeated slots are adjacent
    for pair in entries.windows(2) {
        let ((slot, first), (next_slot, second)) = (pair[0], pair[1]);
        if slot != next_slot {
            continue;
        }
        if first == second {
            return Err(Error::DuplicateEntry { slot, group: first });
        }
        return Err(Error::SlotInMultipleGroups {
            slot,
            first,
            second,
        });
    }

    let num_slots = params.num_slots();
    let max = u32::try_from(num_slots).unwrap_or(u32::MAX);
    if let Some(&(slot, _)) = entries.iter().find(|&&(slot, _)| slot == 0 || slot > max) {
        return Err(Error::SlotOutOfRange { slot, max });
    }
    if let Some((_, expected)) = entries
        .iter()
        .zip(1u32..)
        .find(|&(&(slot, _), expected)| slot != expected)
    {
        return Err(Error::MissingSlot { slot: expected });
    }

    let mut group_sizes: BTreeMap<GroupId, usize> = BTreeMap::new();
    for &(_, group) in entries {
        *group_sizes.entry(group).or_default() += 1;
    }
    let sizes: Vec<usize> = group_sizes.values().copied().collect();
    let group_size = sizes[0];
    if sizes.iter().any(|&size| size != group_size) {
        return Err(Error::NonUniformGroupSizes { sizes });
    }
    if entries.len() % group_size != 0 {
        return Err(Error::IndivisibleEntryCount {
            entries: entries.len(),
            group_size,
        });
    }
    if entries.len() != num_slots {
        return Err(Error::EntryCountMismatch {
            entries: entries.len(),
            num_nodes: params.num_nodes(),
            num_targets_per_disk: params.num_targets_per_disk,
        });
    }

    Ok(IncidenceShape {
        group_size,
        num_groups: sizes.len(),
        num_slots,
    })
}

/// Check target count, id uniqueness and per-node / per-disk uniformity.
pub fn validate_targets(targets: &[Target], params: &TopologyParams) -> Result<()> {
    let expected = params.total_targets();
    if targets.len() != expected {
        return Err(Error::TargetCountMismatch {
            actual: targets.len(),
            expected,
        });
    }

    let mut seen = HashSet::with_capacity(targets.len());
    for target in targets {
        if !seen.insert(target.target_id) {
            return Err(Error::DuplicateTargetId {
                target_id: target.target_id,
            });
        }
    }

    let mut per_node: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut per_disk: BTreeMap<(NodeId, u32), usize> = BTreeMap::new();
    for target in targets {
        *per_node.entry(target.node_id).or_default() += 1;
        *per_disk
            .entry((target.node_id, target.disk_index))
            .or_default() += 1;
    }

    if let Some((node_id, actual, expected)) = first_mismatch(&per_node) {
        return Err(Error::NonUniformNodeLoad {
            node_id,
            actual,
            expected,
        });
    }
    if let Some(((node_id, disk_index), actual, expected)) = first_mismatch(&per_disk) {
        return Err(Error::NonUniformDiskLoad {
            node_id,
            disk_index,
            actual,
            expected,
        });
    }
    Ok(())
}

/// Check the chain cardinality required by the scheme.
pub fn validate_chains(
    chains: &[Chain],
    scheme: ChainTableType,
    group_size: usize,
    total_targets: usize,
) -> Result<()> {
    let width = scheme.chain_width(group_size);
    if let Some(chain) = chains.iter().find(|c| c.len() != width) {
        return Err(Error::ChainSizeMismatch {
            chain_id: chain.chain_id,
            scheme: scheme.as_str(),
            actual: chain.len(),
            expected: width,
        });
    }

    let expected = total_targets / width;
    if chains.len() != expected {
        return Err(Error::ChainCountMismatch {
            scheme: scheme.as_str(),
            actual: chains.len(),
            expected,
        });
    }
    Ok(())
}

/// First key whose count differs from the first key's count
fn first_mismatch<K: Copy>(counts: &BTreeMap<K, usize>) -> Option<(K, usize, usize)> {
    let mut iter = counts.iter();
    let (_, &expected) = iter.next()?;
    iter.find(|&(_, &count)| count != expected)
        .map(|(&key, &count)| (key, count, expected))
}
