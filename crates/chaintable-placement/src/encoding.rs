//! Positional-decimal packing of target and chain identifiers
//!
//! ```text
//! target_id = ((prefix * 1_000_000 + node_id) * 1_000 + (disk_index + 1)) * 100 + (target_index + 1)
//! chain_id  = (prefix * 1_000 + (disk_index + 1)) * 100_000 + chain_index
//! ```
//!
//! Disk and target components are stored 1-based so a zero digit group
//! never stands for a real component.

use chaintable_common::{ChainId, Error, NodeId, Result, TargetId};

/// Digits reserved for the node id in a target id
pub const NODE_ID_RADIX: u64 = 1_000_000;
/// Digits reserved for `disk_index + 1` in both id kinds
pub const DISK_RADIX: u64 = 1_000;
/// Digits reserved for `target_index + 1` in a target id
pub const TARGET_SLOT_RADIX: u64 = 100;
/// Exclusive upper bound of the chain index component
pub const CHAIN_INDEX_LIMIT: u64 = 100_000;

/// Decoded components of a target id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetIdParts {
    pub prefix: u32,
    pub node_id: NodeId,
    pub disk_index: u32,
    pub target_index: u32,
}

/// Decoded components of a chain id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainIdParts {
    pub prefix: u32,
    pub disk_index: u32,
    pub chain_index: u64,
}

/// Pack a target id.
///
/// Callers must keep `node_id < 1_000_000`, `disk_index < 999`,
/// `target_index < 99` and `prefix < 100`; out of range components collide
/// with neighbouring digit groups. [`TopologyParams::validate`] enforces
/// these bounds for generated targets.
///
/// [`TopologyParams::validate`]: chaintable_common::TopologyParams::validate
#[must_use]
pub const fn encode_target_id(
    prefix: u32,
    node_id: NodeId,
    disk_index: u32,
    target_index: u32,
) -> TargetId {
    let id = ((prefix as u64 * NODE_ID_RADIX + node_id.get() as u64) * DISK_RADIX
        + (disk_index as u64 + 1))
        * TARGET_SLOT_RADIX
        + (target_index as u64 + 1);
    TargetId::new(id)
}

/// Unpack a target id produced by [`encode_target_id`].
///
/// Returns `None` when the disk or target digit group is zero, which no
/// encoded id contains.
#[must_use]
pub const fn decode_target_id(target_id: TargetId) -> Option<TargetIdParts> {
    let id = target_id.get();
    let target_slot = id % TARGET_SLOT_RADIX;
    let rest = id / TARGET_SLOT_RADIX;
    let disk_slot = rest % DISK_RADIX;
    let rest = rest / DISK_RADIX;
    if target_slot == 0 || disk_slot == 0 {
        return None;
    }
    Some(TargetIdParts {
        prefix: (rest / NODE_ID_RADIX) as u32,
        node_id: NodeId::new((rest % NODE_ID_RADIX) as u32),
        disk_index: (disk_slot - 1) as u32,
        target_index: (target_slot - 1) as u32,
    })
}

/// Pack a chain id, rejecting chain indices that overflow their digits.
pub fn encode_chain_id(prefix: u32, disk_index: u32, chain_index: u64) -> Result<ChainId> {
    if chain_index >= CHAIN_INDEX_LIMIT {
        return Err(Error::ChainIndexOverflow {
            chain_index,
            limit: CHAIN_INDEX_LIMIT,
        });
    }
    let id = (prefix as u64 * DISK_RADIX + (disk_index as u64 + 1)) * CHAIN_INDEX_LIMIT + chain_index;
    Ok(ChainId::new(id))
}

/// Unpack a chain id produced by [`encode_chain_id`].
#[must_use]
pub const fn decode_chain_id(chain_id: ChainId) -> Option<ChainIdParts> {
    let id = chain_id.get();
    let chain_index = id % CHAIN_INDEX_LIMIT;
    let rest = id / CHAIN_INDEX_LIMIT;
    let disk_slot = rest % DISK_RADIX;
    if disk_slot == 0 {
        return None;
    }
    Some(ChainIdParts {
        prefix: (rest / DISK_RADIX) as u32,
        disk_index: (disk_slot - 1) as u32,
        chain_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_encode_target_id_layout() {
        let id = encode_target_id(10, NodeId::new(10001), 0, 0);
        assert_eq!(id.get(), 1_001_000_100_101);

        let id = encode_target_id(10, NodeId::new(10001), 4, 2);
        assert_eq!(id.get(), 1_001_000_100_503);
    }

    #[test]
    fn test_encode_target_id_zero_prefix() {
        let id = encode_target_id(0, NodeId::new(1), 0, 0);
        assert_eq!(id.get(), 100_101);
    }

    #[test]
    fn test_target_id_round_trip_at_bounds() {
        for (prefix, node, disk, idx) in [(0, 0, 0, 0), (99, 999_999, 998, 98), (10, 1, 7, 3)] {
            let id = encode_target_id(prefix, NodeId::new(node), disk, idx);
            let parts = decode_target_id(id).unwrap();
            assert_eq!(parts.prefix, prefix);
            assert_eq!(parts.node_id, NodeId::new(node));
            assert_eq!(parts.disk_index, disk);
            assert_eq!(parts.target_index, idx);
        }
    }

    #[test]
    fn test_target_id_injective_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let input = (
                rng.gen_range(0..100u32),
                rng.gen_range(0..1_000_000u32),
                rng.gen_range(0..999u32),
                rng.gen_range(0..99u32),
            );
            if !seen.insert(input) {
                continue;
            }
            let id = encode_target_id(input.0, NodeId::new(input.1), input.2, input.3);
            assert!(ids.insert(id), "collision for {input:?}");
        }
    }

    #[test]
    fn test_decode_rejects_zero_components() {
        assert!(decode_target_id(TargetId::new(1_000_000_100_000)).is_none());
        assert!(decode_chain_id(ChainId::new(1_000_000_001)).is_none());
    }

    #[test]
    fn test_encode_chain_id() {
        let id = encode_chain_id(10, 0, 1).unwrap();
        assert_eq!(id.get(), 1_000_100_001);

        let id = encode_chain_id(10, 2, 99_999).unwrap();
        assert_eq!(id.get(), 1_000_399_999);
        let parts = decode_chain_id(id).unwrap();
        assert_eq!(
            parts,
            ChainIdParts {
                prefix: 10,
                disk_index: 2,
                chain_index: 99_999
            }
        );
    }

    #[test]
    fn test_encode_chain_id_overflow() {
        let err = encode_chain_id(10, 0, CHAIN_INDEX_LIMIT).unwrap_err();
        assert!(matches!(
            err,
            Error::ChainIndexOverflow {
                chain_index: 100_000,
                limit: 100_000
            }
        ));
    }
}
