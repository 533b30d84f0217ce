//! Incidence relation between physical slots and placement groups
//!
//! The relation is produced by an external placement-model optimizer. Only
//! the true entries are stored; they are kept sorted by
//! `(slot_position, group_id)` so every lookup and every derived ordering is
//! deterministic regardless of the order the producer emitted them in.

use chaintable_common::config::MAX_INCIDENCE_ENTRIES;
use chaintable_common::{Error, GroupId, Result, TopologyParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the pairs of an incidence document are keyed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidenceLayout {
    /// `(slot_position, group_id)`, one entry per physical slot
    #[default]
    Slot,
    /// `(node_position, group_id)`, each node a member of
    /// `num_targets_per_disk` groups (raw optimizer output)
    Node,
}

/// A pair, optionally followed by its boolean matrix value
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Pair(u32, u32),
    Flagged(u32, u32, bool),
}

impl RawEntry {
    const fn into_pair(self) -> Option<(u32, u32)> {
        match self {
            Self::Pair(a, b) | Self::Flagged(a, b, true) => Some((a, b)),
            Self::Flagged(_, _, false) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncidenceDocument {
    Pairs(Vec<RawEntry>),
    Tagged {
        #[serde(default)]
        layout: IncidenceLayout,
        entries: Vec<RawEntry>,
    },
}

/// Sorted set of `(slot_position, group_id)` entries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncidenceRelation {
    entries: Vec<(u32, GroupId)>,
}

impl IncidenceRelation {
    /// Build a relation from `(slot_position, group_id)` pairs.
    ///
    /// No validation happens here; duplicates and gaps are kept so the
    /// validator can report them.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut entries: Vec<(u32, GroupId)> = pairs
            .into_iter()
            .map(|(slot, group)| (slot, GroupId::new(group)))
            .collect();
        entries.sort_unstable();
        Self { entries }
    }

    /// Build a relation from node memberships.
    ///
    /// Pairs are sorted by `(node_position, group_id)` and numbered from 1,
    /// so the k-th group of a node (ascending) becomes the node's k-th slot.
    pub fn from_node_memberships<I>(pairs: I, num_nodes: u32, groups_per_node: u32) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut memberships: Vec<(u32, u32)> = pairs.into_iter().collect();
        memberships.sort_unstable();

        if memberships.is_empty() {
            return Err(Error::EmptyIncidence);
        }
        if let Some(&(node, group)) = memberships.windows(2).find(|w| w[0] == w[1]).map(|w| &w[0]) {
            return Err(Error::DuplicateEntry {
                slot: node,
                group: GroupId::new(group),
            });
        }
        if let Some(&(node, _)) = memberships.iter().find(|(node, _)| *node == 0) {
            return Err(Error::SlotOutOfRange {
                slot: node,
                max: num_nodes,
            });
        }

        let max_node = memberships.last().map_or(0, |&(node, _)| node);
        if max_node != num_nodes {
            return Err(Error::NodeCountMismatch {
                max_node,
                num_nodes,
            });
        }

        let mut counts = vec![0usize; num_nodes as usize];
        for &(node, _) in &memberships {
            counts[node as usize - 1] += 1;
        }
        if let Some((idx, &count)) = counts
            .iter()
            .enumerate()
            .find(|&(_, &count)| count != groups_per_node as usize)
        {
            return Err(Error::NodeMembershipMismatch {
                node: idx as u32 + 1,
                memberships: count,
                expected: groups_per_node,
            });
        }

        let entries = memberships
            .into_iter()
            .enumerate()
            .map(|(idx, (_, group))| (idx as u32 + 1, GroupId::new(group)))
            .collect();
        Ok(Self { entries })
    }

    /// Parse a JSON incidence document.
    ///
    /// Accepts a bare array of `[slot, group]` pairs or an object
    /// `{"layout": "slot" | "node", "entries": [...]}`. A pair may carry a
    /// third boolean element; `false` entries are dropped.
    pub fn from_json(text: &str, params: &TopologyParams) -> Result<Self> {
        params.validate()?;
        let document: IncidenceDocument =
            serde_json::from_str(text).map_err(|e| Error::deserialization(e.to_string()))?;
        let (layout, raw) = match document {
            IncidenceDocument::Pairs(entries) => (IncidenceLayout::Slot, entries),
            IncidenceDocument::Tagged { layout, entries } => (layout, entries),
        };
        if raw.len() >= MAX_INCIDENCE_ENTRIES {
            return Err(Error::IncidenceTooLarge {
                entries: raw.len(),
                limit: MAX_INCIDENCE_ENTRIES,
            });
        }

        let pairs = raw.into_iter().filter_map(RawEntry::into_pair);
        let relation = match layout {
            IncidenceLayout::Slot => Self::from_pairs(pairs),
            IncidenceLayout::Node => {
                Self::from_node_memberships(pairs, params.num_nodes(), params.num_targets_per_disk)?
            }
        };
        debug!(
            "Loaded incidence relation: {} entries, {:?} layout",
            relation.len(),
            layout
        );
        Ok(relation)
    }

    /// Number of true entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the relation has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `(slot_position, group_id)` order
    #[must_use]
    pub fn entries(&self) -> &[(u32, GroupId)] {
        &self.entries
    }

    /// Group assigned to a slot position (1-based).
    ///
    /// Only meaningful once the relation has been validated; with several
    /// groups per slot any one of them may be returned.
    #[must_use]
    pub fn group_of_slot(&self, slot: u32) -> Option<GroupId> {
        self.entries
            .binary_search_by_key(&slot, |&(s, _)| s)
            .ok()
            .map(|idx| self.entries[idx].1)
    }
}

impl FromIterator<(u32, u32)> for IncidenceRelation {
    fn from_iter<T: IntoIterator<Item = (u32, u32)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(num_nodes: u32, targets_per_disk: u32) -> TopologyParams {
        TopologyParams {
            node_id_begin: 1,
            node_id_end: num_nodes,
            num_targets_per_disk: targets_per_disk,
            ..TopologyParams::default()
        }
    }

    #[test]
    fn test_from_pairs_sorts() {
        let relation = IncidenceRelation::from_pairs([(3, 2), (1, 1), (4, 2), (2, 1)]);
        let slots: Vec<u32> = relation.entries().iter().map(|&(s, _)| s).collect();
        assert_eq!(slots, vec![1, 2, 3, 4]);
        assert_eq!(relation.group_of_slot(3), Some(GroupId::new(2)));
        assert_eq!(relation.group_of_slot(5), None);
    }

    #[test]
    fn test_from_node_memberships() {
        // 3 nodes, each in 2 groups
        let relation = IncidenceRelation::from_node_memberships(
            [(2, 3), (1, 2), (3, 1), (1, 1), (2, 1), (3, 3)],
            3,
            2,
        )
        .unwrap();

        let expected: Vec<(u32, GroupId)> = [(1, 1), (2, 2), (3, 1), (4, 3), (5, 1), (6, 3)]
            .into_iter()
            .map(|(s, g)| (s, GroupId::new(g)))
            .collect();
        assert_eq!(relation.entries(), expected.as_slice());
    }

    #[test]
    fn test_from_node_memberships_rejects_uneven_nodes() {
        let err = IncidenceRelation::from_node_memberships([(1, 1), (1, 2), (2, 1)], 2, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NodeMembershipMismatch {
                node: 2,
                memberships: 1,
                expected: 2
            }
        ));

        let err = IncidenceRelation::from_node_memberships([(1, 1), (2, 1)], 3, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::NodeCountMismatch {
                max_node: 2,
                num_nodes: 3
            }
        ));
    }

    #[test]
    fn test_from_json_bare_pairs() {
        let relation =
            IncidenceRelation::from_json("[[1, 1], [2, 1], [3, 2], [4, 2]]", &params(4, 1)).unwrap();
        assert_eq!(relation.len(), 4);
        assert_eq!(relation.group_of_slot(4), Some(GroupId::new(2)));
    }

    #[test]
    fn test_from_json_drops_false_entries() {
        let relation = IncidenceRelation::from_json(
            r#"{"entries": [[1, 1, true], [1, 2, false], [2, 1]]}"#,
            &params(2, 1),
        )
        .unwrap();
        assert_eq!(relation.len(), 2);
        assert_eq!(relation.group_of_slot(1), Some(GroupId::new(1)));
    }

    #[test]
    fn test_from_json_node_layout() {
        let relation = IncidenceRelation::from_json(
            r#"{"layout": "node", "entries": [[1, 1], [1, 2], [2, 1], [2, 2]]}"#,
            &params(2, 2),
        )
        .unwrap();
        let groups: Vec<u32> = relation.entries().iter().map(|&(_, g)| g.get()).collect();
        assert_eq!(groups, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = IncidenceRelation::from_json("{\"rows\": 1}", &params(1, 1)).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }
}
