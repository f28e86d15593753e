//! Reaching-definitions maps.
//!
//! An [`RdMap`] maps def sites to the set of nodes whose writes to that site
//! may still be observed. Sites are kept exactly as written; queries collect
//! every site that intersects the queried range.
//!
//! Contributor sets form a lattice of height `max_set_size + 1`: once a set
//! would grow past the cap, it collapses to `{UNKNOWN_MEMORY}`, which is the
//! top element and absorbs every further contributor.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;

use crate::def_site::DefSite;
use crate::node::NodeId;
use crate::offset::Offset;
use crate::target::MemoryTarget;

/// A set of contributing nodes.
pub type NodeSet = BTreeSet<NodeId>;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RdMap {
    defs: BTreeMap<DefSite, NodeSet>,
}

/// Checks whether the set already collapsed to unknown memory.
fn is_collapsed(set: &NodeSet) -> bool {
    set.contains(&NodeId::UNKNOWN_MEMORY)
}

fn collapse(set: &mut NodeSet) {
    set.clear();
    set.insert(NodeId::UNKNOWN_MEMORY);
}

/// Joins `contributors` into `set`, respecting the precision cap. Returns true if `set` changed.
fn join(set: &mut NodeSet, contributors: impl IntoIterator<Item = NodeId>, max_set_size: usize) -> bool {
    if is_collapsed(set) {
        return false;
    }
    let mut changed = false;
    for node in contributors {
        if node.is_unknown_memory() {
            collapse(set);
            return true;
        }
        changed |= set.insert(node);
    }
    if set.len() > max_set_size {
        debug!("contributor set of size {} exceeds {}, collapsing", set.len(), max_set_size);
        collapse(set);
    }
    changed
}

impl RdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of def sites in the map.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Contributors of exactly this site.
    pub fn get_site(&self, ds: &DefSite) -> Option<&NodeSet> {
        self.defs.get(ds)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DefSite, &NodeSet)> + '_ {
        self.defs.iter()
    }

    /// All entries of the map writing to `target`.
    fn entries_of(&self, target: NodeId) -> impl Iterator<Item = (&DefSite, &NodeSet)> + '_ {
        let lo = DefSite::new(target, Offset::ZERO, Offset::ZERO);
        let hi = DefSite::new(target, Offset::UNKNOWN, Offset::UNKNOWN);
        self.defs.range(lo..=hi)
    }

    /// Strong update: `node` becomes the only contributor of `ds`. Returns true if the map changed.
    pub fn update(&mut self, ds: DefSite, node: NodeId) -> bool {
        let fresh = NodeSet::from([node]);
        match self.defs.insert(ds, fresh) {
            Some(old) => old.len() != 1 || !old.contains(&node),
            None => true,
        }
    }

    /// Weak update: `node` joins the contributors of `ds`. Returns true if the map changed.
    pub fn add(&mut self, ds: DefSite, node: NodeId, max_set_size: usize) -> bool {
        let set = self.defs.entry(ds).or_default();
        join(set, [node], max_set_size)
    }

    /// Removes every entry that a strong write of `ds` makes invisible. Returns true if the map changed.
    pub fn kill(&mut self, ds: &DefSite) -> bool {
        let before = self.defs.len();
        self.defs.retain(|site, _| !kills(ds, site));
        before != self.defs.len()
    }

    /// Joins `other` into this map, skipping every entry killed by one of the
    /// sites in `overwrites`. Returns true if the map changed.
    pub fn merge(&mut self, other: &RdMap, overwrites: &BTreeSet<DefSite>, max_set_size: usize) -> bool {
        let mut changed = false;
        for (site, nodes) in &other.defs {
            if overwrites.iter().any(|ds| kills(ds, site)) {
                continue;
            }
            let set = self.defs.entry(*site).or_default();
            let was_empty = set.is_empty();
            changed |= join(set, nodes.iter().copied(), max_set_size) || was_empty;
        }
        changed
    }

    /// Nodes whose writes to `[offset, offset + len)` of `target` may be observed.
    pub fn get(&self, target: NodeId, offset: Offset, len: Offset) -> NodeSet {
        let mut result = NodeSet::new();
        for (site, nodes) in self.entries_of(target) {
            if site.overlaps_range(offset, len) {
                result.extend(nodes.iter().copied());
            }
        }
        result
    }

    /// Checks whether any entry writes to `target`.
    pub fn defines_target(&self, target: NodeId) -> bool {
        self.entries_of(target).next().is_some()
    }
}

/// Checks whether a strong write of `ds` hides the earlier write of `site`.
///
/// A write with an unknown offset or length only hides the identical site.
fn kills(ds: &DefSite, site: &DefSite) -> bool {
    ds == site || ds.contains(site)
}

impl fmt::Display for RdMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (site, nodes) in &self.defs {
            write!(f, "{} <-", site)?;
            for node in nodes {
                write!(f, " {}", node)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn site(target: u32, offset: u64, len: u64) -> DefSite {
        DefSite::new(NodeId::new(target), Offset::new(offset), Offset::new(len))
    }

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    #[test]
    fn test_update_replaces() {
        let mut map = RdMap::new();
        map.add(site(1, 0, 4), n(2), usize::MAX);
        map.add(site(1, 0, 4), n(3), usize::MAX);
        assert!(map.update(site(1, 0, 4), n(4)));
        assert_eq!(map.get_site(&site(1, 0, 4)), Some(&NodeSet::from([n(4)])));
        assert!(!map.update(site(1, 0, 4), n(4)));
    }

    #[test]
    fn test_add_accumulates() {
        let mut map = RdMap::new();
        assert!(map.add(site(1, 0, 4), n(2), usize::MAX));
        assert!(map.add(site(1, 0, 4), n(3), usize::MAX));
        assert!(!map.add(site(1, 0, 4), n(3), usize::MAX));
        assert_eq!(map.get(n(1), Offset::new(0), Offset::new(4)), NodeSet::from([n(2), n(3)]));
    }

    #[test]
    fn test_collapse_is_absorbing() {
        let mut map = RdMap::new();
        map.add(site(1, 0, 4), n(2), 2);
        map.add(site(1, 0, 4), n(3), 2);
        assert!(map.add(site(1, 0, 4), n(4), 2));
        assert_eq!(map.get_site(&site(1, 0, 4)), Some(&NodeSet::from([NodeId::UNKNOWN_MEMORY])));
        assert!(!map.add(site(1, 0, 4), n(5), 2));
    }

    #[test]
    fn test_get_intersects_ranges() {
        let mut map = RdMap::new();
        map.update(site(1, 0, 4), n(2));
        map.update(site(1, 4, 4), n(3));
        map.update(DefSite::whole(n(5)), n(6));
        map.update(site(7, 0, 4), n(8));

        assert_eq!(map.get(n(1), Offset::new(0), Offset::new(4)), NodeSet::from([n(2)]));
        assert_eq!(map.get(n(1), Offset::new(2), Offset::new(4)), NodeSet::from([n(2), n(3)]));
        assert_eq!(map.get(n(1), Offset::UNKNOWN, Offset::UNKNOWN), NodeSet::from([n(2), n(3)]));
        assert_eq!(map.get(n(5), Offset::new(100), Offset::new(1)), NodeSet::from([n(6)]));
        assert!(map.get(n(9), Offset::new(0), Offset::new(4)).is_empty());
        assert!(map.defines_target(n(7)));
        assert!(!map.defines_target(n(9)));
    }

    #[test]
    fn test_merge_skips_killed() {
        let mut pred = RdMap::new();
        pred.update(site(1, 0, 4), n(2));
        pred.update(site(1, 4, 4), n(3));
        pred.update(site(1, 0, 16), n(4));

        let overwrites = BTreeSet::from([site(1, 0, 8)]);
        let mut map = RdMap::new();
        assert!(map.merge(&pred, &overwrites, usize::MAX));
        // [0,4) and [4,8) are inside the overwritten range, [0,16) is not.
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(n(1), Offset::new(0), Offset::new(4)), NodeSet::from([n(4)]));
        assert!(!map.merge(&pred, &overwrites, usize::MAX));
    }

    #[test]
    fn test_unknown_overwrite_kills_only_identical_site() {
        let mut map = RdMap::new();
        map.update(DefSite::whole(n(1)), n(2));
        map.update(site(1, 0, 4), n(3));
        assert!(map.kill(&DefSite::whole(n(1))));
        assert_eq!(map.len(), 1);
        assert!(map.get_site(&site(1, 0, 4)).is_some());
    }

    #[test]
    fn test_merge_respects_cap() {
        let mut a = RdMap::new();
        a.add(site(1, 0, 4), n(2), 2);
        let mut b = RdMap::new();
        b.add(site(1, 0, 4), n(3), 2);
        b.add(site(1, 0, 4), n(4), 2);

        assert!(a.merge(&b, &BTreeSet::new(), 2));
        assert_eq!(a.get(n(1), Offset::new(0), Offset::new(4)), NodeSet::from([NodeId::UNKNOWN_MEMORY]));
    }

    #[test]
    fn test_display() {
        let mut map = RdMap::new();
        map.add(site(1, 0, 4), n(2), usize::MAX);
        map.add(site(1, 0, 4), n(3), usize::MAX);
        assert_eq!(map.to_string(), "@1[0..4) <- @2 @3\n");
    }
}
