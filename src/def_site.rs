use std::cmp::{max, min};
use std::fmt;

use crate::node::NodeId;
use crate::offset::Offset;

/// A byte range `[offset, offset + len)` of memory `target` that a node
/// writes or reads.
///
/// An unknown offset means "somewhere in the target", an unknown length means
/// "up to the end of the target".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DefSite {
    pub target: NodeId,
    pub offset: Offset,
    pub len: Offset,
}

impl DefSite {
    pub fn new(target: NodeId, offset: Offset, len: Offset) -> Self {
        Self { target, offset, len }
    }

    /// The whole target: unknown offset, unknown length.
    pub fn whole(target: NodeId) -> Self {
        Self::new(target, Offset::UNKNOWN, Offset::UNKNOWN)
    }

    /// End of the range (exclusive), unknown if the range is unbounded.
    pub fn end(&self) -> Offset {
        self.offset + self.len
    }

    /// Checks whether both the offset and the length are known.
    pub fn is_precise(&self) -> bool {
        !self.offset.is_unknown() && !self.len.is_unknown()
    }

    /// Checks whether the range intersects `[offset, offset + len)` of the same target.
    pub fn overlaps_range(&self, offset: Offset, len: Offset) -> bool {
        if self.offset.is_unknown() || offset.is_unknown() {
            return true;
        }
        // Unknown ends compare greater than every finite offset.
        max(self.offset, offset) < min(self.end(), offset + len)
    }

    /// Two sites overlap iff they share the target and their ranges intersect.
    pub fn overlaps(&self, other: &DefSite) -> bool {
        self.target == other.target && self.overlaps_range(other.offset, other.len)
    }

    /// Checks whether `other` lies completely inside this site.
    ///
    /// Only precise sites can contain anything.
    pub fn contains(&self, other: &DefSite) -> bool {
        self.target == other.target
            && self.is_precise()
            && other.is_precise()
            && self.offset <= other.offset
            && other.end() <= self.end()
    }
}

impl fmt::Display for DefSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset.is_unknown() {
            write!(f, "{}[?]", self.target)
        } else {
            write!(f, "{}[{}..{})", self.target, self.offset, self.end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(target: u32, offset: u64, len: u64) -> DefSite {
        DefSite::new(NodeId::new(target), Offset::new(offset), Offset::new(len))
    }

    #[test]
    fn test_overlaps() {
        assert!(site(1, 0, 4).overlaps(&site(1, 2, 4)));
        assert!(site(1, 0, 4).overlaps(&site(1, 0, 4)));
        assert!(!site(1, 0, 4).overlaps(&site(1, 4, 4)));
        assert!(!site(1, 0, 4).overlaps(&site(2, 0, 4)));
        assert!(!site(1, 4, 0).overlaps(&site(1, 0, 8)));
    }

    #[test]
    fn test_unknown_overlaps_everything() {
        let whole = DefSite::whole(NodeId::new(1));
        assert!(whole.overlaps(&site(1, 1000, 1)));
        assert!(site(1, 1000, 1).overlaps(&whole));

        let tail = DefSite::new(NodeId::new(1), Offset::new(8), Offset::UNKNOWN);
        assert!(tail.overlaps(&site(1, 1 << 40, 4)));
        assert!(!tail.overlaps(&site(1, 0, 8)));
    }

    #[test]
    fn test_contains() {
        assert!(site(1, 0, 8).contains(&site(1, 0, 8)));
        assert!(site(1, 0, 8).contains(&site(1, 2, 4)));
        assert!(!site(1, 0, 8).contains(&site(1, 4, 8)));
        assert!(!site(1, 0, 8).contains(&site(2, 0, 4)));
        assert!(!DefSite::whole(NodeId::new(1)).contains(&site(1, 0, 4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(site(3, 4, 4).to_string(), "@3[4..8)");
        assert_eq!(DefSite::whole(NodeId::new(3)).to_string(), "@3[?]");
    }
}
