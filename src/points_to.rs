//! Points-to sets optimized for small offsets.
//!
//! A [`PointsToSet`] stores pointers `(target, offset)` in two containers:
//!
//! - **Dense index**: a [`SparseBitSet`] where every target owns one 64-bit
//!   word, at position `id * 64`, `id` being the dense target id assigned by the
//!   shared [`TargetTable`]. Bits `0..=62` stand for the offsets `0..=62`, bit 63
//!   stands for the unknown offset.
//! - **Overflow set**: an ordered set holding the pointers with finite offsets
//!   above [`MAX_DENSE_OFFSET`].
//!
//! Offsets are almost always small field or array indices, so nearly all
//! operations are single bit operations. Larger offsets still work, they only
//! spill over to the ordered set.
//!
//! The set maintains one normalization invariant: if it contains
//! `(T, unknown)`, it contains no other pointer to `T`.
//!
//! # Examples
//!
//! ```
//! use rd_rs::node::NodeId;
//! use rd_rs::offset::Offset;
//! use rd_rs::pointer::Pointer;
//! use rd_rs::points_to::PointsToSet;
//! use rd_rs::target::TargetTable;
//!
//! let table = TargetTable::shared();
//! let mut pts = PointsToSet::new(table);
//! let obj = NodeId::new(1);
//!
//! assert!(pts.add(obj, Offset::new(8)));
//! assert!(pts.add(obj, Offset::new(1000)));
//! assert_eq!(pts.len(), 2);
//!
//! // Unknown offset subsumes every finite offset of the same target.
//! assert!(pts.add(obj, Offset::UNKNOWN));
//! assert_eq!(pts.len(), 1);
//! assert!(pts.may_point_to(&Pointer::new(obj, Offset::new(16))));
//! assert!(!pts.points_to(&Pointer::new(obj, Offset::new(16))));
//! ```

use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::bitset::{SparseBitSet, SparseBitSetIter};
use crate::offset::Offset;
use crate::pointer::Pointer;
use crate::target::{MemoryTarget, TargetTable};

/// Largest offset stored in the dense index.
pub const MAX_DENSE_OFFSET: u64 = 62;

/// Bit of a target word encoding the unknown offset.
const UNKNOWN_BIT: usize = 63;
const UNKNOWN_MASK: u64 = 1 << UNKNOWN_BIT;

const STRIDE: usize = SparseBitSet::BITS_PER_WORD;

/// A set of pointers scoped to one owner (a pointer-valued node or a memory object).
#[derive(Clone)]
pub struct PointsToSet<T> {
    table: Rc<TargetTable<T>>,
    pointers: SparseBitSet,
    large_pointers: BTreeSet<Pointer<T>>,
}

impl<T> PointsToSet<T>
where
    T: MemoryTarget,
{
    /// Creates an empty set whose targets are numbered by `table`.
    pub fn new(table: Rc<TargetTable<T>>) -> Self {
        Self {
            table,
            pointers: SparseBitSet::new(),
            large_pointers: BTreeSet::new(),
        }
    }

    /// Creates a set containing the given pointers.
    pub fn from_pointers(table: Rc<TargetTable<T>>, pointers: impl IntoIterator<Item = Pointer<T>>) -> Self {
        let mut pts = Self::new(table);
        for ptr in pointers {
            pts.add_pointer(ptr);
        }
        pts
    }

    /// The identity table shared by this set.
    pub fn table(&self) -> &Rc<TargetTable<T>> {
        &self.table
    }

    fn is_dense(offset: Offset) -> bool {
        match offset.get() {
            None => true,
            Some(offset) => offset <= MAX_DENSE_OFFSET,
        }
    }

    fn position(id: usize, offset: Offset) -> usize {
        let bit = match offset.get() {
            None => UNKNOWN_BIT,
            Some(offset) => offset as usize,
        };
        id * STRIDE + bit
    }

    fn has_unknown_offset(&self, id: usize) -> bool {
        self.pointers.word(id) & UNKNOWN_MASK != 0
    }

    fn remove_large(&mut self, target: T) -> bool {
        let before = self.large_pointers.len();
        self.large_pointers.retain(|ptr| ptr.target != target);
        before != self.large_pointers.len()
    }

    /// Adds `(target, offset)`. Returns true if the set changed.
    ///
    /// Adding a finite offset is a no-op when the set already points to an
    /// unknown offset of `target`. Adding the unknown offset first removes
    /// every other pointer to `target`.
    pub fn add(&mut self, target: T, offset: Offset) -> bool {
        let id = self.table.id(target);
        if self.has_unknown_offset(id) {
            return false;
        }
        if offset.is_unknown() {
            self.remove_any(target);
            self.pointers.insert(Self::position(id, offset))
        } else if Self::is_dense(offset) {
            self.pointers.insert(Self::position(id, offset))
        } else {
            self.large_pointers.insert(Pointer::new(target, offset))
        }
    }

    pub fn add_pointer(&mut self, ptr: Pointer<T>) -> bool {
        self.add(ptr.target, ptr.offset)
    }

    /// Adds all pointers of `other`. Returns true if the set changed.
    ///
    /// # Panics
    ///
    /// Panics if the sets do not share the same target table.
    pub fn add_all(&mut self, other: &PointsToSet<T>) -> bool {
        assert!(
            Rc::ptr_eq(&self.table, &other.table),
            "Points-to sets must share the target table"
        );

        let mut changed = false;
        for (id, word) in other.pointers.words() {
            let mine = self.pointers.word(id);
            let mut merged = mine | word;
            if merged & UNKNOWN_MASK != 0 {
                merged = UNKNOWN_MASK;
                if mine & UNKNOWN_MASK == 0 {
                    let target = self.table.target(id);
                    changed |= self.remove_large(target);
                }
            }
            changed |= self.pointers.set_word(id, merged);
        }
        for ptr in &other.large_pointers {
            let id = self.table.id(ptr.target);
            if !self.has_unknown_offset(id) {
                changed |= self.large_pointers.insert(*ptr);
            }
        }
        changed
    }

    /// Removes exactly the given pointer. Returns true if the set changed.
    pub fn remove(&mut self, ptr: &Pointer<T>) -> bool {
        if Self::is_dense(ptr.offset) {
            match self.table.lookup(ptr.target) {
                Some(id) => self.pointers.remove(Self::position(id, ptr.offset)),
                None => false,
            }
        } else {
            self.large_pointers.remove(ptr)
        }
    }

    pub fn remove_at(&mut self, target: T, offset: Offset) -> bool {
        self.remove(&Pointer::new(target, offset))
    }

    /// Removes every pointer to `target`, whatever its offset. Returns true if the set changed.
    pub fn remove_any(&mut self, target: T) -> bool {
        let mut changed = false;
        if let Some(id) = self.table.lookup(target) {
            changed |= self.pointers.clear_word(id);
        }
        changed |= self.remove_large(target);
        changed
    }

    pub fn clear(&mut self) {
        self.pointers.clear();
        self.large_pointers.clear();
    }

    /// Exact membership.
    pub fn points_to(&self, ptr: &Pointer<T>) -> bool {
        if Self::is_dense(ptr.offset) {
            match self.table.lookup(ptr.target) {
                Some(id) => self.pointers.contains(Self::position(id, ptr.offset)),
                None => false,
            }
        } else {
            self.large_pointers.contains(ptr)
        }
    }

    /// Exact membership, or membership of the unknown offset of the same target.
    pub fn may_point_to(&self, ptr: &Pointer<T>) -> bool {
        self.points_to(ptr) || self.points_to(&Pointer::unknown_offset(ptr.target))
    }

    /// Checks that the set is exactly `{ptr}`.
    ///
    /// # Panics
    ///
    /// Panics if the offset of `ptr` is unknown, "must" is undefined there.
    pub fn must_point_to(&self, ptr: &Pointer<T>) -> bool {
        assert!(
            !ptr.offset.is_unknown(),
            "must_point_to makes no sense with an unknown offset"
        );
        self.points_to(ptr) && self.is_singleton()
    }

    /// Checks whether the set contains any pointer to `target`.
    pub fn points_to_target(&self, target: T) -> bool {
        if let Some(id) = self.table.lookup(target) {
            if self.pointers.word(id) != 0 {
                return true;
            }
        }
        self.large_pointers.iter().any(|ptr| ptr.target == target)
    }

    pub fn is_singleton(&self) -> bool {
        self.len() == 1
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty() && self.large_pointers.is_empty()
    }

    /// Number of pointers: dense population plus overflow cardinality.
    pub fn len(&self) -> usize {
        self.pointers.len() + self.large_pointers.len()
    }

    pub fn count(&self, ptr: &Pointer<T>) -> usize {
        self.points_to(ptr) as usize
    }

    pub fn has(&self, ptr: &Pointer<T>) -> bool {
        self.points_to(ptr)
    }

    pub fn has_unknown(&self) -> bool {
        self.points_to_target(T::UNKNOWN_MEMORY)
    }

    pub fn has_null(&self) -> bool {
        self.points_to_target(T::NULL)
    }

    pub fn has_invalidated(&self) -> bool {
        self.points_to_target(T::INVALIDATED)
    }

    pub fn swap(&mut self, other: &mut PointsToSet<T>) {
        std::mem::swap(self, other);
    }

    /// Number of pointers kept in the overflow set.
    pub fn overflow_len(&self) -> usize {
        self.large_pointers.len()
    }

    /// Number of pointers kept in the dense index.
    pub fn dense_len(&self) -> usize {
        self.pointers.len()
    }

    /// Iterates over the dense index first (ascending target id, then
    /// ascending offset, unknown last), then over the overflow set.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            table: &self.table,
            dense: self.pointers.iter(),
            large: self.large_pointers.iter(),
        }
    }
}

impl<T> PartialEq for PointsToSet<T>
where
    T: MemoryTarget,
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.table, &other.table)
            && self.pointers == other.pointers
            && self.large_pointers == other.large_pointers
    }
}

impl<T> Eq for PointsToSet<T>
where
    T: MemoryTarget,
{
}

impl<T> fmt::Debug for PointsToSet<T>
where
    T: MemoryTarget,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over the pointers of a [`PointsToSet`].
pub struct Iter<'a, T> {
    table: &'a TargetTable<T>,
    dense: SparseBitSetIter<'a>,
    large: btree_set::Iter<'a, Pointer<T>>,
}

impl<T> Iterator for Iter<'_, T>
where
    T: MemoryTarget,
{
    type Item = Pointer<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(position) = self.dense.next() {
            let id = position / STRIDE;
            let bit = position % STRIDE;
            let target = self.table.target(id);
            let offset = if bit == UNKNOWN_BIT {
                Offset::UNKNOWN
            } else {
                Offset::new(bit as u64)
            };
            return Some(Pointer::new(target, offset));
        }
        self.large.next().copied()
    }
}

impl<'a, T> IntoIterator for &'a PointsToSet<T>
where
    T: MemoryTarget,
{
    type Item = Pointer<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
