//! Abstract memory objects.
//!
//! A [`MemoryObject`] records, for every offset inside one abstract object,
//! the set of pointers that may be stored there. Once an object becomes
//! unknown, it forgets everything and ignores further updates.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::offset::Offset;
use crate::pointer::Pointer;
use crate::points_to::PointsToSet;
use crate::target::{MemoryTarget, TargetTable};

#[derive(Clone)]
pub struct MemoryObject<T> {
    table: Rc<TargetTable<T>>,
    points_to: BTreeMap<Offset, PointsToSet<T>>,
    /// Allocation size in bytes, when known.
    ///
    /// Objects allocated dynamically are usually cast from a byte pointer,
    /// so their size cannot be inferred from the type.
    size: Option<u64>,
    unknown: bool,
}

impl<T> MemoryObject<T>
where
    T: MemoryTarget,
{
    pub fn new(table: Rc<TargetTable<T>>) -> Self {
        Self {
            table,
            points_to: BTreeMap::new(),
            size: None,
            unknown: false,
        }
    }

    pub fn with_size(table: Rc<TargetTable<T>>, size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::new(table)
        }
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn has_size(&self) -> bool {
        self.size.is_some()
    }

    pub fn is_unknown(&self) -> bool {
        self.unknown
    }

    /// Records that the bytes at `offset` may hold `ptr`. Returns true if anything changed.
    pub fn add_points_to(&mut self, offset: Offset, ptr: Pointer<T>) -> bool {
        if self.unknown {
            return false;
        }
        let table = &self.table;
        self.points_to
            .entry(offset)
            .or_insert_with(|| PointsToSet::new(table.clone()))
            .add_pointer(ptr)
    }

    /// Records that the bytes at `offset` may hold any pointer of `pts`.
    pub fn add_points_to_set(&mut self, offset: Offset, pts: &PointsToSet<T>) -> bool {
        if self.unknown {
            return false;
        }
        let table = &self.table;
        self.points_to
            .entry(offset)
            .or_insert_with(|| PointsToSet::new(table.clone()))
            .add_all(pts)
    }

    /// Pointers stored exactly at `offset`.
    pub fn get(&self, offset: Offset) -> Option<&PointsToSet<T>> {
        self.points_to.get(&offset)
    }

    /// Pointers that a read of `offset` may observe: the exact offset, plus
    /// whatever was stored at an unknown offset (and everything, when reading
    /// an unknown offset).
    pub fn read(&self, offset: Offset) -> PointsToSet<T> {
        let mut result = PointsToSet::new(self.table.clone());
        for (&stored, pts) in &self.points_to {
            if offset.is_unknown() || stored.is_unknown() || stored == offset {
                result.add_all(pts);
            }
        }
        result
    }

    /// Iterates over `(offset, points-to set)` pairs in ascending offset order.
    pub fn iter(&self) -> impl Iterator<Item = (Offset, &PointsToSet<T>)> + '_ {
        self.points_to.iter().map(|(&offset, pts)| (offset, pts))
    }

    /// Forgets every fact about the object. Returns true if it was not unknown already.
    pub fn set_unknown(&mut self) -> bool {
        if self.unknown {
            return false;
        }
        debug!("memory object collapsed to unknown ({} offsets dropped)", self.points_to.len());
        self.points_to.clear();
        self.unknown = true;
        true
    }
}

impl<T> fmt::Debug for MemoryObject<T>
where
    T: MemoryTarget,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryObject")
            .field("size", &self.size)
            .field("unknown", &self.unknown)
            .field("points_to", &self.points_to)
            .finish()
    }
}
