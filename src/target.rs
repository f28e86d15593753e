//! Memory targets and the target identity table.
//!
//! A *target* is an abstract memory location a pointer may reference: an
//! allocation site, a node, or one of the distinguished placeholders
//! (unknown memory, null, invalidated memory).
//!
//! Points-to sets index their targets densely. The mapping from targets to
//! dense ids lives in a [`TargetTable`] that every cooperating set shares
//! (usually through an [`Rc`]). The table is append-only: ids are assigned on
//! first use, increase monotonically and are never reused.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use log::trace;

/// An identity a pointer can reference.
pub trait MemoryTarget: Copy + Eq + Ord + Hash + Debug {
    /// Placeholder for memory that cannot be determined statically.
    const UNKNOWN_MEMORY: Self;
    /// The null target.
    const NULL: Self;
    /// Memory that was freed or otherwise went out of scope.
    const INVALIDATED: Self;

    fn is_unknown_memory(&self) -> bool {
        *self == Self::UNKNOWN_MEMORY
    }

    fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    fn is_invalidated(&self) -> bool {
        *self == Self::INVALIDATED
    }
}

/// Interner assigning dense ids to targets.
#[derive(Debug)]
pub struct TargetTable<T> {
    ids: RefCell<HashMap<T, usize>>,
    targets: RefCell<Vec<T>>,
}

impl<T> TargetTable<T>
where
    T: MemoryTarget,
{
    pub fn new() -> Self {
        Self {
            ids: RefCell::new(HashMap::new()),
            targets: RefCell::new(Vec::new()),
        }
    }

    /// Creates an empty table behind a shared handle.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Get the id of the target, assigning a fresh one on first use.
    pub fn id(&self, target: T) -> usize {
        if let Some(&id) = self.ids.borrow().get(&target) {
            return id;
        }
        let mut targets = self.targets.borrow_mut();
        let id = targets.len();
        targets.push(target);
        self.ids.borrow_mut().insert(target, id);
        trace!("target {:?} -> id {}", target, id);
        id
    }

    /// Get the id of the target without assigning one.
    pub fn lookup(&self, target: T) -> Option<usize> {
        self.ids.borrow().get(&target).copied()
    }

    /// Get the target with the given id.
    ///
    /// # Panics
    ///
    /// Panics if no target was assigned the id.
    pub fn target(&self, id: usize) -> T {
        let targets = self.targets.borrow();
        assert!(id < targets.len(), "Target id {} is not assigned", id);
        targets[id]
    }

    /// Number of targets seen so far.
    pub fn len(&self) -> usize {
        self.targets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TargetTable<T>
where
    T: MemoryTarget,
{
    fn default() -> Self {
        Self::new()
    }
}
