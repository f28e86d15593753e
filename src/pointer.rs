use std::fmt;

use crate::offset::Offset;
use crate::target::MemoryTarget;

/// Points to byte `offset` of `target`, or somewhere into `target` when the
/// offset is unknown.
///
/// Ordering is lexicographic on `(target, offset)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Pointer<T> {
    pub target: T,
    pub offset: Offset,
}

impl<T> Pointer<T>
where
    T: MemoryTarget,
{
    pub fn new(target: T, offset: Offset) -> Self {
        Self { target, offset }
    }

    /// Pointer to an unknown offset of `target`.
    pub fn unknown_offset(target: T) -> Self {
        Self::new(target, Offset::UNKNOWN)
    }

    pub fn is_null(&self) -> bool {
        self.target.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.target.is_unknown_memory()
    }

    pub fn is_invalidated(&self) -> bool {
        self.target.is_invalidated()
    }
}

impl<T> fmt::Display for Pointer<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.target, self.offset)
    }
}
