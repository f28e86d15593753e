//! Byte offsets that may be statically unknown.
//!
//! An [`Offset`] is either a finite non-negative number of bytes or the
//! distinguished value [`Offset::UNKNOWN`]. Unknown is absorbing under addition
//! and overlaps every range.

use std::fmt;
use std::ops::{Add, AddAssign};

/// A byte offset, possibly unknown.
///
/// The ordering is total (unknown compares greater than every finite offset),
/// so offsets can be used as keys in ordered containers. The ordering only
/// carries meaning between two finite offsets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Offset(u64);

impl Offset {
    /// The unknown offset.
    pub const UNKNOWN: Offset = Offset(u64::MAX);

    /// The zero offset.
    pub const ZERO: Offset = Offset(0);

    /// Creates a finite offset.
    ///
    /// Passing `u64::MAX` yields [`Offset::UNKNOWN`].
    pub const fn new(offset: u64) -> Self {
        Offset(offset)
    }

    pub const fn is_unknown(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the finite value, or `None` for the unknown offset.
    pub const fn get(self) -> Option<u64> {
        if self.is_unknown() {
            None
        } else {
            Some(self.0)
        }
    }

    /// Checks whether this offset lies in the half-open range `[start, end)`.
    ///
    /// An unknown offset (or an unknown `start`) is in every range,
    /// an unknown `end` makes the range unbounded.
    pub fn in_range(self, start: Offset, end: Offset) -> bool {
        if self.is_unknown() || start.is_unknown() {
            return true;
        }
        self.0 >= start.0 && (end.is_unknown() || self.0 < end.0)
    }
}

impl Default for Offset {
    fn default() -> Self {
        Offset::UNKNOWN
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Self::Output {
        if self.is_unknown() || rhs.is_unknown() {
            return Offset::UNKNOWN;
        }
        // Overflow means we lost track of the value.
        self.0.checked_add(rhs.0).map_or(Offset::UNKNOWN, Offset)
    }
}

impl Add<u64> for Offset {
    type Output = Offset;

    fn add(self, rhs: u64) -> Self::Output {
        self + Offset::new(rhs)
    }
}

impl AddAssign for Offset {
    fn add_assign(&mut self, rhs: Offset) {
        *self = *self + rhs;
    }
}

impl From<u64> for Offset {
    fn from(offset: u64) -> Self {
        Offset::new(offset)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(offset) => write!(f, "{}", offset),
            None => write!(f, "?"),
        }
    }
}
