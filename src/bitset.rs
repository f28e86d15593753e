//! Sparse bit set backing the dense part of points-to sets.
//!
//! Bits are grouped in 64-bit words, and only non-zero words are stored (in an
//! ordered map keyed by word index). Each points-to target owns exactly one
//! word, so whole-target operations are single word operations.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// A sparse bit set of `usize` indices.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SparseBitSet {
    /// Non-zero words, keyed by word index.
    words: BTreeMap<usize, u64>,
    /// Number of set bits (cached for O(1) len())
    count: usize,
}

impl SparseBitSet {
    /// Number of bits per word.
    pub const BITS_PER_WORD: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no bits are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    fn word_and_bit(index: usize) -> (usize, usize) {
        (index / Self::BITS_PER_WORD, index % Self::BITS_PER_WORD)
    }

    /// Returns true if the bit at the given index is set.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        self.word(word_idx) & (1u64 << bit_idx) != 0
    }

    /// Sets the bit at the given index. Returns true if the bit was not previously set.
    pub fn insert(&mut self, index: usize) -> bool {
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        let mask = 1u64 << bit_idx;
        let word = self.words.entry(word_idx).or_insert(0);
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.count += 1;
        true
    }

    /// Clears the bit at the given index. Returns true if the bit was previously set.
    pub fn remove(&mut self, index: usize) -> bool {
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        let mask = 1u64 << bit_idx;
        let btree_map::Entry::Occupied(mut entry) = self.words.entry(word_idx) else {
            return false;
        };
        if *entry.get() & mask == 0 {
            return false;
        }
        *entry.get_mut() &= !mask;
        self.count -= 1;
        if *entry.get() == 0 {
            entry.remove();
        }
        true
    }

    /// Returns the word with the given index (zero if absent).
    #[inline]
    pub fn word(&self, word_idx: usize) -> u64 {
        self.words.get(&word_idx).copied().unwrap_or(0)
    }

    /// Replaces the word with the given index. Returns true if it changed.
    pub fn set_word(&mut self, word_idx: usize, value: u64) -> bool {
        let old = self.word(word_idx);
        if old == value {
            return false;
        }
        self.count -= old.count_ones() as usize;
        self.count += value.count_ones() as usize;
        if value == 0 {
            self.words.remove(&word_idx);
        } else {
            self.words.insert(word_idx, value);
        }
        true
    }

    /// Clears the whole word with the given index. Returns true if any bit was set.
    pub fn clear_word(&mut self, word_idx: usize) -> bool {
        self.set_word(word_idx, 0)
    }

    /// Iterates over the non-zero words in ascending word order.
    pub fn words(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.words.iter().map(|(&i, &w)| (i, w))
    }

    /// Sets all bits of `other`. Returns true if any bit was not previously set.
    pub fn union_with(&mut self, other: &SparseBitSet) -> bool {
        let mut changed = false;
        for (word_idx, word) in other.words() {
            let merged = self.word(word_idx) | word;
            changed |= self.set_word(word_idx, merged);
        }
        changed
    }

    /// Clears all bits.
    pub fn clear(&mut self) {
        self.words.clear();
        self.count = 0;
    }

    /// Extends the bit set by setting all bits from an iterator.
    pub fn extend(&mut self, iter: impl IntoIterator<Item = usize>) {
        for index in iter {
            self.insert(index);
        }
    }

    /// Returns an iterator over all set bit indices, in ascending order.
    pub fn iter(&self) -> SparseBitSetIter<'_> {
        SparseBitSetIter {
            words: self.words.iter(),
            word_idx: 0,
            current_word: 0,
        }
    }
}

/// Iterator over set bits in a [`SparseBitSet`].
#[derive(Debug, Clone)]
pub struct SparseBitSetIter<'a> {
    words: btree_map::Iter<'a, usize, u64>,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for SparseBitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit_idx = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1; // Clear lowest set bit
                return Some(self.word_idx * SparseBitSet::BITS_PER_WORD + bit_idx);
            }
            let (&word_idx, &word) = self.words.next()?;
            self.word_idx = word_idx;
            self.current_word = word;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let bs = SparseBitSet::new();
        assert!(bs.is_empty());
        assert_eq!(bs.len(), 0);
        assert!(!bs.contains(0));
        assert!(!bs.contains(100_000));
    }

    #[test]
    fn test_insert_contains() {
        let mut bs = SparseBitSet::new();
        assert!(!bs.contains(42));
        assert!(bs.insert(42));
        assert!(bs.contains(42));
        assert!(!bs.insert(42)); // Already set
        assert_eq!(bs.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut bs = SparseBitSet::new();
        bs.insert(42);
        assert!(bs.remove(42));
        assert!(!bs.contains(42));
        assert!(!bs.remove(42)); // Already cleared
        assert_eq!(bs.len(), 0);
        assert_eq!(bs.words().count(), 0);
    }

    #[test]
    fn test_far_indices_stay_sparse() {
        let mut bs = SparseBitSet::new();
        bs.insert(1 << 40);
        bs.insert(3);
        assert_eq!(bs.words().count(), 2);
        assert_eq!(bs.iter().collect::<Vec<_>>(), vec![3, 1 << 40]);
    }

    #[test]
    fn test_word_ops() {
        let mut bs = SparseBitSet::new();
        bs.extend([64, 65, 127, 128]);
        assert_eq!(bs.word(1), (1 << 0) | (1 << 1) | (1 << 63));
        assert!(bs.clear_word(1));
        assert!(!bs.clear_word(1));
        assert_eq!(bs.len(), 1);
        assert!(bs.set_word(5, 0b101));
        assert_eq!(bs.len(), 3);
        assert!(bs.contains(320));
        assert!(bs.contains(322));
    }

    #[test]
    fn test_union_with() {
        let mut a = SparseBitSet::new();
        a.extend([1, 70]);
        let mut b = SparseBitSet::new();
        b.extend([1, 2, 500]);

        assert!(a.union_with(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 2, 70, 500]);
        assert_eq!(a.len(), 4);
        assert!(!a.union_with(&b));
    }

    #[test]
    fn test_iter() {
        let mut bs = SparseBitSet::new();
        bs.insert(5);
        bs.insert(10);
        bs.insert(3);
        bs.insert(64); // Second word
        bs.insert(65);

        let indices: Vec<_> = bs.iter().collect();
        assert_eq!(indices, vec![3, 5, 10, 64, 65]);
    }

    #[test]
    fn test_clear() {
        let mut bs = SparseBitSet::new();
        bs.extend([1, 50, 99]);
        bs.clear();
        assert!(bs.is_empty());
        assert!(!bs.contains(1));
        assert!(!bs.contains(99));
    }
}
