//! A bit vector for efficient register-set operations.
//!
//! This module provides a compact bit set implementation optimized for the
//! set operations used by register dataflow analysis: union (the liveness
//! meet), difference (kill sets) and membership tests over sets of registers
//! identified by small integers.
//!
//! # Example
//!
//! ```rust
//! use dexoutline::utils::BitSet;
//!
//! let mut live = BitSet::new(16);
//! live.insert(0);
//! live.insert(5);
//!
//! assert!(live.contains(5));
//! assert_eq!(live.count(), 2);
//!
//! for reg in live.iter() {
//!     println!("live register: v{}", reg);
//! }
//! ```

/// A bit vector for efficient set operations over small integer domains.
///
/// Used by the liveness analysis to track sets of registers per basic block
/// and per instruction boundary. The capacity is fixed at construction time
/// and corresponds to a method's register count.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// The bits, stored as a vector of words.
    words: Vec<u64>,
    /// The number of bits in the set.
    len: usize,
}

impl BitSet {
    /// Creates a new empty bit set with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let num_words = capacity.div_ceil(64);
        Self {
            words: vec![0; num_words],
            len: capacity,
        }
    }

    /// Returns the capacity of this bit set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bit set has no bits set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn insert(&mut self, index: usize) {
        assert!(index < self.len, "index out of bounds");
        let word = index / 64;
        let bit = index % 64;
        self.words[word] |= 1u64 << bit;
    }

    /// Clears the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn remove(&mut self, index: usize) {
        assert!(index < self.len, "index out of bounds");
        let word = index / 64;
        let bit = index % 64;
        self.words[word] &= !(1u64 << bit);
    }

    /// Returns `true` if the bit at the given index is set.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        assert!(index < self.len, "index out of bounds");
        let word = index / 64;
        let bit = index % 64;
        (self.words[word] & (1u64 << bit)) != 0
    }

    /// Returns the number of bits set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clears all bits.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Computes the union with another bit set (in place).
    ///
    /// Returns `true` if `self` changed.
    ///
    /// # Panics
    ///
    /// Panics if the two sets have different capacities.
    pub fn union_with(&mut self, other: &Self) -> bool {
        assert_eq!(self.len, other.len, "bit sets must have same length");
        let mut changed = false;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            let old = *a;
            *a |= *b;
            changed |= old != *a;
        }
        changed
    }

    /// Computes the difference with another bit set (in place).
    ///
    /// Removes all bits that are set in `other` from `self`.
    /// Returns `true` if `self` changed.
    ///
    /// # Panics
    ///
    /// Panics if the two sets have different capacities.
    pub fn difference_with(&mut self, other: &Self) -> bool {
        assert_eq!(self.len, other.len, "bit sets must have same length");
        let mut changed = false;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            let old = *a;
            *a &= !*b;
            changed |= old != *a;
        }
        changed
    }

    /// Returns `true` if this set and `other` share at least one set bit.
    ///
    /// # Panics
    ///
    /// Panics if the two sets have different capacities.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        assert_eq!(self.len, other.len, "bit sets must have same length");
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }

    /// Returns an iterator over the indices of set bits.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            set: self,
            word_idx: 0,
            bit_idx: 0,
        }
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for i in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "v{i}")?;
            first = false;
        }
        write!(f, "}}")
    }
}

/// Iterator over the set bits in a `BitSet`.
pub struct BitSetIter<'a> {
    set: &'a BitSet,
    word_idx: usize,
    bit_idx: usize,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word_idx < self.set.words.len() {
            let word = self.set.words[self.word_idx];
            while self.bit_idx < 64 {
                let idx = self.word_idx * 64 + self.bit_idx;
                if idx >= self.set.len {
                    return None;
                }
                self.bit_idx += 1;
                if (word & (1u64 << (self.bit_idx - 1))) != 0 {
                    return Some(idx);
                }
            }
            self.word_idx += 1;
            self.bit_idx = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = BitSet::new(40);
        assert!(bs.is_empty());
        assert_eq!(bs.count(), 0);

        bs.insert(0);
        bs.insert(7);
        bs.insert(39);

        assert!(!bs.is_empty());
        assert_eq!(bs.count(), 3);
        assert!(bs.contains(0));
        assert!(bs.contains(7));
        assert!(bs.contains(39));
        assert!(!bs.contains(1));
    }

    #[test]
    fn test_bitset_remove() {
        let mut bs = BitSet::new(16);
        bs.insert(9);
        assert!(bs.contains(9));

        bs.remove(9);
        assert!(!bs.contains(9));
    }

    #[test]
    fn test_bitset_union() {
        let mut a = BitSet::new(70);
        let mut b = BitSet::new(70);

        a.insert(0);
        a.insert(65);
        b.insert(1);
        b.insert(65);

        let changed = a.union_with(&b);
        assert!(changed);
        assert!(a.contains(0));
        assert!(a.contains(1));
        assert!(a.contains(65));
        assert_eq!(a.count(), 3);

        // Second union with the same set is a no-op
        assert!(!a.union_with(&b));
    }

    #[test]
    fn test_bitset_difference() {
        let mut live = BitSet::new(16);
        let mut defs = BitSet::new(16);

        live.insert(0);
        live.insert(1);
        live.insert(2);
        defs.insert(1);

        let changed = live.difference_with(&defs);
        assert!(changed);
        assert!(live.contains(0));
        assert!(!live.contains(1));
        assert!(live.contains(2));
        assert_eq!(live.count(), 2);
    }

    #[test]
    fn test_bitset_intersects() {
        let mut a = BitSet::new(128);
        let mut b = BitSet::new(128);

        a.insert(3);
        a.insert(100);
        b.insert(4);
        assert!(!a.intersects(&b));

        b.insert(100);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_bitset_iter() {
        let mut bs = BitSet::new(80);
        bs.insert(2);
        bs.insert(63);
        bs.insert(64);

        let bits: Vec<_> = bs.iter().collect();
        assert_eq!(bits, vec![2, 63, 64]);
    }
}
