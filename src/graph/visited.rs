//! Visited-node tracking for a single layer search.
//!
//! A bitset over node ids that remembers which words it touched, so clearing
//! after a search only zeroes those words instead of the whole set.

use super::NodeId;

/// Reusable set of visited node ids.
#[derive(Debug, Default)]
pub struct VisitedSet {
    words: Vec<u64>,
    touched: Vec<usize>,
}

impl VisitedSet {
    /// Creates a set able to hold ids `0..capacity` without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            touched: Vec::new(),
        }
    }

    /// Clears the set and makes room for ids `0..capacity`.
    pub fn reset(&mut self, capacity: usize) {
        self.clear();
        let needed = capacity.div_ceil(64);
        if self.words.len() < needed {
            self.words.resize(needed, 0);
        }
    }

    /// Marks `id` as visited. Returns `false` if it was already visited.
    #[inline]
    pub fn insert(&mut self, id: NodeId) -> bool {
        let (word, bit) = (id / 64, 1u64 << (id % 64));
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let slot = &mut self.words[word];
        if *slot & bit != 0 {
            return false;
        }
        if *slot == 0 {
            self.touched.push(word);
        }
        *slot |= bit;
        true
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.words
            .get(id / 64)
            .is_some_and(|word| word & (1u64 << (id % 64)) != 0)
    }

    /// Number of words holding at least one visited id.
    pub fn touched_words(&self) -> usize {
        self.touched.len()
    }

    pub fn clear(&mut self) {
        for word in self.touched.drain(..) {
            self.words[word] = 0;
        }
    }
}
