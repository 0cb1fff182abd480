use super::BPlusSet;
use crate::raw::RawBPlusSet;

impl<K, const N: usize> BPlusSet<K, N> {
    /// Creates an empty set with node storage reserved for at least
    /// `capacity` keys, assuming full leaves.
    ///
    /// This is an extension and is not part of the standard `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_set::BPlusSet;
    ///
    /// let set = BPlusSet::<i32>::with_capacity(16);
    /// assert!(set.is_empty());
    /// assert!(set.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        BPlusSet {
            raw: RawBPlusSet::with_capacity(capacity),
        }
    }

    /// Returns the number of keys the currently reserved node slots can hold
    /// in full leaves. Rebalancing also spends slots on internal nodes, so
    /// this is an estimate, not a promise of allocation-free inserts.
    ///
    /// This is an extension and is not part of the standard `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_set::BPlusSet;
    ///
    /// let set = BPlusSet::<i32>::with_capacity(32);
    /// assert!(set.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
