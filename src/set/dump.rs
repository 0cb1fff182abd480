use core::fmt;

use super::BPlusSet;

impl<K: fmt::Debug, const N: usize> BPlusSet<K, N> {
    /// Writes an indented rendering of the tree shape: one line per node,
    /// children indented below their parent, leaves and routing nodes
    /// labeled. Intended for debugging; the exact output format is not part
    /// of the crate's stability contract.
    ///
    /// This is an extension and is not part of the standard `BTreeSet` API.
    ///
    /// # Errors
    ///
    /// Forwards any error returned by the writer.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_set::BPlusSet;
    ///
    /// let set: BPlusSet<i32> = (1..=7).collect();
    ///
    /// let mut out = String::new();
    /// set.dump(&mut out).unwrap();
    /// assert!(out.starts_with("size: 7"));
    /// ```
    pub fn dump<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        self.raw.dump(out)
    }
}
