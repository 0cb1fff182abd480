//! An ordered set backed by a B+ tree.
//!
//! This crate provides [`BPlusSet`], an ordered set in the spirit of the
//! standard library's `BTreeSet`, implemented as a B+ tree: internal nodes
//! hold routing separators only, all keys live in the leaves, and the leaves
//! are doubly linked so that in-order iteration is a walk along a chain
//! rather than a tree descent.
//!
//! # Example
//!
//! ```
//! use bplus_set::BPlusSet;
//!
//! let mut primes = BPlusSet::<u32>::new();
//! primes.insert(5);
//! primes.insert(2);
//! primes.insert(3);
//! primes.insert(7);
//!
//! assert!(primes.contains(&3));
//! assert!(!primes.contains(&4));
//!
//! // Keys come back in ascending order.
//! let sorted: Vec<_> = primes.iter().copied().collect();
//! assert_eq!(sorted, [2, 3, 5, 7]);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - only requires `alloc`, no standard library
//!   dependency
//! - **Tunable branching** - the minimum node fan-out is a const generic
//!   `N` (default 3); every non-root node holds between `N` and `2 * N` keys
//! - **Chained leaves** - forward iteration follows sibling links between
//!   leaves, never revisiting the upper tree
//! - **No unsafe code** - nodes live in a handle-addressed arena, so sibling
//!   links are plain indices and the crate forbids `unsafe` outright
//!
//! # Implementation
//!
//! All nodes are stored in a slot arena and addressed by niche-optimized
//! handles. Mutations run the classic recursive B+ tree protocol: an insert
//! that overflows a node reports the overflow to its parent, which splits the
//! child (copying the right half's first key up as a separator for leaves,
//! pushing the median up for internal nodes); an erase that underflows a node
//! has the parent first try to borrow a key from a sibling and otherwise fuse
//! two siblings, pulling the separator between them back down. The root
//! grows by one level when it splits and collapses into its only child when
//! it empties.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod set;

pub use set::BPlusSet;
