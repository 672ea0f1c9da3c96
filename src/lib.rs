#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A value-as-key container built on the chained `HashTable`.
///
/// This module provides `ChainedHashTable`, which hashes values with a
/// configurable hasher builder and allows duplicate insertions.
pub mod chained_hash_table;

/// The raw separate-chaining table, driven by caller-supplied hashes.
pub mod hash_table;

pub use chained_hash_table::ChainedHashTable;
pub use hash_table::HashTable;
pub use hash_table::TryReserveError;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Default hasher builder used by [`ChainedHashTable`].
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Default hasher builder used by [`ChainedHashTable`].
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder for the default hasher when neither the `foldhash` nor
        /// the `std` feature is enabled. It cannot be constructed, so a hasher
        /// builder has to be passed explicitly.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
