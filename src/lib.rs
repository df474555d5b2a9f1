#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;

pub mod hash_table;

/// A fixed-capacity hash set built on open addressing.
///
/// This module provides a `FixedHashSet` that wraps the `FixedHashTable` and
/// provides a set interface with configurable hashers.
pub mod hash_set;

/// A fixed-capacity ring buffer that overwrites its oldest element when full.
pub mod queue;

pub use error::CapacityError;
pub use hash_set::FixedHashSet;
pub use hash_table::FixedHashTable;
pub use queue::FixedQueue;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`FixedHashSet`] when none is given.
        ///
        /// With the `foldhash` feature this is foldhash's randomly seeded fast
        /// hasher.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`FixedHashSet`] when none is given.
        ///
        /// Without the `foldhash` feature this is the standard library's
        /// SipHash-based `RandomState`.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder hasher builder for builds without `std` or `foldhash`.
        ///
        /// It cannot be constructed, so sets must be created with
        /// [`FixedHashSet::with_hasher`].
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
