use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::hash_table::DEFAULT_CAPACITY;
use crate::hash_table::DEFAULT_LOAD_FACTOR_THRESHOLD;
use crate::hash_table::HashTable;
use crate::hash_table::TryReserveError;

/// A separate-chaining container of values that act as their own keys.
///
/// `ChainedHashTable<T, S>` hashes each value with its `Hash` impl through
/// the hasher builder `S` and stores it in a [`HashTable`]. Values are
/// compared with `Eq` for membership. Equal values are not merged: inserting
/// the same value twice stores it twice.
///
/// The bucket array starts at [`DEFAULT_CAPACITY`] buckets (or the requested
/// count) and doubles whenever an insertion finds the share of occupied
/// buckets at or above the load factor threshold.
#[derive(Clone)]
pub struct ChainedHashTable<T, S = DefaultHashBuilder> {
    table: HashTable<T>,
    hash_builder: S,
}

impl<T, S> Debug for ChainedHashTable<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHashTable")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Dumps every bucket and its chain; see [`HashTable`]'s `Display` impl for
/// the layout.
impl<T: Display, S> Display for ChainedHashTable<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.table, f)
    }
}

impl<T, S> ChainedHashTable<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty table with [`DEFAULT_CAPACITY`] buckets and the given
    /// hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::ChainedHashTable;
    ///
    /// let table: ChainedHashTable<i32, _> = ChainedHashTable::with_hasher(RandomState::new());
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 4);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty table with `capacity` buckets and the given hasher
    /// builder. A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_capacity_threshold_and_hasher(
            capacity,
            DEFAULT_LOAD_FACTOR_THRESHOLD,
            hash_builder,
        )
    }

    /// Creates an empty table with `capacity` buckets that grows once its
    /// load factor reaches `threshold`.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not in `(0.0, 1.0]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::ChainedHashTable;
    ///
    /// let table: ChainedHashTable<&str, _> =
    ///     ChainedHashTable::with_capacity_threshold_and_hasher(16, 0.5, RandomState::new());
    /// assert_eq!(table.capacity(), 16);
    /// assert_eq!(table.load_factor_threshold(), 0.5);
    /// ```
    pub fn with_capacity_threshold_and_hasher(
        capacity: usize,
        threshold: f64,
        hash_builder: S,
    ) -> Self {
        Self {
            table: HashTable::with_capacity_and_threshold(capacity, threshold),
            hash_builder,
        }
    }

    /// Returns the number of values stored, duplicates included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainedHashTable;
    ///
    /// let mut table: ChainedHashTable<&str> = ChainedHashTable::new();
    /// table.insert("a");
    /// table.insert("a");
    /// assert_eq!(table.len(), 2);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets holding at least one value.
    pub fn usage(&self) -> usize {
        self.table.usage()
    }

    /// Returns the length of the bucket array.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the ratio of occupied buckets to bucket count as of the last
    /// insertion.
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Returns the load factor at which the next insertion grows the table.
    pub fn load_factor_threshold(&self) -> f64 {
        self.table.load_factor_threshold()
    }

    /// Returns a reference to the table's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Adds a value to the table.
    ///
    /// The value goes to the head of its bucket's chain. If the load factor
    /// has reached the threshold the bucket array is doubled first.
    ///
    /// # Panics
    ///
    /// Panics or aborts if the table cannot grow; see
    /// [`HashTable::insert`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainedHashTable;
    ///
    /// let mut table: ChainedHashTable<i32> = ChainedHashTable::new();
    /// table.insert(37);
    /// assert!(table.contains(&37));
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) {
        let hash = self.hash_builder.hash_one(&value);
        self.table.insert(hash, value);
    }

    /// Fallible version of [`insert`](Self::insert). On error the value is
    /// dropped and the table is unchanged.
    pub fn try_insert(&mut self, value: T) -> Result<(), TryReserveError> {
        let hash = self.hash_builder.hash_one(&value);
        self.table.try_insert(hash, value)
    }

    /// Returns `true` if a value equal to `value` has been inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainedHashTable;
    ///
    /// let mut table: ChainedHashTable<i32> = ChainedHashTable::new();
    /// table.insert(1);
    /// assert!(table.contains(&1));
    /// assert!(!table.contains(&2));
    /// # }
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        let hash = self.hash_builder.hash_one(value);
        self.table.contains(hash, |v| v == value)
    }

    /// Returns the stored value equal to `value`, if any. With duplicates,
    /// the most recently inserted one is returned.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// Returns detailed utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Computes how many buckets hold chains of each length; see
    /// [`HashTable::chain_length_histogram`].
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_length_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.chain_length_histogram()
    }
}

impl<T, S> ChainedHashTable<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty table with [`DEFAULT_CAPACITY`] buckets using the
    /// default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainedHashTable;
    ///
    /// let table: ChainedHashTable<i32> = ChainedHashTable::new();
    /// assert!(table.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty table with `capacity` buckets using the default
    /// hasher builder. A capacity of zero falls back to
    /// [`DEFAULT_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::ChainedHashTable;
    ///
    /// let table: ChainedHashTable<i32> = ChainedHashTable::with_capacity(0);
    /// assert_eq!(table.capacity(), 4);
    /// # }
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S> Default for ChainedHashTable<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> FromIterator<T> for ChainedHashTable<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<T, S> Extend<T> for ChainedHashTable<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            Self {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Uses an integer's value as its hash so bucket placement is
    /// predictable.
    #[derive(Clone, Default)]
    struct IdentityBuilder;

    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                self.0 = self.0.rotate_left(8) ^ u64::from(byte);
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    impl BuildHasher for IdentityBuilder {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher::default()
        }
    }

    /// A key/value pair that hashes and compares on its key only.
    #[derive(Debug, Clone)]
    struct Pair {
        key: u64,
        value: String,
    }

    impl PartialEq for Pair {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    impl Eq for Pair {}

    impl core::hash::Hash for Pair {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.key.hash(state);
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let table: ChainedHashTable<i32, SipHashBuilder> = ChainedHashTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);

        let table2 = ChainedHashTable::<i32, _>::with_hasher(SipHashBuilder::default());
        assert!(table2.is_empty());
        assert_eq!(table2.usage(), 0);
        assert_eq!(table2.load_factor(), 0.0);
    }

    #[test]
    fn test_with_capacity() {
        let table: ChainedHashTable<i32, SipHashBuilder> = ChainedHashTable::with_capacity(100);
        assert_eq!(table.capacity(), 100);

        let table: ChainedHashTable<i32, SipHashBuilder> = ChainedHashTable::with_capacity(0);
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);

        let table =
            ChainedHashTable::<i32, _>::with_capacity_and_hasher(0, SipHashBuilder::default());
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());

        table.insert(1);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
        assert!(table.contains(&1));

        table.insert(2);
        assert_eq!(table.len(), 2);
        assert!(table.contains(&1));
        assert!(table.contains(&2));
        assert!(!table.contains(&3));
    }

    #[test]
    fn test_duplicates_are_counted() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());
        table.insert("dup");
        table.insert("dup");

        assert_eq!(table.len(), 2);
        assert_eq!(table.usage(), 1);
        assert!(table.contains(&"dup"));
    }

    #[test]
    fn test_growth_scenario() {
        let mut table = ChainedHashTable::with_capacity_and_hasher(4, IdentityBuilder);
        table.insert(0u64);
        table.insert(1u64);
        table.insert(2u64);

        assert_eq!(table.capacity(), 4);
        assert_eq!(table.usage(), 3);
        assert_eq!(table.load_factor(), 0.75);

        table.insert(3u64);
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.len(), 4);
        for value in 0..4u64 {
            assert!(table.contains(&value));
        }

        assert_eq!(
            table.to_string(),
            "Underlying array usage / length: 4/8\n\
             Total number of nodes: 4\n\
             [  0 ]: 0 --> \n\
             [  1 ]: 1 --> \n\
             [  2 ]: 2 --> \n\
             [  3 ]: 3 --> \n\
             [  4 ]: null\n\
             [  5 ]: null\n\
             [  6 ]: null\n\
             [  7 ]: null"
        );
    }

    #[test]
    fn test_capacity_doubles_exactly() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());
        let mut previous = table.capacity();

        for i in 0..500u32 {
            let grows = table.load_factor() >= table.load_factor_threshold();
            table.insert(i);
            if grows {
                assert_eq!(table.capacity(), previous * 2);
            } else {
                assert_eq!(table.capacity(), previous);
            }
            previous = table.capacity();
        }
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());
        table.extend(0..10);

        let counters = (table.len(), table.usage(), table.capacity());
        for _ in 0..3 {
            for i in 0..10 {
                assert!(table.contains(&i));
            }
            assert!(!table.contains(&10));
        }
        assert_eq!(counters, (table.len(), table.usage(), table.capacity()));
    }

    #[test]
    fn test_collision_handling() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            table.insert(i);
        }

        assert_eq!(table.len(), 1000);
        assert!(table.usage() <= table.capacity());

        for i in 0..1000 {
            assert!(table.contains(&i));
        }

        for i in 1000..1100 {
            assert!(!table.contains(&i));
        }
    }

    #[test]
    fn test_string_values() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());

        table.insert("hello".to_string());
        table.insert("world".to_string());

        assert!(table.contains(&"hello".to_string()));
        assert!(table.contains(&"world".to_string()));
        assert!(!table.contains(&"foo".to_string()));
    }

    #[test]
    fn test_custom_threshold() {
        let mut table =
            ChainedHashTable::with_capacity_threshold_and_hasher(4, 0.25, IdentityBuilder);
        table.insert(0u64);
        assert_eq!(table.capacity(), 4);

        table.insert(1u64);
        assert_eq!(table.capacity(), 8);
        assert!(table.contains(&0));
        assert!(table.contains(&1));
    }

    #[test]
    fn test_key_value_pairs() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());
        table.insert(Pair {
            key: 1,
            value: "first".to_string(),
        });
        table.insert(Pair {
            key: 1,
            value: "second".to_string(),
        });

        let probe = Pair {
            key: 1,
            value: String::new(),
        };
        assert!(table.contains(&probe));
        assert_eq!(table.get(&probe).map(|p| p.value.as_str()), Some("second"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_from_iter_and_extend() {
        let mut table: ChainedHashTable<i32, SipHashBuilder> = (0..5).collect();
        assert_eq!(table.len(), 5);

        table.extend(vec![5, 6, 7]);
        assert_eq!(table.len(), 8);
        for i in 0..8 {
            assert!(table.contains(&i));
        }
    }

    #[test]
    fn test_try_insert() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());
        for i in 0..32 {
            assert!(table.try_insert(i).is_ok());
        }
        assert_eq!(table.len(), 32);
    }

    #[test]
    fn test_stats() {
        let mut table = ChainedHashTable::with_capacity_and_hasher(8, IdentityBuilder);
        for value in [3u64, 11, 19, 4] {
            table.insert(value);
        }

        let stats = table.debug_stats();
        assert_eq!(stats.usage, 2);
        assert_eq!(stats.populated, 4);
        assert_eq!(stats.longest_chain, 3);

        let hist: Vec<usize> = table.chain_length_histogram();
        assert_eq!(hist, vec![6, 1, 0, 1]);
    }

    #[test]
    fn test_debug_format() {
        let mut table = ChainedHashTable::with_hasher(IdentityBuilder);
        table.insert(1u64);
        let debug = alloc::format!("{table:?}");
        assert!(debug.starts_with("ChainedHashTable"));
        assert!(debug.contains("populated: 1"));
    }

    #[test]
    fn test_clone() {
        let mut table = ChainedHashTable::with_hasher(SipHashBuilder::default());
        table.insert(1);
        let copy = table.clone();
        table.insert(2);

        assert!(copy.contains(&1));
        assert!(!copy.contains(&2));
        assert_eq!(copy.len(), 1);
    }
}
