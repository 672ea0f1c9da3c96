use alloc::alloc::handle_alloc_error;
use alloc::vec;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;

/// Number of buckets allocated when a table is created without a usable
/// capacity.
pub const DEFAULT_CAPACITY: usize = 4;

/// Default ratio of occupied buckets to bucket count at which the next
/// insertion doubles the bucket array.
pub const DEFAULT_LOAD_FACTOR_THRESHOLD: f64 = 0.75;

/// Maps a hash onto a bucket of a table with `capacity` buckets.
///
/// The hash is unsigned, so every hash (including the one whose signed
/// reading is the minimum integer) lands in `0..capacity`.
#[inline(always)]
fn bucket_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

#[inline]
fn reserve_error<T>(len: usize) -> TryReserveError {
    match Layout::array::<T>(len) {
        Ok(layout) => TryReserveError::AllocError { layout },
        Err(_) => TryReserveError::CapacityOverflow,
    }
}

/// The error type for [`HashTable::try_insert`] and
/// [`ChainedHashTable::try_insert`].
///
/// [`ChainedHashTable::try_insert`]: crate::ChainedHashTable::try_insert
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TryReserveError {
    /// Growing the table would need more memory than can be addressed.
    CapacityOverflow,
    /// The allocator returned an error.
    AllocError {
        /// The layout of the allocation request that failed.
        layout: Layout,
    },
}

impl Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryReserveError::CapacityOverflow => {
                f.write_str("capacity overflow while growing the hash table")
            }
            TryReserveError::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes failed while growing the hash table",
                layout.size()
            ),
        }
    }
}

impl core::error::Error for TryReserveError {}

/// One entry of a bucket chain.
///
/// Nodes live in a single arena and link to their successor by index. The
/// hash is cached so that growing the table never has to call back into the
/// hasher.
#[derive(Clone)]
struct Node<V> {
    value: V,
    hash: u64,
    next: Option<usize>,
}

/// Debug statistics for hash table analysis.
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of values stored in the table
    pub populated: usize,
    /// Number of buckets holding at least one value
    pub usage: usize,
    /// Length of the bucket array
    pub capacity: usize,
    /// Load factor (usage / capacity)
    pub load_factor: f64,
    /// Number of buckets with no chain
    pub empty_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Mean chain length over occupied buckets
    pub average_chain_length: f64,
    /// Total memory in bytes reserved by the bucket array and node arena
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Bucket Usage: {}/{} ({:.2}% load factor)",
            self.usage,
            self.capacity,
            self.load_factor * 100.0
        );
        println!("Population: {} values", self.populated);
        println!("Empty Buckets: {}", self.empty_buckets);
        println!(
            "Chains: longest {}, average {:.2}",
            self.longest_chain, self.average_chain_length
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// A hash table using separate chaining.
///
/// `HashTable<V>` keeps an array of buckets, each the head of a singly linked
/// chain of values whose hash maps to that bucket. New values are always
/// prepended to their chain. The caller provides the hash of every value and,
/// for lookups, an equality predicate, so the same table can back sets, maps
/// or anything else that can hash and compare its values.
///
/// The table never deduplicates: inserting an equal value twice stores two
/// entries.
///
/// ## Growth
///
/// Before each insertion the load factor, the ratio of occupied buckets to
/// bucket count, is recomputed. Once it reaches the table's threshold
/// ([`DEFAULT_LOAD_FACTOR_THRESHOLD`] unless configured) the bucket array is
/// doubled and every value is relinked into its new bucket. The table never
/// shrinks.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use chain_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_str(s: &str) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     s.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// table.insert(hash_str("alice"), "alice".to_string());
/// table.insert(hash_str("bob"), "bob".to_string());
///
/// assert!(table.contains(hash_str("alice"), |s| s == "alice"));
/// assert!(!table.contains(hash_str("carol"), |s| s == "carol"));
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    buckets: Vec<Option<usize>>,
    nodes: Vec<Node<V>>,

    usage: usize,
    populated: usize,
    load_factor: f64,
    threshold: f64,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("usage", &self.usage)
            .field("populated", &self.populated)
            .field("capacity", &self.buckets.len())
            .field("load_factor", &self.load_factor)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Renders the table bucket by bucket.
///
/// ```text
/// Underlying array usage / length: 2/4
/// Total number of nodes: 3
/// [  0 ]: null
/// [  1 ]: 9 --> 5 -->
/// [  2 ]: 2 -->
/// [  3 ]: null
/// ```
///
/// Each chain is printed head first, every value followed by ` --> `. There
/// is no trailing newline.
impl<V: Display> Display for HashTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Underlying array usage / length: {}/{}",
            self.usage,
            self.buckets.len()
        )?;
        write!(f, "\nTotal number of nodes: {}", self.populated)?;

        for (index, head) in self.buckets.iter().enumerate() {
            write!(f, "\n[ {index:>2} ]: ")?;
            if head.is_none() {
                f.write_str("null")?;
                continue;
            }
            for value in self.chain(index) {
                write!(f, "{value} --> ")?;
            }
        }

        Ok(())
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::new();
    /// assert_eq!(table.capacity(), chain_hash::hash_table::DEFAULT_CAPACITY);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with exactly `capacity` buckets.
    ///
    /// A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::with_capacity(10);
    /// assert_eq!(table.capacity(), 10);
    ///
    /// let table: HashTable<u32> = HashTable::with_capacity(0);
    /// assert_eq!(table.capacity(), 4);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_threshold(capacity, DEFAULT_LOAD_FACTOR_THRESHOLD)
    }

    /// Creates an empty table with `capacity` buckets that doubles once its
    /// load factor reaches `threshold`.
    ///
    /// A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not in `(0.0, 1.0]`.
    pub fn with_capacity_and_threshold(capacity: usize, threshold: f64) -> Self {
        assert!(
            threshold > 0.0 && threshold <= 1.0,
            "load factor threshold must be in (0, 1], got {threshold}"
        );

        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };

        Self {
            buckets: vec![None; capacity],
            nodes: Vec::new(),
            usage: 0,
            populated: 0,
            load_factor: 0.0,
            threshold,
        }
    }

    /// Returns the number of values stored in the table, duplicates
    /// included.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of buckets holding at least one value.
    pub fn usage(&self) -> usize {
        self.usage
    }

    /// Returns the length of the bucket array.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the load factor as of the last insertion.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the load factor at which the next insertion grows the table.
    pub fn load_factor_threshold(&self) -> f64 {
        self.threshold
    }

    /// Inserts `value` at the head of the chain selected by `hash`.
    ///
    /// If the load factor has reached the threshold, the bucket array is
    /// doubled before the value is placed. Equal values are not detected;
    /// each call adds a new entry.
    ///
    /// # Panics
    ///
    /// Panics if growing the table overflows `usize`, and aborts through
    /// [`handle_alloc_error`] if the allocator fails. Use
    /// [`try_insert`](Self::try_insert) to handle these cases.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(4);
    /// for hash in 0..3u64 {
    ///     table.insert(hash, hash);
    /// }
    /// assert_eq!(table.capacity(), 4);
    ///
    /// // Three of four buckets are in use, so this insertion grows first.
    /// table.insert(3, 3);
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn insert(&mut self, hash: u64, value: V) {
        if let Err(err) = self.try_insert(hash, value) {
            match err {
                TryReserveError::CapacityOverflow => panic!("capacity overflow"),
                TryReserveError::AllocError { layout } => handle_alloc_error(layout),
            }
        }
    }

    /// Fallible version of [`insert`](Self::insert).
    ///
    /// On error the value is dropped and the table's contents and counters
    /// are unchanged.
    pub fn try_insert(&mut self, hash: u64, value: V) -> Result<(), TryReserveError> {
        let len = self
            .nodes
            .len()
            .checked_add(1)
            .ok_or(TryReserveError::CapacityOverflow)?;
        self.nodes
            .try_reserve(1)
            .map_err(|_| reserve_error::<Node<V>>(len))?;

        self.load_factor = self.compute_load_factor();
        if self.load_factor >= self.threshold {
            self.grow()?;
        }

        let node = self.nodes.len();
        self.nodes.push(Node {
            value,
            hash,
            next: None,
        });
        self.link(node);

        self.load_factor = self.compute_load_factor();
        Ok(())
    }

    /// Finds a value in the table by hash and equality predicate.
    ///
    /// Only the chain selected by `hash` is scanned, head first. Returns the
    /// first value for which `eq` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.insert(42, "answer");
    ///
    /// assert_eq!(table.find(42, |&s| s == "answer"), Some(&"answer"));
    /// assert_eq!(table.find(42, |&s| s == "question"), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        self.chain(bucket_index(hash, self.buckets.len()))
            .find(|value| eq(value))
    }

    /// Returns `true` if the chain selected by `hash` holds a value matching
    /// `eq`.
    pub fn contains(&self, hash: u64, eq: impl Fn(&V) -> bool) -> bool {
        self.find(hash, eq).is_some()
    }

    /// Returns detailed utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let mut empty_buckets = 0;
        let mut longest_chain = 0;

        for index in 0..self.buckets.len() {
            let length = self.chain(index).count();
            if length == 0 {
                empty_buckets += 1;
            }
            longest_chain = longest_chain.max(length);
        }

        DebugStats {
            populated: self.populated,
            usage: self.usage,
            capacity: self.buckets.len(),
            load_factor: self.load_factor,
            empty_buckets,
            longest_chain,
            average_chain_length: if self.usage == 0 {
                0.0
            } else {
                self.populated as f64 / self.usage as f64
            },
            total_bytes: self.buckets.capacity() * core::mem::size_of::<Option<usize>>()
                + self.nodes.capacity() * core::mem::size_of::<Node<V>>(),
        }
    }

    /// Computes how many buckets hold chains of each length.
    ///
    /// Index `n` of the result counts the buckets whose chain holds exactly
    /// `n` values, so index 0 counts empty buckets. The result is one longer
    /// than the longest chain.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_length_histogram(&self) -> Vec<usize> {
        let mut hist = vec![0usize; 1];

        for index in 0..self.buckets.len() {
            let length = self.chain(index).count();
            if length >= hist.len() {
                hist.resize(length + 1, 0);
            }
            hist[length] += 1;
        }

        hist
    }

    #[inline]
    fn compute_load_factor(&self) -> f64 {
        self.usage as f64 / self.buckets.len() as f64
    }

    #[inline]
    fn chain(&self, index: usize) -> Chain<'_, V> {
        Chain {
            nodes: &self.nodes,
            cursor: self.buckets[index],
        }
    }

    /// Prepends `node` to the chain its cached hash selects in the current
    /// bucket array.
    #[inline]
    fn link(&mut self, node: usize) {
        let index = bucket_index(self.nodes[node].hash, self.buckets.len());
        let head = self.buckets[index].replace(node);
        if head.is_none() {
            self.usage += 1;
        }
        self.nodes[node].next = head;
        self.populated += 1;
    }

    /// Doubles the bucket array and relinks every node into it.
    ///
    /// Old buckets are visited in index order and each chain head first, so a
    /// chain whose values land in the same new bucket comes out reversed.
    /// Relinking does not look at the load factor, so growth never recurses.
    fn grow(&mut self) -> Result<(), TryReserveError> {
        let capacity = self
            .buckets
            .len()
            .checked_mul(2)
            .ok_or(TryReserveError::CapacityOverflow)?;

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(capacity)
            .map_err(|_| reserve_error::<Option<usize>>(capacity))?;
        buckets.resize(capacity, None);

        let old = core::mem::replace(&mut self.buckets, buckets);
        self.usage = 0;
        self.populated = 0;

        for head in old {
            let mut cursor = head;
            while let Some(node) = cursor {
                cursor = self.nodes[node].next;
                self.link(node);
            }
        }

        debug_assert_eq!(self.populated, self.nodes.len());
        Ok(())
    }
}

/// Walks one bucket chain head first.
struct Chain<'a, V> {
    nodes: &'a [Node<V>],
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.cursor?];
        self.cursor = node.next;
        Some(&node.value)
    }
}
