use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;

use log::{debug, info};
use parking_lot::RwLock;

use crate::common::config::DIRECTORY_MAX_DEPTH;
use crate::common::exception::HashTableError;
use crate::container::hash_function::{HashFunction, KeyHasher};
use crate::container::hash_table::HashTable;

/// Chain state of a bucket.
///
/// A bucket whose entries cannot be separated by another hash bit grows an
/// overflow segment at the same local depth instead of splitting again, so
/// the chained case is a first-class state rather than a dangling pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BucketChain {
    /// The bucket is the last (or only) segment of its chain.
    Terminal,
    /// The bucket continues in the arena slot `next`.
    Overflow { next: usize },
}

/// A bounded container of entries sharing the same low-order hash bits.
#[derive(Debug)]
struct Bucket<K, V> {
    /// Directory index at/through which the bucket was created. A diagnostic
    /// label only; addressing is always recomputed from the key hash.
    id: usize,
    /// Number of low-order hash bits that determine membership.
    local_depth: u32,
    entries: HashMap<K, V>,
    chain: BucketChain,
}

impl<K, V> Bucket<K, V> {
    fn new(id: usize, local_depth: u32) -> Self {
        Self {
            id,
            local_depth,
            entries: HashMap::new(),
            chain: BucketChain::Terminal,
        }
    }
}

/// The directory and bucket arena behind one exclusive latch.
///
/// Directory slots hold arena indices; several slots may reference the same
/// bucket. Buckets are never destroyed, so arena indices stay stable.
#[derive(Debug)]
struct TableState<K, V, H> {
    /// Number of low-order hash bits used to select a directory slot.
    global_depth: u32,
    /// Indirection table of length `1 << global_depth`.
    directory: Vec<usize>,
    /// All buckets ever created, primary and overflow segments alike.
    buckets: Vec<Bucket<K, V>>,
    bucket_capacity: usize,
    hash_fn: H,
}

impl<K, V, H> TableState<K, V, H>
where
    K: Hash + Eq,
    H: KeyHasher<K>,
{
    fn new(bucket_capacity: usize, hash_fn: H) -> Self {
        Self {
            global_depth: 0,
            directory: vec![0],
            buckets: vec![Bucket::new(0, 0)],
            bucket_capacity,
            hash_fn,
        }
    }

    /// Masks a hash down to the low `global_depth` bits.
    fn dir_index(&self, hash: u64) -> usize {
        (hash & ((1u64 << self.global_depth) - 1)) as usize
    }

    /// Walks the chain starting at arena index `head` and returns the index
    /// of the segment holding `key`, if any.
    fn chain_position(&self, head: usize, key: &K) -> Option<usize> {
        let mut idx = head;
        loop {
            if self.buckets[idx].entries.contains_key(key) {
                return Some(idx);
            }
            match self.buckets[idx].chain {
                BucketChain::Overflow { next } => idx = next,
                BucketChain::Terminal => return None,
            }
        }
    }

    fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash_fn.get_hash(key);
        let head = self.directory[self.dir_index(hash)];
        self.chain_position(head, key)
            .and_then(|segment| self.buckets[segment].entries.get(key))
            .cloned()
    }

    fn insert(&mut self, key: K, value: V) {
        let hash = self.hash_fn.get_hash(&key);
        let head = self.directory[self.dir_index(hash)];

        // An existing key is overwritten in place, never a split trigger.
        if let Some(segment) = self.chain_position(head, &key) {
            self.buckets[segment].entries.insert(key, value);
            return;
        }

        if matches!(self.buckets[head].chain, BucketChain::Overflow { .. }) {
            self.insert_into_chain(head, key, value);
            return;
        }

        self.buckets[head].entries.insert(key, value);
        if self.buckets[head].entries.len() > self.bucket_capacity {
            self.resolve_overflow(hash);
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        let hash = self.hash_fn.get_hash(key);
        let head = self.directory[self.dir_index(hash)];
        match self.chain_position(head, key) {
            Some(segment) => self.buckets[segment].entries.remove(key).is_some(),
            None => false,
        }
    }

    /// Places an entry into an already-chained bucket: the first segment
    /// with room takes it, and a full chain grows by one segment. Chained
    /// buckets do not split further.
    fn insert_into_chain(&mut self, head: usize, key: K, value: V) {
        let mut idx = head;
        let target = loop {
            if self.buckets[idx].entries.len() < self.bucket_capacity {
                break idx;
            }
            match self.buckets[idx].chain {
                BucketChain::Overflow { next } => idx = next,
                BucketChain::Terminal => break self.new_overflow_segment(idx),
            }
        };
        self.buckets[target].entries.insert(key, value);
    }

    /// Splits the over-full bucket addressed by `hash` until the bucket
    /// holding the freshly inserted entry is back within capacity. Splits
    /// cascade while the entries keep landing on the same side; a bucket
    /// whose entries agree on every remaining addressing bit is chained
    /// instead, which bounds the recursion.
    fn resolve_overflow(&mut self, hash: u64) {
        loop {
            let bucket_idx = self.directory[self.dir_index(hash)];
            if self.buckets[bucket_idx].entries.len() <= self.bucket_capacity {
                return;
            }
            if matches!(self.buckets[bucket_idx].chain, BucketChain::Overflow { .. }) {
                return;
            }
            if !self.split_once(bucket_idx) {
                return;
            }
        }
    }

    /// Performs one split step on the bucket at arena index `bucket_idx`.
    ///
    /// Entries are redistributed by the bit at position `local_depth` of
    /// their hash: bit 0 stays, bit 1 moves to a new sibling, and both sides
    /// end up one level deeper. Doubles the directory first when the new
    /// depth exceeds the global depth.
    ///
    /// Returns `false` when no sibling could be populated and the bucket was
    /// chained instead.
    fn split_once(&mut self, bucket_idx: usize) -> bool {
        let old_depth = self.buckets[bucket_idx].local_depth;
        debug_assert!(old_depth <= self.global_depth);

        if old_depth >= DIRECTORY_MAX_DEPTH {
            self.attach_overflow(bucket_idx);
            return false;
        }
        let new_depth = old_depth + 1;

        let drained: Vec<(K, V)> = self.buckets[bucket_idx].entries.drain().collect();
        let mut stayers = HashMap::with_capacity(drained.len());
        let mut movers = HashMap::with_capacity(drained.len());
        for (key, value) in drained {
            if (self.hash_fn.get_hash(&key) >> old_depth) & 1 == 1 {
                movers.insert(key, value);
            } else {
                stayers.insert(key, value);
            }
        }

        if movers.is_empty() {
            // Every entry agrees on the next addressing bit; the sibling
            // would be empty and splitting again would not terminate.
            self.buckets[bucket_idx].entries = stayers;
            self.attach_overflow(bucket_idx);
            return false;
        }

        if new_depth > self.global_depth {
            self.grow_directory();
        }

        let sibling_id =
            (self.buckets[bucket_idx].id & ((1usize << old_depth) - 1)) | (1usize << old_depth);
        let sibling_idx = self.buckets.len();
        let mut sibling = Bucket::new(sibling_id, new_depth);
        sibling.entries = movers;
        self.buckets.push(sibling);

        self.buckets[bucket_idx].entries = stayers;
        self.buckets[bucket_idx].local_depth = new_depth;

        // Repoint the half of the sharing slots that carry the sibling's bit.
        for slot in 0..self.directory.len() {
            if self.directory[slot] == bucket_idx && (slot >> old_depth) & 1 == 1 {
                self.directory[slot] = sibling_idx;
            }
        }

        debug!(
            "split bucket {} at depth {} into sibling {} (depth {})",
            self.buckets[bucket_idx].id, old_depth, sibling_id, new_depth
        );
        true
    }

    /// Doubles the directory: every new slot `i` starts out referencing the
    /// bucket currently at `i % old_len`, so the aliasing structure is
    /// preserved and only the subsequent repointing changes addressing.
    fn grow_directory(&mut self) {
        let old_len = self.directory.len();
        let mut slots = Vec::with_capacity(old_len * 2);
        for slot in 0..old_len * 2 {
            slots.push(self.directory[slot % old_len]);
        }
        self.directory = slots;
        self.global_depth += 1;
        debug_assert_eq!(self.directory.len(), 1usize << self.global_depth);
        debug!(
            "directory doubled to {} slots (global depth {})",
            self.directory.len(),
            self.global_depth
        );
    }

    /// Attaches a fresh overflow segment at the same local depth and spills
    /// the excess entries of the head segment into it.
    fn attach_overflow(&mut self, bucket_idx: usize) {
        let segment = self.new_overflow_segment(bucket_idx);
        let excess = self.buckets[bucket_idx]
            .entries
            .len()
            .saturating_sub(self.bucket_capacity);
        if excess > 0 {
            let mut retained: Vec<(K, V)> = self.buckets[bucket_idx].entries.drain().collect();
            let spilled = retained.split_off(retained.len() - excess);
            self.buckets[bucket_idx].entries = retained.into_iter().collect();
            self.buckets[segment].entries = spilled.into_iter().collect();
        }
        debug!(
            "chained overflow segment onto bucket {} at depth {}",
            self.buckets[bucket_idx].id, self.buckets[bucket_idx].local_depth
        );
    }

    fn new_overflow_segment(&mut self, tail: usize) -> usize {
        debug_assert!(matches!(self.buckets[tail].chain, BucketChain::Terminal));
        let segment = self.buckets.len();
        let (id, depth) = (self.buckets[tail].id, self.buckets[tail].local_depth);
        self.buckets.push(Bucket::new(id, depth));
        self.buckets[tail].chain = BucketChain::Overflow { next: segment };
        segment
    }

    /// Asserts the structural invariants. Violation means corruption, so
    /// this panics rather than returning an error.
    fn verify_integrity(&self) {
        assert_eq!(
            self.directory.len(),
            1usize << self.global_depth,
            "directory length must equal 2^global_depth"
        );

        // Overflow segments are reachable only through their chain, never
        // through the directory.
        let mut is_segment = vec![false; self.buckets.len()];
        for bucket in &self.buckets {
            if let BucketChain::Overflow { next } = bucket.chain {
                is_segment[next] = true;
            }
        }

        let mut ref_counts = vec![0usize; self.buckets.len()];
        let mut first_slot = vec![usize::MAX; self.buckets.len()];
        for (slot, &bucket_idx) in self.directory.iter().enumerate() {
            assert!(
                bucket_idx < self.buckets.len(),
                "directory slot {} references bucket {} outside the arena",
                slot,
                bucket_idx
            );
            let depth = self.buckets[bucket_idx].local_depth;
            assert!(
                depth <= self.global_depth,
                "bucket {} has local depth {} above global depth {}",
                bucket_idx,
                depth,
                self.global_depth
            );
            let mask = (1usize << depth) - 1;
            if first_slot[bucket_idx] == usize::MAX {
                first_slot[bucket_idx] = slot;
            }
            assert_eq!(
                slot & mask,
                first_slot[bucket_idx] & mask,
                "slots sharing bucket {} disagree on the low local-depth bits",
                bucket_idx
            );
            ref_counts[bucket_idx] += 1;
        }

        for (bucket_idx, bucket) in self.buckets.iter().enumerate() {
            assert!(
                bucket.entries.len() <= self.bucket_capacity,
                "bucket {} holds {} entries over capacity {}",
                bucket_idx,
                bucket.entries.len(),
                self.bucket_capacity
            );
            if is_segment[bucket_idx] {
                assert_eq!(
                    ref_counts[bucket_idx], 0,
                    "overflow segment {} is addressed by the directory",
                    bucket_idx
                );
            } else {
                assert_eq!(
                    ref_counts[bucket_idx],
                    1usize << (self.global_depth - bucket.local_depth),
                    "bucket {} is shared by the wrong number of slots",
                    bucket_idx
                );
            }
        }
    }
}

/// An in-memory extendible hash table.
///
/// The buffer manager uses this as its page table: it maps a `PageId` to the
/// frame currently holding that page, growing the directory on demand
/// instead of rehashing the whole table. The entire structure sits behind a
/// single reader-writer latch; lookups share it, mutations take it
/// exclusively for the duration of the call.
#[derive(Debug)]
pub struct ExtendibleHashTable<K, V, H = HashFunction<K>> {
    state: RwLock<TableState<K, V, H>>,
}

impl<K, V> ExtendibleHashTable<K, V, HashFunction<K>>
where
    K: Any + Hash + Eq + 'static,
    V: Clone,
{
    /// Creates a table with the default xxh3 hash function.
    ///
    /// # Arguments
    ///
    /// * `bucket_capacity` - Maximum number of entries per bucket; must be
    ///   positive.
    ///
    /// # Returns
    ///
    /// The new table, or `HashTableError::InvalidBucketCapacity`.
    pub fn new(bucket_capacity: usize) -> Result<Self, HashTableError> {
        Self::with_hasher(bucket_capacity, HashFunction::new())
    }
}

impl<K, V, H> ExtendibleHashTable<K, V, H>
where
    K: Hash + Eq,
    V: Clone,
    H: KeyHasher<K>,
{
    /// Creates a table addressed through a caller-supplied hash function.
    pub fn with_hasher(bucket_capacity: usize, hash_fn: H) -> Result<Self, HashTableError> {
        if bucket_capacity == 0 {
            return Err(HashTableError::InvalidBucketCapacity(bucket_capacity));
        }
        info!(
            "Initializing extendible hash table with bucket capacity {}",
            bucket_capacity
        );
        Ok(Self {
            state: RwLock::new(TableState::new(bucket_capacity, hash_fn)),
        })
    }

    /// Returns the value associated with `key`, if any. Read-only.
    pub fn find(&self, key: &K) -> Option<V> {
        self.state.read().find(key)
    }

    /// Inserts `value` under `key` with upsert semantics. May split the
    /// target bucket and double the directory as a follow-up.
    pub fn insert(&self, key: K, value: V) {
        self.state.write().insert(key, value);
    }

    /// Removes the entry for `key`.
    ///
    /// # Returns
    ///
    /// `true` if an entry was erased. Buckets and directory are never
    /// shrunk on removal.
    pub fn remove(&self, key: &K) -> bool {
        self.state.write().remove(key)
    }

    /// Number of low-order hash bits currently used for addressing.
    pub fn global_depth(&self) -> u32 {
        self.state.read().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `bucket_id`,
    /// or `None` when the slot does not exist.
    pub fn local_depth(&self, bucket_id: usize) -> Option<u32> {
        let state = self.state.read();
        state
            .directory
            .get(bucket_id)
            .map(|&bucket_idx| state.buckets[bucket_idx].local_depth)
    }

    /// Total number of bucket records created, overflow segments included.
    pub fn num_buckets(&self) -> usize {
        self.state.read().buckets.len()
    }

    /// Panics if any structural invariant is violated. Intended for tests
    /// and debugging.
    pub fn verify_integrity(&self) {
        self.state.read().verify_integrity();
    }
}

impl<K, V, H> HashTable<K, V> for ExtendibleHashTable<K, V, H>
where
    K: Hash + Eq,
    V: Clone,
    H: KeyHasher<K>,
{
    fn find(&self, key: &K) -> Option<V> {
        ExtendibleHashTable::find(self, key)
    }

    fn insert(&self, key: K, value: V) {
        ExtendibleHashTable::insert(self, key, value);
    }

    fn remove(&self, key: &K) -> bool {
        ExtendibleHashTable::remove(self, key)
    }
}
