use std::any::Any;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use xxhash_rust::xxh3;

/// A source of hash values for table keys.
///
/// The owning buffer manager can supply its own implementation; the table
/// only requires that the same key always hashes to the same value within
/// one process.
pub trait KeyHasher<K> {
    /// Returns the hash value of the given key.
    fn get_hash(&self, key: &K) -> u64;
}

/// The default xxh3-backed hash function for a given key type.
#[derive(Debug)]
pub struct HashFunction<K> {
    _marker: PhantomData<K>,
}

impl<K> HashFunction<K> {
    /// Creates a new `HashFunction`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K> Default for HashFunction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyHasher<K> for HashFunction<K>
where
    K: Any + Hash + 'static,
{
    fn get_hash(&self, key: &K) -> u64 {
        let mut hasher = xxh3::Xxh3::new();

        match key as &dyn Any {
            key if key.is::<i32>() => hasher.write_i32(*key.downcast_ref::<i32>().unwrap()),
            key if key.is::<u32>() => hasher.write_u32(*key.downcast_ref::<u32>().unwrap()),
            key if key.is::<i64>() => hasher.write_i64(*key.downcast_ref::<i64>().unwrap()),
            key if key.is::<u64>() => hasher.write_u64(*key.downcast_ref::<u64>().unwrap()),
            key if key.is::<String>() => {
                hasher.write(key.downcast_ref::<String>().unwrap().as_bytes())
            }
            _ => {
                // Fallback for types that implement `Hash`
                key.hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
