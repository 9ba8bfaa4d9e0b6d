/// The lookup contract an in-memory hash table offers its owning manager.
pub trait HashTable<K, V> {
    /// Returns the value associated with `key`, if any.
    fn find(&self, key: &K) -> Option<V>;

    /// Inserts `value` under `key`, overwriting any previous value.
    fn insert(&self, key: K, value: V);

    /// Removes the entry for `key`, reporting whether one existed.
    fn remove(&self, key: &K) -> bool;
}
