use tkhash::container::hash_function::{HashFunction, KeyHasher};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let hash_function = HashFunction::<u64>::new();
        let first = hash_function.get_hash(&12345u64);
        let second = hash_function.get_hash(&12345u64);
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_keys_usually_differ() {
        let hash_function = HashFunction::<u64>::new();
        let a = hash_function.get_hash(&1u64);
        let b = hash_function.get_hash(&2u64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_string_keys() {
        let hash_function = HashFunction::<String>::new();
        let hash = hash_function.get_hash(&"test_key".to_string());
        assert_ne!(hash, 0);
        assert_eq!(hash, hash_function.get_hash(&"test_key".to_string()));
    }

    #[test]
    fn test_signed_and_unsigned_arms() {
        let signed = HashFunction::<i32>::new();
        let unsigned = HashFunction::<u32>::new();
        assert_eq!(signed.get_hash(&7i32), signed.get_hash(&7i32));
        assert_eq!(unsigned.get_hash(&7u32), unsigned.get_hash(&7u32));
    }
}
