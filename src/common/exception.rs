use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashTableError {
    #[error("bucket capacity must be positive, got {0}")]
    InvalidBucketCapacity(usize),
}
