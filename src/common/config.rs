pub const DEFAULT_BUCKET_SIZE: usize = 50; // size of an extendible hash bucket

/// Maximum number of low-order hash bits the directory will ever use for
/// addressing. A bucket that would need a deeper split falls back to
/// overflow chaining instead.
pub const DIRECTORY_MAX_DEPTH: u32 = 32;

pub type FrameId = u64; // frame id type
pub type PageId = u64; // page id type
