// Frame definitions (pre hashing)
pub const RESIZE_IMAGE_X: u32 = 32;
pub const RESIZE_IMAGE_Y: u32 = 32;

// Hash definitions
pub const HASH_IMAGE_X: usize = 8;
pub const HASH_IMAGE_Y: usize = 8;

// Edge-thumbnail definitions
pub const THUMB_IMAGE_X: u32 = 16;
pub const THUMB_IMAGE_Y: u32 = 16;

// Blur applied before the DCT. Sigma of the gaussian being approximated,
// and the number of box-blur passes used to approximate it.
pub const BLUR_SIGMA: f64 = 3.0;
pub const BLUR_PASSES: u32 = 3;

// Store definitions. A shard which reaches MAX_SHARD_SIZE stops accepting
// new fingerprints and the writer rolls over to a fresh one.
pub const MAX_SHARD_SIZE: u64 = 800 * 1024 * 1024;
pub const FLUSH_THRESHOLD: usize = 64;
