#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `media_fingerprint_lib` builds compact perceptual fingerprints of video frames
//! and photos, and stores, indexes and searches them. A fingerprint survives
//! re-encoding, rescaling and mild quality loss, so two files holding the same
//! content will fingerprint to nearby values even when their bytes differ
//! completely.
//!
//! The crate has three layers:
//! * Hashing: each frame is resized to 32x32, converted to grayscale, blurred
//!   with a three-pass box approximation of a Gaussian, and run through a 2D
//!   DCT. The signs of the low-frequency coefficients against their median form
//!   a 64 bit hash. A bit-packed 16x16 edge thumbnail (Sobel magnitudes,
//!   binarized at the median) is kept alongside as a cheap second opinion.
//! * Storage: [`FingerPrintStore`] funnels fingerprints from any number of
//!   producer threads through a single writer into size-bounded shard files,
//!   tracked by a durable metatable. [`coalesce`] merges undersized shards back
//!   together between runs.
//! * Search: [`FingerprintIndex`] loads a store into a BK-tree keyed on Hamming
//!   distance, answering radius and nearest-neighbour queries without scanning
//!   every record.
//!
//! # Example
//! ```rust
//! use media_fingerprint_lib::BkTree;
//!
//! // 64 bit perceptual hashes form a metric space under Hamming distance.
//! let mut tree: BkTree<u64> = BkTree::new();
//! tree.add(0b1011_0000u64);
//! tree.add(0b1011_0001u64);
//! tree.add(0b0100_1111u64);
//!
//! // everything within 1 bit flip of the query
//! let close = tree.query(&0b1011_0000u64, 1);
//! assert_eq!(close.len(), 2);
//!
//! let (best, dist) = tree.find_closest(&0b1011_0011u64).unwrap();
//! assert_eq!(*best, 0b1011_0001u64);
//! assert_eq!(dist, 1);
//! ```
//!
//! # Feeding the store
//! Frames reach the hasher through the [`FrameSource`] trait, so any decoder
//! that can hand over RGB24 or BGR24 buffers will do. [`index_video`] drives a
//! source through a pool of hash workers under a byte budget and submits the
//! finished [`VideoFingerprint`] to a store; [`hash_photo`] and [`hash_photos`]
//! cover still images.
//!
//! # Limitations
//! Fingerprints are not robust against rotation, mirroring, heavy cropping or
//! content embedded inside other content. They are designed to catch
//! re-encodes and rescales, not adversarial edits.

mod definitions;
mod hashing;
mod index;
mod pipeline;
mod raster;
mod store;
mod utils;

pub use hashing::{
    photo::{hash_photo, hash_photos},
    FrameFingerprint, HashCreationErrorKind, PerceptualHasher, PhotoFingerprint, VideoFingerprint,
};

pub use raster::{LockedFrame, PixelBuffer, Rgb, TransformErrorKind};

pub use utils::bit_pack::BitCompressor;

pub use hashing::distance::{byte_hamming_distance, ByteHamming, Metric};

pub use index::{
    photo_index, video_index, BkTree, FingerprintIndex, IndexMatch, IndexRecord, IndexedHash,
};

pub use store::{
    coalesce, CoalesceStats, FingerPrintStore, MetaTable, MetaTableEntry, StoreCfg, StoreErrorKind,
    StoreRecord, StoreResult, Submitter,
};

pub use pipeline::{
    index_video, CancellationToken, FrameSource, FrameSourceErrorKind, IndexingErrorKind,
    MemoryGate, PipelineCfg,
};

pub use definitions::{HASH_IMAGE_X, HASH_IMAGE_Y, MAX_SHARD_SIZE, RESIZE_IMAGE_X, RESIZE_IMAGE_Y};
