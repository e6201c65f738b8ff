mod bk_tree;
mod fingerprint_index;

pub use bk_tree::BkTree;
pub use fingerprint_index::{
    photo_index, video_index, FingerprintIndex, IndexMatch, IndexRecord, IndexedHash,
};
