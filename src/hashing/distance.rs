/// A discrete metric over `Self`, as required by the
/// [BK-tree][crate::index::BkTree].
///
/// Implementations must satisfy `d(a, a) == 0` and `d(a, b) >= 0` (the
/// latter by construction of the return type). Symmetry is not required by
/// the tree, which only ever evaluates distances from the stored element's
/// side, but the Hamming metrics implemented here are symmetric.
///
/// The trait is taken by value of `&Self` so the tree stays monomorphized:
/// no virtual dispatch on the hashing hot path.
pub trait Metric {
    fn distance(&self, other: &Self) -> u32;
}

/// Hamming distance over 64-bit perceptual hashes: xor then popcount.
impl Metric for u64 {
    fn distance(&self, other: &Self) -> u32 {
        (self ^ other).count_ones()
    }
}

/// Hamming distance over arbitrary-length byte strings. The shorter operand
/// is treated as zero-padded to the length of the longer.
pub fn byte_hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    let (longer, shorter) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    longer
        .iter()
        .zip(shorter.iter().chain(std::iter::repeat(&0u8)))
        .fold(0, |acc, (x, y)| acc + (x ^ y).count_ones())
}

/// Newtype giving byte strings the [Metric] capability, used for indexing
/// edge thumbnails and other variable-length fingerprint data.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ByteHamming(pub Vec<u8>);

impl Metric for ByteHamming {
    fn distance(&self, other: &Self) -> u32 {
        byte_hamming_distance(&self.0, &other.0)
    }
}
