/// Packs an array of binary pixel values into a bitset byte array (8:1), and
/// back. Used to compress edge thumbnails before they are stored in a shard.
pub struct BitCompressor;

impl BitCompressor {
    /// Pack one bit per input byte, LSB-first within each output byte.
    /// A value of 128 or above counts as a set bit, so both {0, 1} masks and
    /// {0, 255} quantized images compress correctly. The final partial byte,
    /// if any, is zero-padded.
    pub fn compress(values: &[u8]) -> Vec<u8> {
        let mut ret = vec![0u8; (values.len() + 7) / 8];

        for (i, value) in values.iter().enumerate() {
            if *value >= 128 || *value == 1 {
                ret[i / 8] |= 1 << (i % 8);
            }
        }

        ret
    }

    /// Expand a packed bitset back into `bit_len` bytes of {0, 255}.
    pub fn decompress(packed: &[u8], bit_len: usize) -> Vec<u8> {
        assert!(
            bit_len <= packed.len() * 8,
            "bit_len {bit_len} exceeds packed capacity {}",
            packed.len() * 8
        );

        (0..bit_len)
            .map(|i| {
                if packed[i / 8] & (1 << (i % 8)) != 0 {
                    u8::MAX
                } else {
                    0
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compress_is_8_to_1() {
        let bits = vec![255u8; 256];
        let packed = BitCompressor::compress(&bits);
        assert_eq!(packed.len(), 32);
        assert!(packed.iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_known_pattern() {
        //bit order is LSB-first
        let bits = [255, 0, 255, 0, 0, 0, 0, 255];
        let packed = BitCompressor::compress(&bits);
        assert_eq!(packed, vec![0b1000_0101]);
    }

    #[test]
    fn test_partial_byte_is_zero_padded() {
        let bits = [255, 255, 255];
        let packed = BitCompressor::compress(&bits);
        assert_eq!(packed, vec![0b0000_0111]);
    }

    #[test]
    fn test_roundtrip() {
        use rand::prelude::*;
        let mut rng = StdRng::seed_from_u64(3);

        let bits = (0..100)
            .map(|_| if rng.gen::<bool>() { 255u8 } else { 0 })
            .collect::<Vec<_>>();

        let packed = BitCompressor::compress(&bits);
        assert_eq!(packed.len(), 13);
        assert_eq!(BitCompressor::decompress(&packed, bits.len()), bits);
    }
}
