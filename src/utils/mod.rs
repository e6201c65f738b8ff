pub mod bit_pack;
pub mod dct_ops;
