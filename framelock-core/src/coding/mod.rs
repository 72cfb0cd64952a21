//! Channel coding: Hamming(7,4) FEC, block interleaving, scrambling, CRC32

pub mod hamming;
pub mod interleave;
pub mod scramble;

pub use hamming::{decode as fec_decode, encode as fec_encode};
pub use interleave::BlockInterleaver;
pub use scramble::scramble;

/// CRC32 over a byte slice.
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Validate a byte slice against a CRC32 key.
pub fn validate(data: &[u8], key: u32) -> bool {
    checksum(data) == key
}
