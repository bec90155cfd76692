//! The mod-256 checksum shared by the base block and every extension block.

/// Checksum byte for a block body: chosen so that appending it makes the full
/// 128-byte block sum to 0 mod 256.
pub fn compute(body: &[u8]) -> u8 {
    body.iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

/// Whether a full block (checksum byte included) sums to 0 mod 256.
pub fn verify(block: &[u8]) -> bool {
    block.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0
}
