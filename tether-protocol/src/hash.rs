//! Multiplicative string hash used for event routing
//!
//! Both sides of the link agree on `h = h * 101 + byte` with seed 0, so
//! result/action keywords route without string comparison. Collisions are
//! not guarded against; changing the function or the seed breaks wire
//! compatibility with deployed companion firmware.

use heapless::Vec;

/// Hash `text` with the default zero seed
pub const fn hash(text: &str) -> u32 {
    hash_seeded(text, 0)
}

/// Hash `text` starting from `seed`
pub const fn hash_seeded(text: &str, seed: u32) -> u32 {
    let bytes = text.as_bytes();
    let mut h = seed;
    let mut i = 0;
    while i < bytes.len() {
        h = h.wrapping_mul(101).wrapping_add(bytes[i] as u32);
        i += 1;
    }
    h
}

/// Hash a byte stream (already unescaped) starting from `seed`
pub fn hash_bytes(bytes: impl Iterator<Item = u8>, seed: u32) -> u32 {
    bytes.fold(seed, |h, b| h.wrapping_mul(101).wrapping_add(u32::from(b)))
}

/// Hash each `separator`-delimited segment of `text`, up to `K` segments
///
/// Peripheral decoders use this to match keyword lists (a recognition
/// constraint like `"yes|no|maybe"`) without holding copies of the parts.
pub fn hash_split<const K: usize>(text: &str, separator: char) -> Vec<u32, K> {
    let mut hashes = Vec::new();
    for segment in text.split(separator) {
        if hashes.push(hash(segment)).is_err() {
            break;
        }
    }
    hashes
}
