//! Order-sensitive label hashing.
//!
//! A label-value sequence hashes as `seed`, then for each value the value's
//! bytes followed by [`SEPARATOR_BYTE`]. The separator keeps `("ab", "c")` and
//! `("a", "bc")` apart. Collisions still happen and the instrument map resolves
//! them by comparing full value sequences.

/// Byte hashed after every label value. `0xff` never occurs in UTF-8 text.
pub const SEPARATOR_BYTE: u8 = 0xff;

const FNV_OFFSET_64: u64 = 14695981039346656037;
const FNV_PRIME_64: u64 = 1099511628211;

/// Pluggable hashing primitives used by the instrument map.
///
/// Substituting the strategy (for instance with a constant hash) lets tests
/// force collisions without touching the map logic.
pub trait LabelHasher: Send + Sync {
    fn seed(&self) -> u64;
    fn combine(&self, h: u64, s: &str) -> u64;
    fn add_byte(&self, h: u64, b: u8) -> u64;

    /// Hash a fully resolved label-value sequence.
    fn hash_values(&self, values: &[&str]) -> u64 {
        values.iter().fold(self.seed(), |h, v| {
            let h = self.combine(h, v);
            self.add_byte(h, SEPARATOR_BYTE)
        })
    }
}

/// 64-bit FNV-1a, the default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv64a;

impl LabelHasher for Fnv64a {
    fn seed(&self) -> u64 {
        FNV_OFFSET_64
    }

    fn combine(&self, h: u64, s: &str) -> u64 {
        s.bytes().fold(h, |h, b| self.add_byte(h, b))
    }

    fn add_byte(&self, h: u64, b: u8) -> u64 {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME_64)
    }
}
