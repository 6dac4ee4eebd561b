//! Seeded splitting of byte streams into arbitrary writes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Splits payloads at pseudo-random boundaries.
///
/// The same seed always produces the same split, so a failing delivery
/// pattern can be replayed from its seed alone.
pub struct Fragmenter {
    rng: ChaCha8Rng,
    max_chunk: usize,
}

impl Fragmenter {
    /// Create a fragmenter whose chunks are 1 to `max_chunk` bytes long.
    pub fn new(seed: u64, max_chunk: usize) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), max_chunk: max_chunk.max(1) }
    }

    /// Split `payload` into consecutive non-empty chunks.
    pub fn split<'a>(&mut self, payload: &'a [u8]) -> Vec<&'a [u8]> {
        let mut chunks = Vec::new();
        let mut rest = payload;
        while !rest.is_empty() {
            let len = self.rng.gen_range(1..=self.max_chunk.min(rest.len()));
            let (chunk, tail) = rest.split_at(len);
            chunks.push(chunk);
            rest = tail;
        }
        chunks
    }
}
