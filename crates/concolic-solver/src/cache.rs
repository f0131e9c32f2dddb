//! The process-local set of already-tried chunk solutions (§4.6, §9).
//!
//! `solve_as_chunk` consults this before spending an execution on a
//! candidate it has already tried at this branch point's chunk
//! size/endian combination. Cleared at the start of every driver
//! invocation, never across invocations.

use std::collections::HashSet;

use concolic_core::Endian;
use num_bigint::BigInt;

#[derive(Debug, Clone, Default)]
pub struct ChunkSolutionCache {
    tried: HashSet<(Endian, usize, BigInt)>,
}

impl ChunkSolutionCache {
    pub fn new() -> ChunkSolutionCache {
        ChunkSolutionCache::default()
    }

    pub fn clear(&mut self) {
        self.tried.clear();
    }

    /// Records `value` as tried for this `(endian, chunk_size)`. Returns
    /// `true` the first time a given triple is seen, `false` on repeats —
    /// callers should skip re-executing a value this returns `false` for.
    pub fn mark(&mut self, endian: Endian, chunk_size: usize, value: &BigInt) -> bool {
        self.tried.insert((endian, chunk_size, value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_each_value_once() {
        let mut cache = ChunkSolutionCache::new();
        assert!(cache.mark(Endian::Big, 4, &BigInt::from(10)));
        assert!(!cache.mark(Endian::Big, 4, &BigInt::from(10)));
        // Different endian/size is a distinct entry.
        assert!(cache.mark(Endian::Little, 4, &BigInt::from(10)));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut cache = ChunkSolutionCache::new();
        cache.mark(Endian::Big, 1, &BigInt::from(5));
        cache.clear();
        assert!(cache.mark(Endian::Big, 1, &BigInt::from(5)));
    }
}
