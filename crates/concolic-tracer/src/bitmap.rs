//! Running edge-coverage bitmap and the `NewEdge`/`NewPath`/`NoGain`
//! classification it produces (§4.1).
//!
//! The coverage tracer variant reports, per call, one hit count per edge
//! index it touched. Those counts are coarsened into a small number of
//! buckets (a classic AFL-style "hit count class" table) before being
//! compared against the running bitmap, so that e.g. an edge hit 40
//! times and one hit 41 times don't look like different paths.
use concolic_core::CoverageGain;

/// Hit-count bucket boundaries, smallest-to-largest. A raw count is
/// classified into the bucket of the smallest boundary it's `<=` to.
const BUCKETS: [u8; 8] = [1, 2, 3, 4, 8, 16, 32, 128];

fn classify(count: u8) -> u8 {
    if count == 0 {
        return 0;
    }
    BUCKETS.iter().copied().find(|&b| count <= b).unwrap_or(255)
}

/// The engine's process-wide record of which edges have ever fired and
/// at what bucketed hit count, used to classify every subsequent
/// execution's coverage gain.
#[derive(Debug, Clone, Default)]
pub struct CoverageBitmap {
    buckets: Vec<u8>,
}

impl CoverageBitmap {
    pub fn new() -> CoverageBitmap {
        CoverageBitmap { buckets: Vec::new() }
    }

    fn ensure_len(&mut self, len: usize) {
        if self.buckets.len() < len {
            self.buckets.resize(len, 0);
        }
    }

    /// Fold one execution's raw per-edge hit counts into the running
    /// bitmap and report how coverage changed: `NewEdge` if any
    /// previously-unseen edge fired, else `NewPath` if any edge's bucket
    /// changed, else `NoGain`.
    pub fn update(&mut self, raw_counts: &[u8]) -> CoverageGain {
        self.ensure_len(raw_counts.len());

        let mut new_edge = false;
        let mut new_path = false;
        for (i, &raw) in raw_counts.iter().enumerate() {
            let bucket = classify(raw);
            if bucket == 0 {
                continue;
            }
            let prev = self.buckets[i];
            if prev == 0 {
                new_edge = true;
                self.buckets[i] = bucket;
            } else if prev != bucket {
                new_path = true;
                self.buckets[i] = bucket;
            }
        }

        if new_edge {
            CoverageGain::NewEdge
        } else if new_path {
            CoverageGain::NewPath
        } else {
            CoverageGain::NoGain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_execution_of_any_edge_is_new_edge() {
        let mut bm = CoverageBitmap::new();
        assert_eq!(bm.update(&[1, 0, 0]), CoverageGain::NewEdge);
    }

    #[test]
    fn repeating_the_same_counts_is_no_gain() {
        let mut bm = CoverageBitmap::new();
        bm.update(&[1, 5, 0]);
        assert_eq!(bm.update(&[1, 5, 0]), CoverageGain::NoGain);
    }

    #[test]
    fn different_bucket_on_a_seen_edge_is_new_path() {
        let mut bm = CoverageBitmap::new();
        bm.update(&[1, 0, 0]);
        // bucket(1) = 1, bucket(40) = 128: same edge, different bucket.
        assert_eq!(bm.update(&[40, 0, 0]), CoverageGain::NewPath);
    }

    #[test]
    fn a_brand_new_edge_wins_over_a_changed_bucket() {
        let mut bm = CoverageBitmap::new();
        bm.update(&[1, 0]);
        assert_eq!(bm.update(&[40, 1]), CoverageGain::NewEdge);
    }
}
