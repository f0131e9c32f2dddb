//! Tagged per-byte values that make up a [`crate::seed::Seed`].

use crate::typedef::InputSource;
use serde::{Deserialize, Serialize};

/// One input byte's state. `Fixed` bytes are immutable; `Interval` bytes
/// are concrete but constrained to a range by a solved inequality;
/// `Undecided`, `Untouched` and `Sampled` are all concrete and freely
/// reassignable, differing only in provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteVal {
    Fixed(u8),
    Interval(u8, u8),
    Undecided(u8),
    Untouched(u8),
    Sampled(u8),
}

impl ByteVal {
    /// A byte is unfixed iff it is not `Fixed` — i.e. the solver or the
    /// sampler is still free to overwrite it.
    pub fn is_fixed(self) -> bool {
        matches!(self, ByteVal::Fixed(_))
    }

    pub fn is_unfixed(self) -> bool {
        !self.is_fixed()
    }

    pub fn is_sampled(self) -> bool {
        matches!(self, ByteVal::Sampled(_))
    }

    /// The byte's current concrete value, regardless of tag.
    pub fn concrete(self) -> u8 {
        match self {
            ByteVal::Fixed(v)
            | ByteVal::Undecided(v)
            | ByteVal::Untouched(v)
            | ByteVal::Sampled(v) => v,
            ByteVal::Interval(lo, _) => lo,
        }
    }

    /// The `(min, max)` range a sampler may legally draw from for this
    /// byte. `Fixed` collapses to a single point; `Interval` is the solved
    /// range; the rest fall back to the input source's allowed byte range.
    pub fn min_max(self, source: &InputSource) -> (u8, u8) {
        match self {
            ByteVal::Fixed(v) => (v, v),
            ByteVal::Interval(lo, hi) => (lo, hi),
            ByteVal::Undecided(_) | ByteVal::Untouched(_) | ByteVal::Sampled(_) => {
                match source {
                    // Both sources disallow byte 0 when the consumer pipes
                    // through a NUL-terminated buffer; StdInput additionally
                    // allows it since pipes have no such terminator concern.
                    InputSource::StdInput => (0, 255),
                    InputSource::FileInput(_) => (1, 255),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_min_max_is_a_point() {
        assert_eq!(ByteVal::Fixed(0x42).min_max(&InputSource::StdInput), (0x42, 0x42));
    }

    #[test]
    fn undecided_std_input_allows_zero() {
        assert_eq!(ByteVal::Undecided(3).min_max(&InputSource::StdInput), (0, 255));
    }

    #[test]
    fn undecided_file_input_excludes_zero() {
        let src = InputSource::FileInput("seed".into());
        assert_eq!(ByteVal::Undecided(3).min_max(&src), (1, 255));
    }

    #[test]
    fn interval_is_unfixed() {
        assert!(ByteVal::Interval(10, 20).is_unfixed());
        assert!(!ByteVal::Fixed(5).is_unfixed());
    }
}
