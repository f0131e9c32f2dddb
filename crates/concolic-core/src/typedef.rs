//! Small enums shared across the engine: cursor direction, input source,
//! process signal numbers, coverage classification, and endianness.

use std::fmt;
use std::path::PathBuf;

/// Which side of the seed's unfixed region the byte cursor treats as
/// "growing" for neighbor queries and solution encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Stay,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Stay => write!(f, "stay"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Where a seed's concrete bytes are delivered to the target: the process's
/// standard input, or a file at a fixed path substituted into the argument
/// template.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InputSource {
    StdInput,
    FileInput(PathBuf),
}

/// Exit signal reported by the tracer bridge for one execution. Numeric
/// values follow the POSIX signal numbers the original tracer surfaces;
/// `Normal` and `Error` are engine-internal sentinels layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(i32)]
pub enum Signal {
    Error = -1,
    Normal = 0,
    SigIll = 4,
    SigAbrt = 6,
    SigFpe = 8,
    SigSegv = 11,
    SigAlrm = 14,
}

impl Signal {
    /// Decode a raw signal number as reported by the tracer wire protocol.
    /// Unknown values collapse to `Error` rather than panicking.
    pub fn from_raw(raw: i32) -> Signal {
        match raw {
            0 => Signal::Normal,
            4 => Signal::SigIll,
            6 => Signal::SigAbrt,
            8 => Signal::SigFpe,
            11 => Signal::SigSegv,
            14 => Signal::SigAlrm,
            _ => Signal::Error,
        }
    }

    pub fn is_crash(self) -> bool {
        matches!(
            self,
            Signal::SigSegv | Signal::SigIll | Signal::SigFpe | Signal::SigAbrt
        )
    }

    pub fn is_timeout(self) -> bool {
        matches!(self, Signal::SigAlrm)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Error => "ERROR",
            Signal::Normal => "NORMAL",
            Signal::SigIll => "SIGILL",
            Signal::SigAbrt => "SIGABRT",
            Signal::SigFpe => "SIGFPE",
            Signal::SigSegv => "SIGSEGV",
            Signal::SigAlrm => "SIGALRM",
        };
        write!(f, "{s}")
    }
}

/// How a seed's coverage compared against the running edge bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CoverageGain {
    NoGain,
    NewPath,
    NewEdge,
}

/// Queue priority assigned to an accepted candidate seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    Favored,
    Normal,
}

impl Priority {
    /// A `NoGain` candidate carries no priority at all: it is dropped
    /// before it ever reaches the queue.
    pub fn of_coverage_gain(gain: CoverageGain) -> Option<Priority> {
        match gain {
            CoverageGain::NewEdge => Some(Priority::Favored),
            CoverageGain::NewPath => Some(Priority::Normal),
            CoverageGain::NoGain => None,
        }
    }
}

/// Target architecture selecting which sibling tracer binaries to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Arch {
    X86,
    X64,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
        }
    }
}

/// Sign of a comparison's operands, inherited from the branch's compare
/// kind (`UnsignedSize` is `Unsigned`, everything else is `Signed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Observed sign of a branch distance, or of the first-order difference
/// between two sample outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Sign {
    Positive,
    Negative,
    Zero,
}

impl Sign {
    pub fn of_bigint(v: &num_bigint::BigInt) -> Sign {
        use num_traits::Zero;
        if v.is_zero() {
            Sign::Zero
        } else if v < &num_bigint::BigInt::from(0) {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }
}

/// Byte order used to interpret a multi-byte operand or to encode a solved
/// value back into seed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Endian {
    Little,
    Big,
}

/// Which tracer variant a given bridge invocation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerKind {
    Coverage,
    Branch,
    BBCount,
}

impl TracerKind {
    pub fn binary_stem(self) -> &'static str {
        match self {
            TracerKind::Coverage => "qemu-trace-coverage",
            TracerKind::Branch => "qemu-trace-branch",
            TracerKind::BBCount => "qemu-trace-bbcount",
        }
    }
}
