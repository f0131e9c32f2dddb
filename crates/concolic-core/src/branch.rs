//! One executed compare, as emitted by the branch tracer.

use crate::bigint::interpret_operand;
use crate::typedef::{Direction, Signedness};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// The flavor of compare instruction a branch record was derived from.
/// `UnsignedSize` branches carry `Signedness::Unsigned`; the other two are
/// always signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareType {
    Equality,
    SignedSize,
    UnsignedSize,
}

impl CompareType {
    pub fn signedness(self) -> Signedness {
        match self {
            CompareType::UnsignedSize => Signedness::Unsigned,
            CompareType::Equality | CompareType::SignedSize => Signedness::Signed,
        }
    }
}

/// Disambiguates multiple visits to the same instruction within one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchPoint {
    pub addr: u64,
    pub visit_index: usize,
}

impl BranchPoint {
    /// The `(addr, visit_index)` pair the executor facade's `target`
    /// parameter expects.
    pub fn pair(self) -> (u64, usize) {
        (self.addr, self.visit_index)
    }
}

/// Neighbor-byte context threaded through inference and the solver so that
/// multi-byte chunk inference can reassemble candidate operand bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub neighbor_bytes: Vec<u8>,
    pub byte_dir: Direction,
}

/// One compare instruction's observed operands and distance from
/// satisfying its predicate, for one `try_value` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub inst_addr: u64,
    pub branch_type: CompareType,
    pub try_value: BigInt,
    pub operand_size: usize,
    pub operand1: u64,
    pub operand2: u64,
    pub distance: BigInt,
}

impl BranchInfo {
    /// `operand1` and `operand2` interpreted according to this record's
    /// signedness and width.
    pub fn operands_as_bigint(&self) -> (BigInt, BigInt) {
        let signed = self.branch_type.signedness() == Signedness::Signed;
        (
            interpret_operand(signed, self.operand_size, self.operand1),
            interpret_operand(signed, self.operand_size, self.operand2),
        )
    }
}

pub type BranchTrace = Vec<BranchInfo>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_size_is_unsigned() {
        assert_eq!(CompareType::UnsignedSize.signedness(), Signedness::Unsigned);
        assert_eq!(CompareType::Equality.signedness(), Signedness::Signed);
        assert_eq!(CompareType::SignedSize.signedness(), Signedness::Signed);
    }
}
