//! The recursive branch-tree data model (§4.5).
//!
//! A [`BranchTree`] reconciles several concrete traces probed at one
//! cursor byte into a shape that mirrors how those traces actually
//! diverged: a straight run of agreed-upon conditions, a point where the
//! traces disagree on which instruction runs next (`Diverge`), or a point
//! where they agree on the instruction but split on which side of it they
//! land (`Forked`).

use concolic_core::{BranchPoint, Sign};
use concolic_infer::Condition;

/// Which way a branch's distance-to-zero leaned when it was hit.
pub type DistanceSign = Sign;

/// An inferred condition paired with the instruction/visit it was
/// inferred at.
pub type BranchCondition = (Condition, BranchPoint);

/// A run of branch conditions agreed upon by every trace that passed
/// through them, together with the observed sign at each one.
///
/// `branches` is the authoritative list; `length` mirrors its count so
/// that [`crate::builder::size`] doesn't need to walk it just to count.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSeq {
    pub length: i64,
    pub branches: Vec<(BranchCondition, DistanceSign)>,
}

/// Construction and mutation helpers for [`BranchSeq`], mirroring the
/// `branch_seq` namespace the tree builder reconciles traces through.
pub mod branch_seq {
    use super::*;

    pub fn empty() -> BranchSeq {
        BranchSeq { length: 0, branches: Vec::new() }
    }

    /// Prepend `cond` to `seq` when inference succeeded; a failed
    /// inference (`None`) leaves `seq` untouched rather than recording a
    /// placeholder. Traces are walked front-to-back, so prepending here
    /// is what leaves the finished `BranchSeq` in reverse order.
    pub fn append(mut seq: BranchSeq, cond: Option<BranchCondition>, sign: DistanceSign) -> BranchSeq {
        if let Some(cond) = cond {
            seq.length += 1;
            seq.branches.insert(0, (cond, sign));
        }
        seq
    }

    pub(crate) fn reversed(seq: &BranchSeq) -> BranchSeq {
        BranchSeq { length: seq.length, branches: seq.branches.iter().rev().cloned().collect() }
    }
}

/// A straight run, or a point where the tree's traces parted ways.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchTree {
    /// No more disagreement among the traces that reached this point.
    Straight(BranchSeq),
    /// The traces hit different instructions next; one subtree per group
    /// of traces that agreed on which instruction.
    Diverge(BranchSeq, Vec<BranchTree>),
    /// The traces hit the *same* instruction next but split on its
    /// outcome; one subtree per distance-sign group.
    Forked(BranchSeq, BranchCondition, Vec<(DistanceSign, BranchTree)>),
}
