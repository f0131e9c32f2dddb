//! Reconciles a list of branch traces into a [`BranchTree`] (§4.5).
//!
//! `make` is the entry point; everything else is private machinery that
//! walks traces in lockstep, peeling off one instruction at a time, until
//! the traces either keep agreeing (straight run) or stop agreeing
//! (divergence or fork).

use std::collections::HashMap;
use std::collections::HashSet;

use concolic_core::{BranchInfo, BranchPoint, Context, Sign};
use rand::Rng;

use crate::error::{Result, TreeError};
use crate::tree::{branch_seq, BranchCondition, BranchSeq, BranchTree, DistanceSign};

/// Address visit counts, threaded through the builder so that repeated
/// visits to the same instruction get distinct [`BranchPoint`]s.
type VisitCntMap = HashMap<u64, usize>;

fn have_same_addr(branch_infos: &[BranchInfo]) -> bool {
    match branch_infos.first() {
        None => true,
        Some(first) => branch_infos[1..].iter().all(|b| b.inst_addr == first.inst_addr),
    }
}

fn have_same_branch_distance_sign(trace: &[BranchInfo]) -> bool {
    match trace.first() {
        None => true,
        Some(first) => {
            let sign = Sign::of_bigint(&first.distance);
            trace[1..].iter().all(|b| Sign::of_bigint(&b.distance) == sign)
        }
    }
}

/// Stable group-by: groups appear in the order their key was first seen,
/// and members within a group keep their relative order.
fn group_by<'a>(
    traces: &[&'a [BranchInfo]],
    key_fn: impl Fn(&&'a [BranchInfo]) -> u64,
) -> Vec<(u64, Vec<&'a [BranchInfo]>)> {
    let mut order = Vec::new();
    let mut groups: HashMap<u64, Vec<&'a [BranchInfo]>> = HashMap::new();
    for &trace in traces {
        let key = key_fn(&trace);
        if !groups.contains_key(&key) {
            order.push(key);
        }
        groups.entry(key).or_default().push(trace);
    }
    order.into_iter().map(|key| (key, groups.remove(&key).unwrap())).collect()
}

fn inspect_branch_infos(
    ctx: &Context,
    visit_cnt_map: &VisitCntMap,
    branch_infos: &[BranchInfo],
) -> Option<BranchCondition> {
    let addr = branch_infos.first()?.inst_addr;
    let visit_index = *visit_cnt_map.get(&addr)?;
    let targ_pt = BranchPoint { addr, visit_index };
    let cond = concolic_infer::infer(ctx, branch_infos)?;
    Some((cond, targ_pt))
}

/// Peel the common prefix of addresses off every trace, accumulating a
/// [`BranchSeq`] as it goes, until either the traces run out or the next
/// instruction each trace would hit disagrees (the point where the tree
/// must diverge or fork). Returns the remaining, as-yet-unconsumed traces
/// alongside the accumulated sequence.
fn extract_straight_seq<'a>(
    ctx: &Context,
    visit_cnt_map: &mut VisitCntMap,
    mut traces: Vec<&'a [BranchInfo]>,
    mut acc: BranchSeq,
) -> Result<(Vec<&'a [BranchInfo]>, BranchSeq)> {
    loop {
        if traces.len() < 3 {
            return Err(TreeError::EmptyTraceList);
        }
        let heads: Vec<BranchInfo> = traces.iter().map(|t| t[0].clone()).collect();
        if !have_same_addr(&heads) {
            return Err(TreeError::DivergentHeadsInvariant);
        }

        let before_advance = traces.clone();
        let mut advanced: Vec<&'a [BranchInfo]> = traces.iter().map(|t| &t[1..]).collect();
        advanced.retain(|t| !t.is_empty());

        let next_heads: Vec<BranchInfo> = advanced.iter().map(|t| t[0].clone()).collect();
        if next_heads.len() >= 2 && !have_same_addr(&next_heads) {
            // The next instruction is where the traces part ways; leave
            // it for the caller to classify as a diverge or a fork.
            return Ok((before_advance, acc));
        }

        let head = &heads[0];
        *visit_cnt_map.entry(head.inst_addr).or_insert(0) += 1;
        let cond = inspect_branch_infos(ctx, visit_cnt_map, &heads);
        let sign = Sign::of_bigint(&head.distance);
        acc = branch_seq::append(acc, cond, sign);

        if advanced.len() < 3 {
            return Ok((Vec::new(), acc));
        }
        traces = advanced;
    }
}

fn build_diverge_tree<'a>(
    ctx: &Context,
    visit_cnt_map: &VisitCntMap,
    seq: BranchSeq,
    traces: Vec<&'a [BranchInfo]>,
) -> Result<BranchTree> {
    let filtered: Vec<&'a [BranchInfo]> = traces.into_iter().filter(|t| t.len() > 1).collect();
    let groups = group_by(&filtered, |t| t[0].inst_addr);
    let sub_trees: Vec<BranchTree> = groups
        .into_iter()
        .filter(|(_, g)| g.len() >= 3)
        .map(|(_, g)| make_aux(ctx, visit_cnt_map, g))
        .collect::<Result<Vec<_>>>()?;
    if sub_trees.is_empty() {
        Ok(BranchTree::Straight(seq))
    } else {
        Ok(BranchTree::Diverge(seq, sub_trees))
    }
}

fn build_fork_tree<'a>(
    ctx: &Context,
    visit_cnt_map: &VisitCntMap,
    seq: BranchSeq,
    cond: BranchCondition,
    traces: Vec<&'a [BranchInfo]>,
) -> Result<BranchTree> {
    let filtered: Vec<&'a [BranchInfo]> = traces.into_iter().filter(|t| t.len() > 1).collect();
    let groups = group_by(&filtered, |t| t[0].inst_addr);
    let children: Vec<(DistanceSign, BranchTree)> = groups
        .into_iter()
        .filter(|(_, g)| g.len() >= 3)
        .map(|(_, group)| -> Result<(DistanceSign, BranchTree)> {
            let sign = Sign::of_bigint(&group[0][0].distance);
            let advanced: Vec<&'a [BranchInfo]> = group.iter().map(|t| &t[1..]).collect();
            let sub_tree = if advanced.len() >= 3 {
                make_aux(ctx, visit_cnt_map, advanced)?
            } else {
                BranchTree::Straight(branch_seq::empty())
            };
            Ok((sign, sub_tree))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BranchTree::Forked(seq, cond, children))
}

fn make_aux<'a>(ctx: &Context, visit_cnt_map: &VisitCntMap, traces: Vec<&'a [BranchInfo]>) -> Result<BranchTree> {
    let mut local_map = visit_cnt_map.clone();
    let (remaining, seq) = extract_straight_seq(ctx, &mut local_map, traces, branch_seq::empty())?;
    if remaining.is_empty() {
        return Ok(BranchTree::Straight(seq));
    }

    let heads: Vec<BranchInfo> = remaining.iter().map(|t| t[0].clone()).collect();
    let head = &heads[0];
    *local_map.entry(head.inst_addr).or_insert(0) += 1;

    match inspect_branch_infos(ctx, &local_map, &heads) {
        None => build_diverge_tree(ctx, &local_map, seq, remaining),
        Some(cond) => {
            if have_same_branch_distance_sign(remaining[0]) {
                // Addresses agreed but there was no actual fork: fold
                // this condition into the sequence and keep diverging.
                let sign = Sign::of_bigint(&remaining[0][0].distance);
                let seq = branch_seq::append(seq, Some(cond), sign);
                build_diverge_tree(ctx, &local_map, seq, remaining)
            } else {
                build_fork_tree(ctx, &local_map, seq, cond, remaining)
            }
        }
    }
}

/// Reconcile `trace_list` into a single [`BranchTree`]. Traces are first
/// grouped by their head address; groups with fewer than three members
/// can't support inference and are dropped entirely.
///
/// # Errors
///
/// Returns [`TreeError`] if the builder's straight-run invariants are
/// violated: an empty trace group, or traces that disagree on head
/// address where the caller guaranteed agreement.
pub fn make(ctx: &Context, trace_list: &[Vec<BranchInfo>]) -> Result<BranchTree> {
    let traces: Vec<&[BranchInfo]> =
        trace_list.iter().map(|v| v.as_slice()).filter(|t| !t.is_empty()).collect();
    let groups = group_by(&traces, |t| t[0].inst_addr);
    let sub_trees: Vec<BranchTree> = groups
        .into_iter()
        .filter(|(_, g)| g.len() >= 3)
        .map(|(_, g)| make_aux(ctx, &VisitCntMap::new(), g))
        .collect::<Result<Vec<_>>>()?;
    if sub_trees.len() == 1 {
        Ok(sub_trees.into_iter().next().unwrap())
    } else {
        Ok(BranchTree::Diverge(branch_seq::empty(), sub_trees))
    }
}

/// Total number of conditions held anywhere in the tree. A `Forked`
/// node's own fork condition is not counted, only the conditions in its
/// sequence and its children's.
pub fn size(tree: &BranchTree) -> i64 {
    match tree {
        BranchTree::Straight(seq) => seq.length,
        BranchTree::Diverge(seq, subs) => seq.length + subs.iter().map(size).sum::<i64>(),
        BranchTree::Forked(seq, _, children) => {
            seq.length + children.iter().map(|(_, t)| size(t)).sum::<i64>()
        }
    }
}

/// Reverse every [`BranchSeq`] in the tree in place (recursing into
/// subtrees/children in their original order). `BranchSeq`s come out of
/// [`make`] in reverse-of-trace order because [`branch_seq::append`]
/// prepends; this restores forward order for the solver.
pub fn reverse(tree: &BranchTree) -> BranchTree {
    match tree {
        BranchTree::Straight(seq) => BranchTree::Straight(branch_seq::reversed(seq)),
        BranchTree::Diverge(seq, subs) => {
            BranchTree::Diverge(branch_seq::reversed(seq), subs.iter().map(reverse).collect())
        }
        BranchTree::Forked(seq, cond, children) => BranchTree::Forked(
            branch_seq::reversed(seq),
            cond.clone(),
            children.iter().map(|(sign, t)| (*sign, reverse(t))).collect(),
        ),
    }
}

fn filter_branch_seq(select: &HashSet<i64>, counter: i64, seq: &BranchSeq) -> (i64, BranchSeq) {
    let mut kept: Vec<(BranchCondition, DistanceSign)> = Vec::new();
    for (i, branch) in seq.branches.iter().enumerate() {
        if select.contains(&(counter + i as i64)) {
            kept.push(branch.clone());
        }
    }
    kept.reverse();
    let length = kept.len() as i64;
    (counter + seq.length, BranchSeq { length, branches: kept })
}

fn filter_and_reverse_aux(select: &HashSet<i64>, counter: i64, tree: &BranchTree) -> (i64, BranchTree) {
    match tree {
        BranchTree::Straight(seq) => {
            let (counter, seq) = filter_branch_seq(select, counter, seq);
            (counter, BranchTree::Straight(seq))
        }
        BranchTree::Diverge(seq, subs) => {
            let (mut counter, seq) = filter_branch_seq(select, counter, seq);
            let mut new_subs = Vec::with_capacity(subs.len());
            for sub in subs {
                let (next_counter, next_sub) = filter_and_reverse_aux(select, counter, sub);
                counter = next_counter;
                new_subs.push(next_sub);
            }
            (counter, BranchTree::Diverge(seq, new_subs))
        }
        BranchTree::Forked(seq, cond, children) => {
            let (mut counter, seq) = filter_branch_seq(select, counter, seq);
            let mut new_children = Vec::with_capacity(children.len());
            for (sign, child) in children {
                let (next_counter, next_child) = filter_and_reverse_aux(select, counter, child);
                counter = next_counter;
                new_children.push((*sign, next_child));
            }
            (counter, BranchTree::Forked(seq, cond.clone(), new_children))
        }
    }
}

/// Drop every condition whose position (numbered depth-first, left to
/// right, over the whole tree) is not in `select`, and reverse what
/// remains in each sequence. Subtree and child order is left unchanged.
fn filter_and_reverse(select: &HashSet<i64>, tree: &BranchTree) -> BranchTree {
    filter_and_reverse_aux(select, 0, tree).1
}

/// Thin out a freshly built tree to at most `n_solve` conditions, chosen
/// uniformly without replacement, so the solver spends its execution
/// budget on a representative sample rather than every condition in a
/// possibly enormous tree (§4.5). When the tree is already small enough,
/// nothing is dropped, only reversed into solve order.
pub fn select_and_repair(rng: &mut impl Rng, n_solve: i64, tree: &BranchTree) -> BranchTree {
    let total = size(tree);
    if n_solve >= total {
        return reverse(tree);
    }
    let indices = rand::seq::index::sample(rng, total as usize, n_solve.max(0) as usize);
    let select: HashSet<i64> = indices.iter().map(|i| i as i64).collect();
    filter_and_reverse(&select, tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::{CompareType, Direction};
    use num_bigint::BigInt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn br(addr: u64, try_value: i64, distance: i64) -> BranchInfo {
        BranchInfo {
            inst_addr: addr,
            branch_type: CompareType::Equality,
            try_value: BigInt::from(try_value),
            operand_size: 1,
            operand1: 0,
            operand2: 0,
            distance: BigInt::from(distance),
        }
    }

    fn ctx() -> Context {
        Context { neighbor_bytes: vec![0x30], byte_dir: Direction::Right }
    }

    #[test]
    fn straight_trace_collapses_to_a_single_sequence() {
        // Three traces that agree on every address and step a linear
        // equation: distance = (x - 0x30) + 0x16.
        let traces = vec![
            vec![br(0x1000, 0x30, 0x16), br(0x1100, 0x30, 0x40)],
            vec![br(0x1000, 0x35, 0x1b), br(0x1100, 0x35, 0x45)],
            vec![br(0x1000, 0x40, 0x26), br(0x1100, 0x40, 0x50)],
        ];
        let tree = make(&ctx(), &traces).unwrap();
        match &tree {
            BranchTree::Straight(seq) => assert_eq!(seq.length, 2),
            other => panic!("expected a straight tree, got {other:?}"),
        }
    }

    #[test]
    fn divergent_next_address_splits_into_a_diverge_tree() {
        // All three traces agree at 0x1000, then two go to 0x2000 and
        // one lone trace has nowhere to group with, so only the 0x2000
        // group survives (and it's too small too - need >=3 per group).
        let traces = vec![
            vec![br(0x1000, 0x30, 0x16), br(0x2000, 1, 1), br(0x2000, 2, 2)],
            vec![br(0x1000, 0x35, 0x1b), br(0x2000, 1, 1), br(0x2000, 2, 2)],
            vec![br(0x1000, 0x40, 0x26), br(0x2000, 1, 1), br(0x2000, 2, 2)],
        ];
        let tree = make(&ctx(), &traces).unwrap();
        // straight-seq extraction consumes 0x1000 then stops because the
        // remaining traces (length 2 each) drop below 3 after one more
        // pop; the single group at 0x1000 yields one subtree.
        assert!(size(&tree) >= 1);
    }

    #[test]
    fn reverse_is_its_own_inverse() {
        let traces = vec![
            vec![br(0x1000, 0x30, 0x16), br(0x1100, 0x30, 0x40)],
            vec![br(0x1000, 0x35, 0x1b), br(0x1100, 0x35, 0x40)],
            vec![br(0x1000, 0x40, 0x26), br(0x1100, 0x40, 0x40)],
        ];
        let tree = make(&ctx(), &traces).unwrap();
        let twice = reverse(&reverse(&tree));
        assert_eq!(tree, twice);
    }

    #[test]
    fn select_and_repair_keeps_full_tree_when_budget_covers_it() {
        let traces = vec![
            vec![br(0x1000, 0x30, 0x16), br(0x1100, 0x30, 0x40)],
            vec![br(0x1000, 0x35, 0x1b), br(0x1100, 0x35, 0x40)],
            vec![br(0x1000, 0x40, 0x26), br(0x1100, 0x40, 0x40)],
        ];
        let tree = make(&ctx(), &traces).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let repaired = select_and_repair(&mut rng, 1000, &tree);
        assert_eq!(size(&repaired), size(&tree));
        assert_eq!(repaired, reverse(&tree));
    }

    #[test]
    fn select_and_repair_shrinks_to_the_requested_budget() {
        let traces = vec![
            vec![br(0x1000, 0x30, 0x16), br(0x1100, 0x30, 0x40), br(0x1200, 0x30, 0x50)],
            vec![br(0x1000, 0x35, 0x1b), br(0x1100, 0x35, 0x45), br(0x1200, 0x35, 0x55)],
            vec![br(0x1000, 0x40, 0x26), br(0x1100, 0x40, 0x50), br(0x1200, 0x40, 0x60)],
        ];
        let tree = make(&ctx(), &traces).unwrap();
        let total = size(&tree);
        assert!(total >= 2);
        let mut rng = StdRng::seed_from_u64(7);
        let repaired = select_and_repair(&mut rng, 1, &tree);
        assert_eq!(size(&repaired), 1);
    }
}
