//! Priority seed queue (§4.8).
//!
//! Two FIFOs, `Favored` and `Normal`. `pop` always drains `Favored`
//! first: a candidate that discovered a brand-new edge is worth
//! revisiting before the backlog of merely-new-path seeds. `push`
//! derives the priority from the candidate's [`CoverageGain`] and drops
//! anything with no gain at all before it is ever queued.

use std::collections::VecDeque;

use concolic_core::{CoverageGain, Priority, Seed};

#[derive(Debug, Clone)]
pub struct QueueItem {
    pub seed: Seed,
    pub priority: Priority,
}

#[derive(Debug, Default)]
pub struct ConcolicQueue {
    favored: VecDeque<Seed>,
    normal: VecDeque<Seed>,
}

impl ConcolicQueue {
    pub fn new() -> ConcolicQueue {
        ConcolicQueue { favored: VecDeque::new(), normal: VecDeque::new() }
    }

    /// Queue `seed` under the priority implied by `gain`. Returns `false`
    /// without touching the queue if `gain` is [`CoverageGain::NoGain`].
    pub fn push(&mut self, seed: Seed, gain: CoverageGain) -> bool {
        match Priority::of_coverage_gain(gain) {
            Some(Priority::Favored) => {
                self.favored.push_back(seed);
                true
            }
            Some(Priority::Normal) => {
                self.normal.push_back(seed);
                true
            }
            None => false,
        }
    }

    /// Push directly under a known priority, bypassing gain classification.
    /// Used when re-queuing an initial corpus seed read from `--inputdir`.
    pub fn push_with_priority(&mut self, seed: Seed, priority: Priority) {
        match priority {
            Priority::Favored => self.favored.push_back(seed),
            Priority::Normal => self.normal.push_back(seed),
        }
    }

    /// Pop the next seed to drive, scanning `Favored` before `Normal`.
    pub fn pop(&mut self) -> Option<QueueItem> {
        if let Some(seed) = self.favored.pop_front() {
            return Some(QueueItem { seed, priority: Priority::Favored });
        }
        self.normal.pop_front().map(|seed| QueueItem { seed, priority: Priority::Normal })
    }

    pub fn is_empty(&self) -> bool {
        self.favored.is_empty() && self.normal.is_empty()
    }

    pub fn len(&self) -> usize {
        self.favored.len() + self.normal.len()
    }

    pub fn favored_len(&self) -> usize {
        self.favored.len()
    }

    pub fn normal_len(&self) -> usize {
        self.normal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concolic_core::InputSource;

    fn seed(tag: u8) -> Seed {
        Seed::from_bytes(InputSource::StdInput, &[tag])
    }

    #[test]
    fn no_gain_candidates_are_dropped() {
        let mut queue = ConcolicQueue::new();
        assert!(!queue.push(seed(0), CoverageGain::NoGain));
        assert!(queue.is_empty());
    }

    #[test]
    fn favored_is_drained_before_normal_regardless_of_push_order() {
        let mut queue = ConcolicQueue::new();
        queue.push(seed(1), CoverageGain::NewPath);
        queue.push(seed(2), CoverageGain::NewEdge);
        queue.push(seed(3), CoverageGain::NewPath);

        let first = queue.pop().unwrap();
        assert_eq!(first.priority, Priority::Favored);
        assert_eq!(first.seed.concretize(), vec![2]);

        let second = queue.pop().unwrap();
        assert_eq!(second.priority, Priority::Normal);
        assert_eq!(second.seed.concretize(), vec![1]);
    }

    #[test]
    fn each_priority_is_fifo_within_itself() {
        let mut queue = ConcolicQueue::new();
        queue.push(seed(1), CoverageGain::NewEdge);
        queue.push(seed(2), CoverageGain::NewEdge);
        assert_eq!(queue.pop().unwrap().seed.concretize(), vec![1]);
        assert_eq!(queue.pop().unwrap().seed.concretize(), vec![2]);
    }

    #[test]
    fn len_accounts_for_both_partitions() {
        let mut queue = ConcolicQueue::new();
        queue.push(seed(1), CoverageGain::NewEdge);
        queue.push(seed(2), CoverageGain::NewPath);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.favored_len(), 1);
        assert_eq!(queue.normal_len(), 1);
    }
}
