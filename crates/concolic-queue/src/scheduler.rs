//! Wall-clock time budget (§4.8, §5).
//!
//! The core owns no long-running scheduler timeline beyond this simple
//! budget (§1 Non-goals): a deadline computed once at startup, checked
//! between queue pops. `check_and_reserve_time` is named for the
//! upstream call it mirrors — "reserve" because a caller is expected to
//! treat a `true` result as permission to spend the next pass's time,
//! not just a read of the clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TimeBudget {
    deadline: Option<Instant>,
}

impl TimeBudget {
    /// `limit = None` means unlimited (`--timelimit -1`).
    pub fn new(limit: Option<Duration>) -> TimeBudget {
        TimeBudget { deadline: limit.map(|d| Instant::now() + d) }
    }

    pub fn unlimited() -> TimeBudget {
        TimeBudget { deadline: None }
    }

    /// `true` while the budget still has time left (or is unlimited).
    /// The main loop calls this between queue pops; a `false` result
    /// means the next pop should short-circuit and the process should
    /// exit cleanly (§4.8, §6 exit codes).
    pub fn check_and_reserve_time(&self) -> bool {
        match self.deadline {
            None => true,
            Some(deadline) => Instant::now() < deadline,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_budget_never_expires() {
        let budget = TimeBudget::new(None);
        assert!(budget.check_and_reserve_time());
        assert_eq!(budget.remaining(), None);
    }

    #[test]
    fn expired_budget_stops_reserving_time() {
        let budget = TimeBudget::new(Some(Duration::from_millis(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!budget.check_and_reserve_time());
    }

    #[test]
    fn live_budget_still_reserves_time() {
        let budget = TimeBudget::new(Some(Duration::from_secs(60)));
        assert!(budget.check_and_reserve_time());
        assert!(budget.remaining().unwrap() > Duration::from_secs(1));
    }
}
