//! Order watch state machine
//!
//! Tracks the last observed order count while at least one admin console is
//! connected. The polling task is the only writer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WatchState {
    /// No authenticated admin console
    Idle,
    /// `last_count` is `None` until the first successful poll
    Watching { last_count: Option<u64> },
}

/// Result of feeding one poll into the watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not watching, poll ignored
    Idle,
    /// First successful poll since watching started
    Baseline { count: u64 },
    Unchanged { count: u64 },
    /// Count went down (orders deleted); last count follows it
    Rebaselined { previous: u64, current: u64 },
    NewOrders { previous: u64, current: u64 },
    /// Fetch failed, last count kept
    Skipped,
}

impl PollOutcome {
    pub fn should_notify(&self) -> bool {
        matches!(self, PollOutcome::NewOrders { .. })
    }

    /// Number of orders seen since the previous poll
    pub fn new_orders(&self) -> u64 {
        match self {
            PollOutcome::NewOrders { previous, current } => current - previous,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderWatch {
    state: WatchState,
}

impl Default for OrderWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderWatch {
    pub fn new() -> Self {
        Self {
            state: WatchState::Idle,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatchState::Watching { .. })
    }

    pub fn last_count(&self) -> Option<u64> {
        match self.state {
            WatchState::Watching { last_count } => last_count,
            WatchState::Idle => None,
        }
    }

    /// Idle → Watching. Already watching keeps the current baseline.
    pub fn start(&mut self) {
        if let WatchState::Idle = self.state {
            self.state = WatchState::Watching { last_count: None };
        }
    }

    /// Watching → Idle, dropping the baseline
    pub fn stop(&mut self) {
        self.state = WatchState::Idle;
    }

    /// Feed a successfully fetched order count
    pub fn observe(&mut self, current: u64) -> PollOutcome {
        let WatchState::Watching { last_count } = &mut self.state else {
            return PollOutcome::Idle;
        };

        let outcome = match *last_count {
            None => PollOutcome::Baseline { count: current },
            Some(previous) if current > previous => PollOutcome::NewOrders { previous, current },
            Some(previous) if current < previous => PollOutcome::Rebaselined { previous, current },
            Some(_) => PollOutcome::Unchanged { count: current },
        };
        *last_count = Some(current);
        outcome
    }

    /// Feed a failed fetch
    pub fn observe_failure(&mut self) -> PollOutcome {
        if self.is_watching() {
            PollOutcome::Skipped
        } else {
            PollOutcome::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watching_at(count: u64) -> OrderWatch {
        let mut watch = OrderWatch::new();
        watch.start();
        watch.observe(count);
        watch
    }

    #[test]
    fn idle_ignores_polls() {
        let mut watch = OrderWatch::new();
        assert_eq!(watch.observe(10), PollOutcome::Idle);
        assert_eq!(watch.observe_failure(), PollOutcome::Idle);
        assert_eq!(watch.last_count(), None);
    }

    #[test]
    fn first_poll_is_baseline() {
        let mut watch = OrderWatch::new();
        watch.start();
        let outcome = watch.observe(5);
        assert_eq!(outcome, PollOutcome::Baseline { count: 5 });
        assert!(!outcome.should_notify());
        assert_eq!(watch.last_count(), Some(5));
    }

    #[test]
    fn growth_notifies_once() {
        let mut watch = watching_at(5);

        let outcome = watch.observe(7);
        assert_eq!(
            outcome,
            PollOutcome::NewOrders {
                previous: 5,
                current: 7
            }
        );
        assert!(outcome.should_notify());
        assert_eq!(outcome.new_orders(), 2);
        assert_eq!(watch.last_count(), Some(7));

        let outcome = watch.observe(7);
        assert_eq!(outcome, PollOutcome::Unchanged { count: 7 });
        assert!(!outcome.should_notify());
    }

    #[test]
    fn failure_keeps_last_count() {
        let mut watch = watching_at(5);

        assert_eq!(watch.observe_failure(), PollOutcome::Skipped);
        assert_eq!(watch.last_count(), Some(5));

        let outcome = watch.observe(6);
        assert_eq!(
            outcome,
            PollOutcome::NewOrders {
                previous: 5,
                current: 6
            }
        );
    }

    #[test]
    fn failure_before_baseline_keeps_waiting() {
        let mut watch = OrderWatch::new();
        watch.start();
        assert_eq!(watch.observe_failure(), PollOutcome::Skipped);
        assert_eq!(watch.observe(3), PollOutcome::Baseline { count: 3 });
    }

    #[test]
    fn decrease_rebaselines_without_notifying() {
        let mut watch = watching_at(9);
        let outcome = watch.observe(4);
        assert_eq!(
            outcome,
            PollOutcome::Rebaselined {
                previous: 9,
                current: 4
            }
        );
        assert!(!outcome.should_notify());
        assert!(watch.observe(5).should_notify());
    }

    #[test]
    fn restart_takes_a_new_baseline() {
        let mut watch = watching_at(5);
        watch.stop();
        assert_eq!(watch.state(), WatchState::Idle);

        watch.start();
        assert_eq!(watch.observe(8), PollOutcome::Baseline { count: 8 });
    }

    #[test]
    fn start_while_watching_is_noop() {
        let mut watch = watching_at(5);
        watch.start();
        assert_eq!(watch.last_count(), Some(5));
    }
}
