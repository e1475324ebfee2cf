//! Single-deadline tick scheduler.
//!
//! `PeriodicTask` replaces a GUI toolkit's `after(ms, callback)` timer. It holds
//! at most one pending deadline, so arming it again replaces the previous tick
//! instead of stacking a second one.

use std::time::{Duration, Instant};

use super::TickOutcome;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeriodicTask {
    deadline: Option<Instant>,
}

impl PeriodicTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn arm_at(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn arm_now(&mut self) {
        self.arm_at(Instant::now());
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Time left before the pending tick; `None` when nothing is armed.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consume the pending deadline if it has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Re-arm (or stay idle) according to what the last tick asked for.
    pub fn apply(&mut self, outcome: TickOutcome, now: Instant) {
        match outcome {
            TickOutcome::Reschedule(delay) => self.arm_at(now + delay),
            TickOutcome::Stop => self.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_task_is_never_due() {
        let mut task = PeriodicTask::new();
        assert!(!task.is_armed());
        assert_eq!(task.time_until(Instant::now()), None);
        assert!(!task.take_due(Instant::now()));
    }

    #[test]
    fn deadline_fires_once() {
        let now = Instant::now();
        let mut task = PeriodicTask::new();
        task.arm_at(now);
        assert!(task.take_due(now));
        assert!(!task.take_due(now));
    }

    #[test]
    fn rearming_replaces_the_pending_tick() {
        let now = Instant::now();
        let mut task = PeriodicTask::new();
        task.arm_at(now + Duration::from_secs(60));
        task.arm_at(now + Duration::from_millis(5));
        assert_eq!(task.time_until(now), Some(Duration::from_millis(5)));
        assert!(!task.take_due(now));
        assert!(task.take_due(now + Duration::from_millis(5)));
    }

    #[test]
    fn apply_follows_tick_outcome() {
        let now = Instant::now();
        let mut task = PeriodicTask::new();
        task.apply(TickOutcome::Reschedule(Duration::from_millis(100)), now);
        assert_eq!(task.time_until(now), Some(Duration::from_millis(100)));
        task.apply(TickOutcome::Stop, now);
        assert!(!task.is_armed());
    }
}
