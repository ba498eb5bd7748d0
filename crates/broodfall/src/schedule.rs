//! # Scheduled Tasks
//!
//! Wall-clock callbacks do not exist in the core. Repeating work (spawning,
//! regeneration) is a [`ScheduledTask`] owned by whoever needs it and
//! advanced once per tick with the frame's delta. Pausing the owner simply
//! means not advancing it.

use std::time::Duration;

/// Lifecycle of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Never started, or finished.
    Idle,
    /// Counting toward the next firing.
    Armed,
    /// Armed but frozen.
    Paused,
}

/// A cancellable, pausable repeating timer.
#[derive(Clone, Debug)]
pub struct ScheduledTask {
    interval: Duration,
    elapsed: Duration,
    state: TaskState,
}

impl ScheduledTask {
    /// Creates an idle task with the given period.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            state: TaskState::Idle,
        }
    }

    /// Convenience constructor from milliseconds.
    #[must_use]
    pub const fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    /// Starts (or restarts) the task from zero.
    pub fn arm(&mut self) {
        self.elapsed = Duration::ZERO;
        self.state = TaskState::Armed;
    }

    /// Stops the task. Safe to call when already idle.
    pub fn cancel(&mut self) {
        self.elapsed = Duration::ZERO;
        self.state = TaskState::Idle;
    }

    /// Freezes an armed task.
    pub fn pause(&mut self) {
        if self.state == TaskState::Armed {
            self.state = TaskState::Paused;
        }
    }

    /// Unfreezes a paused task. Progress toward the next firing is kept.
    pub fn resume(&mut self) {
        if self.state == TaskState::Paused {
            self.state = TaskState::Armed;
        }
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// True if armed or paused.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state != TaskState::Idle
    }

    /// Period between firings.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Time accumulated toward the next firing.
    #[inline]
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advances the task and returns how many times it fired.
    ///
    /// A long frame can fire the task more than once; the remainder carries
    /// into the next period. Idle and paused tasks never fire.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        if self.state != TaskState::Armed || self.interval.is_zero() {
            return 0;
        }
        self.elapsed += delta;
        let mut fired = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_task_never_fires() {
        let mut task = ScheduledTask::from_millis(100);
        assert_eq!(task.advance(Duration::from_secs(10)), 0);
        assert!(!task.is_pending());
    }

    #[test]
    fn test_fires_on_interval() {
        let mut task = ScheduledTask::from_millis(2000);
        task.arm();
        assert_eq!(task.advance(Duration::from_millis(1999)), 0);
        assert_eq!(task.advance(Duration::from_millis(1)), 1);
        assert_eq!(task.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_long_frame_fires_multiple_times() {
        let mut task = ScheduledTask::from_millis(1000);
        task.arm();
        assert_eq!(task.advance(Duration::from_millis(3500)), 3);
        assert_eq!(task.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut task = ScheduledTask::from_millis(1000);
        task.arm();
        let _ = task.advance(Duration::from_millis(600));
        task.pause();
        assert_eq!(task.advance(Duration::from_millis(5000)), 0);
        assert_eq!(task.state(), TaskState::Paused);
        task.resume();
        assert_eq!(task.advance(Duration::from_millis(400)), 1);
    }

    #[test]
    fn test_cancel_resets() {
        let mut task = ScheduledTask::from_millis(1000);
        task.arm();
        let _ = task.advance(Duration::from_millis(900));
        task.cancel();
        task.cancel();
        assert_eq!(task.state(), TaskState::Idle);
        task.arm();
        assert_eq!(task.advance(Duration::from_millis(900)), 0);
    }
}
