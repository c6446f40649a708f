//! Delayed dispatch on the single cooperative event loop
//!
//! Every connection and session in a [`Reactor`](crate::reactor::Reactor) is mutated from one
//! logical executor. Work that has to happen later, such as a session watchdog, is never moved
//! onto another thread. Instead it is queued here and handed back to the same loop once its
//! deadline has passed.

use std::time::Duration;

use crate::session::SessionId;

mod timer;
pub use timer::*;

/// Work that is scheduled to run after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Check whether a session has been answered by the peer
    SessionWatchdog(SessionId),
}

/// Identifies a scheduled [`TimerTask`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u64);

/// Error scheduling a [`TimerTask`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The dispatch queue no longer accepts work
    #[error("Dispatch queue is closed")]
    Closed,

    /// The deadline cannot be represented by the clock
    #[error("Deadline is out of range")]
    DeadlineOverflow,
}

/// The delayed-dispatch primitive of the event loop
pub trait Scheduler {
    /// Schedules a task to be handed back to the loop after `delay`
    ///
    /// A task fires at most once. There is no cancellation; the task is expected to
    /// re-validate its target when it fires.
    fn schedule(&mut self, delay: Duration, task: TimerTask) -> Result<TimerId, ScheduleError>;
}
