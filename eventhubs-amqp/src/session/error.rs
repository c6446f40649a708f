use crate::scheduler::ScheduleError;

/// Cause of a session open failure that was synthesized locally
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The peer never answered the begin
    #[error("session creation timedout.")]
    SessionCreationTimedOut,

    /// The watchdog could not be scheduled
    #[error("underlying IO faulted")]
    IoFaulted(#[source] ScheduleError),

    /// The parent connection was released before the peer answered the begin
    #[error("connection released before the session was opened")]
    ConnectionReleased,
}
