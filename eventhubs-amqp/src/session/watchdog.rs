use eventhubs_amqp_types::{definitions, states::SessionState};

use crate::{
    connection::Connection,
    reactor::Outbox,
    transport::Transport,
};

use super::{Error, SessionSupervisor};

/// Picks the most specific explanation for a session whose begin was never answered
///
/// The remote close condition of the parent connection wins if it says anything. Otherwise
/// the transport's condition is used, and `fallback` is the last resort.
pub(crate) fn diagnose(
    connection: &Connection,
    transport: &Transport,
    fallback: Error,
) -> (Option<definitions::Error>, Option<Error>) {
    if let Some(condition) = connection
        .remote_condition()
        .filter(|condition| !condition.is_empty())
    {
        return (Some(condition.clone()), None);
    }

    if let Some(condition) = transport.condition() {
        return (Some(condition.clone()), None);
    }

    (None, Some(fallback))
}

impl SessionSupervisor {
    /// Fires when the open timeout elapsed
    ///
    /// Inert if the session was answered or has already failed
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "WATCHDOG", skip_all, fields(id = %self.session.id)))]
    pub(crate) fn on_watchdog(
        &mut self,
        connection: &Connection,
        transport: &Transport,
        outbox: &mut Outbox,
    ) {
        if self.session.is_settled() {
            #[cfg(feature = "tracing")]
            tracing::trace!(created = self.session.created, "watchdog is inert");
            #[cfg(feature = "log")]
            log::trace!("{} watchdog is inert", self.session.id);
            return;
        }

        let (condition, cause) = diagnose(
            connection,
            transport,
            Error::SessionCreationTimedOut,
        );
        #[cfg(feature = "tracing")]
        tracing::warn!(?condition, ?cause, "session open timed out");
        #[cfg(feature = "log")]
        log::warn!(
            "{} open timed out: condition {:?}, cause {:?}",
            self.session.id,
            condition,
            cause
        );

        self.session.error_dispatched = true;
        self.close_local(outbox);
        self.report_open_error(condition, cause);
    }

    /// The parent connection went away before the session settled. No frames can be sent
    /// anymore, so the session is only marked closed.
    pub(crate) fn on_connection_released(&mut self, connection: &Connection, transport: &Transport) {
        let (condition, cause) = diagnose(
            connection,
            transport,
            Error::ConnectionReleased,
        );
        self.session.local_state = SessionState::Closed;

        if self.session.is_settled() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %self.session.id, ?condition, ?cause, "connection released");
        #[cfg(feature = "log")]
        log::debug!("{} connection released: {:?} {:?}", self.session.id, condition, cause);

        self.session.error_dispatched = true;
        self.report_open_error(condition, cause);
    }
}
