//! Callbacks exposed to the owning factory
//!
//! These traits are the only coupling between the supervisors and whatever owns the
//! connections. Values passed into the callbacks are read-only snapshots.

use eventhubs_amqp_types::definitions;
use tokio::sync::mpsc;

use crate::session::{self, Session, SessionId};

/// Receives the terminal outcomes of a connection
pub trait AmqpConnection: Send {
    /// The peer acknowledged the open. Fired at most once per connection.
    fn on_open_complete(&mut self, error: Option<definitions::Error>);

    /// The connection failed after it was at least partially established. Fired at most once
    /// per connection.
    fn on_connection_error(&mut self, condition: Option<definitions::Error>);
}

/// Receives the outcome of a session open. Exactly one of the two methods fires.
pub trait SessionHandler: Send {
    /// The peer answered the begin
    fn on_remote_session_open(&mut self, session: &Session);

    /// The session failed before it was opened
    fn on_remote_session_open_error(
        &mut self,
        condition: Option<definitions::Error>,
        cause: Option<session::Error>,
    );
}

/// A connection outcome forwarded by [`ChannelHandler`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionNotification {
    /// See [`AmqpConnection::on_open_complete`]
    OpenComplete(Option<definitions::Error>),

    /// See [`AmqpConnection::on_connection_error`]
    ConnectionError(Option<definitions::Error>),
}

/// A session outcome forwarded by [`ChannelHandler`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    /// See [`SessionHandler::on_remote_session_open`]
    Opened(SessionId),

    /// See [`SessionHandler::on_remote_session_open_error`]
    OpenError {
        /// Error condition reported by the peer or the transport
        condition: Option<definitions::Error>,
        /// Locally synthesized cause
        cause: Option<session::Error>,
    },
}

/// Forwards callbacks as notifications over an unbounded channel
///
/// Sending never blocks the event loop. Notifications are dropped once the receiving half
/// is gone.
#[derive(Debug)]
pub struct ChannelHandler<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> ChannelHandler<T> {
    /// Creates a handler and the receiving half of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn notify(&self, notification: T) {
        if self.tx.send(notification).is_err() {
            #[cfg(feature = "tracing")]
            tracing::trace!("notification receiver is dropped");
            #[cfg(feature = "log")]
            log::trace!("notification receiver is dropped");
        }
    }
}

impl AmqpConnection for ChannelHandler<ConnectionNotification> {
    fn on_open_complete(&mut self, error: Option<definitions::Error>) {
        self.notify(ConnectionNotification::OpenComplete(error))
    }

    fn on_connection_error(&mut self, condition: Option<definitions::Error>) {
        self.notify(ConnectionNotification::ConnectionError(condition))
    }
}

impl SessionHandler for ChannelHandler<SessionNotification> {
    fn on_remote_session_open(&mut self, session: &Session) {
        self.notify(SessionNotification::Opened(session.id()))
    }

    fn on_remote_session_open_error(
        &mut self,
        condition: Option<definitions::Error>,
        cause: Option<session::Error>,
    ) {
        self.notify(SessionNotification::OpenError { condition, cause })
    }
}
