//! Session lifecycle
//!
//! Sessions live in an arena keyed by [`SessionId`]. A watchdog only carries the id and looks
//! the session up again when it fires, so a session that is gone by then is simply skipped.

use std::fmt::Display;

use eventhubs_amqp_types::{
    definitions,
    performatives::Begin,
    states::{EndpointState, SessionState},
};

use crate::{arena::Key, connection::ConnectionId};

mod error;
pub use error::*;

mod supervisor;
pub use supervisor::*;

mod watchdog;

/// Identifies a session on a [`Reactor`](crate::reactor::Reactor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) Key);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Protocol events delivered to a [`SessionSupervisor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The application requested the session to be opened
    LocalOpen,

    /// The peer sent its begin
    RemoteOpen(Begin),

    /// The peer sent its end, possibly carrying an error
    RemoteClose(Option<definitions::Error>),

    /// The application closed the session
    LocalClose,
}

/// An AMQP session as seen by its supervisor
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    connection: ConnectionId,
    local_state: SessionState,
    remote_state: EndpointState,
    created: bool,
    error_dispatched: bool,
}

impl Session {
    pub(crate) fn new(id: SessionId, connection: ConnectionId) -> Self {
        Self {
            id,
            connection,
            local_state: SessionState::Uninitialized,
            remote_state: EndpointState::Uninitialized,
            created: false,
            error_dispatched: false,
        }
    }

    /// Id of the session
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Id of the parent connection
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Local session state
    pub fn local_state(&self) -> SessionState {
        self.local_state
    }

    /// Remote endpoint state
    pub fn remote_state(&self) -> EndpointState {
        self.remote_state
    }

    /// Whether the peer has answered the begin
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Whether a failure has already been reported to the application
    pub fn is_error_dispatched(&self) -> bool {
        self.error_dispatched
    }

    /// Whether the session reached a terminal outcome
    pub fn is_settled(&self) -> bool {
        self.created || self.error_dispatched
    }
}
