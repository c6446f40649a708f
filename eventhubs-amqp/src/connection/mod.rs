//! Connection lifecycle
//!
//! A [`Connection`] is owned by its [`ConnectionSupervisor`], which reacts to
//! [`ConnectionEvent`]s delivered by the event loop. The owning factory only observes the
//! connection through the [`AmqpConnection`](crate::handler::AmqpConnection) callbacks.

use std::fmt::Display;

use eventhubs_amqp_types::{
    definitions::{self, Fields},
    performatives::Open,
    states::EndpointState,
};

use crate::arena::Key;

mod builder;
pub use builder::*;

mod error;
pub use error::*;

mod properties;
pub use properties::*;

mod supervisor;
pub use supervisor::*;

/// Identifies a connection on a [`Reactor`](crate::reactor::Reactor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) Key);

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection-{}", self.0)
    }
}

/// Protocol events delivered to a [`ConnectionSupervisor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection was created locally
    Init,

    /// A transport was bound to the connection
    Bound,

    /// The peer sent its open
    RemoteOpen(Open),

    /// The peer sent its close, possibly carrying an error
    RemoteClose(Option<definitions::Error>),

    /// The connection was closed locally
    LocalClose,

    /// The transport failed, possibly with an error condition
    TransportError(Option<definitions::Error>),

    /// The transport was closed
    TransportClosed,

    /// The transport was unbound from the connection
    Unbound,
}

/// An AMQP connection as seen by the supervisor
#[derive(Debug, Clone)]
pub struct Connection {
    container_id: String,
    hostname: Option<String>,
    properties: Fields,
    local_state: EndpointState,
    remote_state: EndpointState,
    remote_container_id: Option<String>,
    remote_condition: Option<definitions::Error>,
}

impl Connection {
    pub(crate) fn new(config: &ConnectionConfig) -> Self {
        Self {
            container_id: config.container_id().to_string(),
            hostname: config.hostname().map(Into::into),
            properties: config.properties().to_fields(),
            local_state: EndpointState::Uninitialized,
            remote_state: EndpointState::Uninitialized,
            remote_container_id: None,
            remote_condition: None,
        }
    }

    /// Creates a [`Builder`] for the connection configuration
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Container id sent in the local open
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Target hostname sent in the local open
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Connection properties sent in the local open
    pub fn properties(&self) -> &Fields {
        &self.properties
    }

    /// Local endpoint state
    pub fn local_state(&self) -> EndpointState {
        self.local_state
    }

    /// Remote endpoint state
    pub fn remote_state(&self) -> EndpointState {
        self.remote_state
    }

    /// Container id of the peer, known once the remote open arrived
    pub fn remote_container_id(&self) -> Option<&str> {
        self.remote_container_id.as_deref()
    }

    /// Error condition carried by the remote close
    pub fn remote_condition(&self) -> Option<&definitions::Error> {
        self.remote_condition.as_ref()
    }

    pub(crate) fn local_open(&self, idle_time_out: Option<u32>) -> Open {
        Open {
            container_id: self.container_id.clone(),
            hostname: self.hostname.clone(),
            idle_time_out,
            properties: Some(self.properties.clone()),
        }
    }
}
