//! Commands sent from an [`EventLoopHandle`](crate::event_loop::EventLoopHandle) to its loop

use tokio::sync::oneshot;

use crate::{
    connection::{ConnectionConfig, ConnectionEvent, ConnectionId},
    handler::{AmqpConnection, SessionHandler},
    reactor,
    session::{SessionEvent, SessionId},
};

pub(crate) enum EventLoopControl {
    Open {
        config: ConnectionConfig,
        handler: Box<dyn AmqpConnection>,
        responder: oneshot::Sender<ConnectionId>,
    },
    Connection {
        id: ConnectionId,
        event: ConnectionEvent,
        responder: oneshot::Sender<Result<(), reactor::Error>>,
    },
    CreateSession {
        connection: ConnectionId,
        handler: Option<Box<dyn SessionHandler>>,
        responder: oneshot::Sender<Result<SessionId, reactor::Error>>,
    },
    Session {
        id: SessionId,
        event: SessionEvent,
        responder: oneshot::Sender<Result<(), reactor::Error>>,
    },
    Shutdown,
}

impl std::fmt::Debug for EventLoopControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { config, .. } => f.debug_struct("Open").field("config", config).finish(),
            Self::Connection { id, event, .. } => f
                .debug_struct("Connection")
                .field("id", id)
                .field("event", event)
                .finish(),
            Self::CreateSession { connection, .. } => f
                .debug_struct("CreateSession")
                .field("connection", connection)
                .finish(),
            Self::Session { id, event, .. } => f
                .debug_struct("Session")
                .field("id", id)
                .field("event", event)
                .finish(),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}
