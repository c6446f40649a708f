//! The single cooperative loop shared by every connection
//!
//! A [`Reactor`] performs no IO. Protocol events are fed in through [`Reactor::dispatch`]
//! and [`Reactor::dispatch_session`], time is moved forward with [`Reactor::advance`], and
//! the side effects the IO layer has to carry out are collected with
//! [`Reactor::drain_outputs`]. Every callback into an [`AmqpConnection`] or a
//! [`SessionHandler`] runs synchronously inside one of these calls.

use std::{collections::VecDeque, time::Instant};

use eventhubs_amqp_types::performatives::Performative;

use crate::{
    arena::Arena,
    connection::{Connection, ConnectionConfig, ConnectionEvent, ConnectionId, ConnectionSupervisor},
    handler::{AmqpConnection, SessionHandler},
    scheduler::{TimerQueue, TimerTask},
    session::{Session, SessionEvent, SessionId, SessionSupervisor},
    transport::{sasl::SaslConfig, tls::TlsConfig, IoCleanupHandler, Transport},
    util::Running,
};

/// Side effects requested from the IO layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Run the TLS handshake and then the SASL exchange on the bound stream
    Negotiate {
        /// TLS client settings
        tls: TlsConfig,
        /// Offered SASL mechanisms
        sasl: SaslConfig,
    },

    /// Send a connection level frame
    Frame(Performative),

    /// Send a frame on behalf of a session
    SessionFrame(SessionId, Performative),

    /// Release the OS resources of the transport. Requested at most once per connection.
    Unbind,
}

pub(crate) type Outbox = VecDeque<(ConnectionId, Output)>;

/// Misuse of the [`Reactor`] API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The connection does not exist or has been released
    #[error("{0} is not found")]
    ConnectionNotFound(ConnectionId),

    /// The session does not exist or has been removed
    #[error("{0} is not found")]
    SessionNotFound(SessionId),

    /// The connection is closing and does not accept new sessions
    #[error("Illegal local state: {0} does not accept new sessions")]
    IllegalState(ConnectionId),
}

/// Owns every connection and session and the timers of their watchdogs
#[derive(Debug)]
pub struct Reactor {
    connections: Arena<ConnectionSupervisor>,
    sessions: Arena<SessionSupervisor>,
    timers: TimerQueue,
    io_cleanup: IoCleanupHandler,
    outbox: Outbox,
}

impl Reactor {
    /// Creates an empty reactor whose clock starts at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            connections: Arena::default(),
            sessions: Arena::default(),
            timers: TimerQueue::new(now),
            io_cleanup: IoCleanupHandler,
            outbox: Outbox::new(),
        }
    }

    /// Creates a connection and requests its local open
    pub fn open_connection(
        &mut self,
        config: ConnectionConfig,
        handler: Box<dyn AmqpConnection>,
    ) -> ConnectionId {
        let key = self.connections.insert_with(|key| {
            ConnectionSupervisor::new(ConnectionId(key), config, handler)
        });
        let id = ConnectionId(key);

        #[cfg(feature = "tracing")]
        tracing::debug!(%id, "connection created");
        #[cfg(feature = "log")]
        log::debug!("{} created", id);

        if let Some(supervisor) = self.connections.get_mut(key) {
            supervisor.handle(ConnectionEvent::Init, &mut self.outbox);
        }
        id
    }

    /// Delivers a protocol event to a connection
    ///
    /// A transport-closed event is also seen by the IO cleanup. When the transport is
    /// released while handling the event, the connection is told that it was unbound.
    pub fn dispatch(&mut self, id: ConnectionId, event: ConnectionEvent) -> Result<(), Error> {
        let supervisor = self
            .connections
            .get_mut(id.0)
            .ok_or(Error::ConnectionNotFound(id))?;

        let was_bound = supervisor.transport().is_bound();
        let transport_closed = matches!(event, ConnectionEvent::TransportClosed);

        let mut running = supervisor.handle(event, &mut self.outbox);
        if transport_closed {
            self.io_cleanup
                .on_transport_closed(Some(supervisor.transport_mut()), &mut self.outbox);
        }
        if was_bound && !supervisor.transport().is_bound() {
            running = supervisor.handle(ConnectionEvent::Unbound, &mut self.outbox);
        }

        if running == Running::Stop || supervisor.is_finished() {
            self.release(id);
        }
        Ok(())
    }

    /// Creates a session on a connection
    ///
    /// The begin is only sent once [`SessionEvent::LocalOpen`] is dispatched. A session
    /// without a handler is never watched.
    pub fn create_session(
        &mut self,
        connection: ConnectionId,
        handler: Option<Box<dyn SessionHandler>>,
    ) -> Result<SessionId, Error> {
        let parent = self
            .connections
            .get(connection.0)
            .ok_or(Error::ConnectionNotFound(connection))?;
        if !parent.accepts_sessions() {
            return Err(Error::IllegalState(connection));
        }

        let timeout = parent.config().session_open_timeout();
        let key = self.sessions.insert_with(|key| {
            SessionSupervisor::new(SessionId(key), connection, handler, timeout)
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %SessionId(key), %connection, "session created");
        #[cfg(feature = "log")]
        log::debug!("{} created on {}", SessionId(key), connection);

        Ok(SessionId(key))
    }

    /// Delivers a protocol event to a session
    pub fn dispatch_session(&mut self, id: SessionId, event: SessionEvent) -> Result<(), Error> {
        let supervisor = self
            .sessions
            .get_mut(id.0)
            .ok_or(Error::SessionNotFound(id))?;

        supervisor.handle(event, &mut self.timers, &mut self.outbox);
        if supervisor.is_finished() {
            self.remove_session(id);
        }
        Ok(())
    }

    /// Moves the clock to `now` and fires every watchdog that is due
    pub fn advance(&mut self, now: Instant) {
        self.timers.advance_to(now);

        while let Some(task) = self.timers.pop_due() {
            match task {
                TimerTask::SessionWatchdog(id) => self.fire_watchdog(id),
            }
        }
    }

    /// The earliest instant at which [`advance`](Reactor::advance) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Stops accepting watchdogs. Sessions opened afterwards fail immediately.
    pub fn close_scheduler(&mut self) {
        self.timers.close();
    }

    /// Closes the scheduler and releases every live connection
    ///
    /// Sessions still waiting for the peer are settled with
    /// [`Error::ConnectionReleased`](crate::session::Error::ConnectionReleased) as the fallback cause.
    pub fn shutdown(&mut self) {
        self.close_scheduler();

        let live: Vec<ConnectionId> = self
            .connections
            .iter()
            .map(|(key, _)| ConnectionId(key))
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(connections = live.len(), "shutdown");
        #[cfg(feature = "log")]
        log::debug!("shutdown with {} connections", live.len());

        for id in live {
            self.release(id);
        }
    }

    /// Takes every side effect produced so far, in the order they were produced
    pub fn drain_outputs(&mut self) -> Vec<(ConnectionId, Output)> {
        self.outbox.drain(..).collect()
    }

    /// The current time of the reactor clock
    pub fn now(&self) -> Instant {
        self.timers.now()
    }

    /// A live connection
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.0).map(ConnectionSupervisor::connection)
    }

    /// The transport of a live connection
    pub fn transport(&self, id: ConnectionId) -> Option<&Transport> {
        self.connections.get(id.0).map(ConnectionSupervisor::transport)
    }

    /// A live session
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id.0).map(SessionSupervisor::session)
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn fire_watchdog(&mut self, id: SessionId) {
        // The session may be gone already
        let supervisor = match self.sessions.get_mut(id.0) {
            Some(supervisor) => supervisor,
            None => return,
        };
        let parent = match self.connections.get(supervisor.session().connection().0) {
            Some(parent) => parent,
            None => return,
        };

        supervisor.on_watchdog(parent.connection(), parent.transport(), &mut self.outbox);
        if supervisor.is_finished() {
            self.remove_session(id);
        }
    }

    fn release(&mut self, id: ConnectionId) {
        let supervisor = match self.connections.remove(id.0) {
            Some(supervisor) => supervisor,
            None => return,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(%id, "connection released");
        #[cfg(feature = "log")]
        log::debug!("{} released", id);

        let orphans: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.session().connection() == id)
            .map(|(key, _)| SessionId(key))
            .collect();

        for session in orphans {
            if let Some(mut orphan) = self.sessions.remove(session.0) {
                orphan.on_connection_released(supervisor.connection(), supervisor.transport());
            }
        }
    }

    fn remove_session(&mut self, id: SessionId) {
        if self.sessions.remove(id.0).is_some() {
            #[cfg(feature = "tracing")]
            tracing::trace!(%id, "session removed");
            #[cfg(feature = "log")]
            log::trace!("{} removed", id);
        }
    }
}
