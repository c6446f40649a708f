use eventhubs_amqp_types::{
    definitions,
    performatives::{Close, Open, Performative},
    states::EndpointState,
};

use crate::{
    handler::AmqpConnection,
    reactor::{Outbox, Output},
    transport::{Transport, TransportNegotiator},
    util::Running,
};

use super::{Connection, ConnectionConfig, ConnectionEvent, ConnectionId};

/// Drives one [`Connection`] through its lifecycle
///
/// Exactly one open-complete and at most one connection-error reach the owning
/// [`AmqpConnection`], regardless of the order in which the peer and the transport
/// report the same failure.
pub struct ConnectionSupervisor {
    id: ConnectionId,
    config: ConnectionConfig,
    connection: Connection,
    transport: Transport,
    negotiator: TransportNegotiator,
    handler: Box<dyn AmqpConnection>,
    open_dispatched: bool,
    error_dispatched: bool,
}

impl std::fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("id", &self.id)
            .field("connection", &self.connection)
            .field("transport", &self.transport)
            .field("open_dispatched", &self.open_dispatched)
            .field("error_dispatched", &self.error_dispatched)
            .finish()
    }
}

impl ConnectionSupervisor {
    pub(crate) fn new(
        id: ConnectionId,
        config: ConnectionConfig,
        handler: Box<dyn AmqpConnection>,
    ) -> Self {
        let connection = Connection::new(&config);
        Self {
            id,
            config,
            connection,
            transport: Transport::default(),
            negotiator: TransportNegotiator,
            handler,
            open_dispatched: false,
            error_dispatched: false,
        }
    }

    /// The supervised connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// The transport of the supervised connection
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub(crate) fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether the local side may still begin sessions
    pub(crate) fn accepts_sessions(&self) -> bool {
        matches!(self.connection.local_state, EndpointState::Active)
            && !matches!(self.connection.remote_state, EndpointState::Closed)
    }

    /// Closed locally with no transport left to release
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.connection.local_state, EndpointState::Closed) && !self.transport.is_bound()
    }

    /// Returns [`Running::Stop`] once the connection's resources should be released
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "EVENT", skip_all, fields(id = %self.id)))]
    pub(crate) fn handle(&mut self, event: ConnectionEvent, outbox: &mut Outbox) -> Running {
        #[cfg(feature = "tracing")]
        tracing::trace!(?event);
        #[cfg(feature = "log")]
        log::trace!("{}: {:?}", self.id, event);

        match event {
            ConnectionEvent::Init => self.on_init(outbox),
            ConnectionEvent::Bound => self.on_bound(outbox),
            ConnectionEvent::RemoteOpen(open) => self.on_remote_open(open),
            ConnectionEvent::RemoteClose(error) => self.on_remote_close(error),
            ConnectionEvent::LocalClose => self.on_local_close(outbox),
            ConnectionEvent::TransportError(error) => self.on_transport_error(error, outbox),
            ConnectionEvent::TransportClosed => self.on_transport_closed(),
            ConnectionEvent::Unbound => return self.on_unbound(),
        }
        Running::Continue
    }

    fn on_init(&mut self, outbox: &mut Outbox) {
        match self.connection.local_state {
            EndpointState::Uninitialized => {}
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!("connection is already initialized");
                #[cfg(feature = "log")]
                log::debug!("{} is already initialized", self.id);
                return;
            }
        }

        let open = self.connection.local_open(self.config.idle_time_out());
        #[cfg(feature = "tracing")]
        tracing::info!(
            container_id = %open.container_id,
            hostname = ?open.hostname,
            "sending open"
        );
        #[cfg(feature = "log")]
        log::info!(
            "{} sending open: container_id {}, hostname {:?}",
            self.id,
            open.container_id,
            open.hostname
        );

        self.connection.local_state = EndpointState::Active;
        outbox.push_back((self.id, Output::Frame(Performative::Open(open))));
    }

    fn on_bound(&mut self, outbox: &mut Outbox) {
        if !self.transport.bind(self.id) {
            #[cfg(feature = "tracing")]
            tracing::debug!(state = ?self.transport.state(), "transport is already bound");
            #[cfg(feature = "log")]
            log::debug!("{} transport is already bound", self.id);
            return;
        }

        self.negotiator.configure(
            &mut self.transport,
            self.config.peer_verify_mode(),
            self.connection.hostname(),
        );

        if let (Some(tls), Some(sasl)) = (self.transport.tls(), self.transport.sasl()) {
            let output = Output::Negotiate {
                tls: tls.clone(),
                sasl: sasl.clone(),
            };
            outbox.push_back((self.id, output));
        }
    }

    fn on_remote_open(&mut self, open: Open) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            remote_container_id = %open.container_id,
            hostname = ?open.hostname,
            "remote open"
        );
        #[cfg(feature = "log")]
        log::info!(
            "{} remote open: container_id {}, hostname {:?}",
            self.id,
            open.container_id,
            open.hostname
        );

        self.connection.remote_state = EndpointState::Active;
        self.connection.remote_container_id = Some(open.container_id);

        if self.open_dispatched {
            return;
        }
        self.open_dispatched = true;
        self.handler.on_open_complete(None);
    }

    fn on_remote_close(&mut self, error: Option<definitions::Error>) {
        #[cfg(feature = "tracing")]
        tracing::info!(?error, "remote close");
        #[cfg(feature = "log")]
        log::info!("{} remote close: {:?}", self.id, error);

        self.connection.remote_state = EndpointState::Closed;
        self.connection.remote_condition = error.clone();
        self.dispatch_error(error);
    }

    fn on_local_close(&mut self, outbox: &mut Outbox) {
        if let EndpointState::Closed = self.connection.local_state {
            return;
        }

        self.connection.local_state = EndpointState::Closed;
        outbox.push_back((self.id, Output::Frame(Performative::Close(Close::default()))));

        // The service closed first. Some peers never follow up by closing the transport,
        // so it is released here.
        if let EndpointState::Closed = self.connection.remote_state {
            self.unbind(outbox);
        }
    }

    fn on_transport_error(&mut self, error: Option<definitions::Error>, outbox: &mut Outbox) {
        #[cfg(feature = "tracing")]
        tracing::warn!(?error, "transport error");
        #[cfg(feature = "log")]
        log::warn!("{} transport error: {:?}", self.id, error);

        self.transport.set_condition(error);

        // No close frame was seen, so this is an abrupt disconnect
        if !matches!(self.connection.remote_state, EndpointState::Closed) {
            let condition = self.transport.condition().cloned();
            self.dispatch_error(condition);
        }

        // Transport errors are not followed by IO cleanup
        self.unbind(outbox);
    }

    fn on_transport_closed(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(state = ?self.transport.state(), "transport closed");
        #[cfg(feature = "log")]
        log::debug!("{} transport closed", self.id);

        if !matches!(self.connection.remote_state, EndpointState::Closed) {
            let condition = self.transport.condition().cloned();
            self.dispatch_error(condition);
        }
    }

    fn on_unbound(&mut self) -> Running {
        match self.connection.remote_state {
            // Failed before any handshake began
            EndpointState::Uninitialized => Running::Continue,
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!("releasing connection");
                #[cfg(feature = "log")]
                log::debug!("{} releasing connection", self.id);
                Running::Stop
            }
        }
    }

    fn unbind(&mut self, outbox: &mut Outbox) {
        if self.transport.unbind() {
            outbox.push_back((self.id, Output::Unbind));
        }
    }

    fn dispatch_error(&mut self, condition: Option<definitions::Error>) {
        if self.error_dispatched {
            #[cfg(feature = "tracing")]
            tracing::debug!(?condition, "connection error already reported");
            #[cfg(feature = "log")]
            log::debug!("{} error already reported: {:?}", self.id, condition);
            return;
        }
        self.error_dispatched = true;
        self.handler.on_connection_error(condition);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eventhubs_amqp_types::{
        definitions::{self, AmqpError, ConnectionError},
        performatives::{Open, Performative},
        states::EndpointState,
    };
    use parking_lot::Mutex;

    use crate::{
        arena::Arena,
        connection::{Connection, ConnectionEvent, ConnectionId},
        handler::AmqpConnection,
        reactor::{Outbox, Output},
        transport::TransportState,
        util::Running,
    };

    use super::ConnectionSupervisor;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        OpenComplete(Option<definitions::Error>),
        ConnectionError(Option<definitions::Error>),
    }

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<Call>>>);

    impl AmqpConnection for Recorder {
        fn on_open_complete(&mut self, error: Option<definitions::Error>) {
            self.0.lock().push(Call::OpenComplete(error))
        }

        fn on_connection_error(&mut self, condition: Option<definitions::Error>) {
            self.0.lock().push(Call::ConnectionError(condition))
        }
    }

    fn supervisor() -> (ConnectionSupervisor, Recorder) {
        let mut arena = Arena::default();
        let id = ConnectionId(arena.insert_with(|_| ()));
        let config = Connection::builder()
            .container_id("test-connection")
            .hostname("namespace.servicebus.windows.net")
            .build()
            .unwrap();
        let recorder = Recorder::default();
        let supervisor = ConnectionSupervisor::new(id, config, Box::new(recorder.clone()));
        (supervisor, recorder)
    }

    fn remote_open() -> ConnectionEvent {
        ConnectionEvent::RemoteOpen(Open {
            container_id: "broker".to_string(),
            hostname: None,
            idle_time_out: None,
            properties: None,
        })
    }

    fn count_unbind(outbox: &Outbox) -> usize {
        outbox
            .iter()
            .filter(|(_, output)| matches!(output, Output::Unbind))
            .count()
    }

    #[test]
    fn test_init_sends_open_with_properties() {
        let (mut supervisor, _) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(ConnectionEvent::Init, &mut outbox);

        assert_eq!(outbox.len(), 1);
        match &outbox[0].1 {
            Output::Frame(Performative::Open(open)) => {
                assert_eq!(open.container_id, "test-connection");
                assert_eq!(
                    open.hostname.as_deref(),
                    Some("namespace.servicebus.windows.net")
                );
                assert_eq!(open.properties.as_ref().map(|p| p.len()), Some(4));
            }
            other => panic!("unexpected output {:?}", other),
        }
        assert_eq!(
            supervisor.connection().local_state(),
            EndpointState::Active
        );
    }

    #[test]
    fn test_remote_open_completes_once() {
        let (mut supervisor, recorder) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(remote_open(), &mut outbox);
        supervisor.handle(remote_open(), &mut outbox);

        assert_eq!(*recorder.0.lock(), vec![Call::OpenComplete(None)]);
        assert_eq!(
            supervisor.connection().remote_container_id(),
            Some("broker")
        );
    }

    #[test]
    fn test_unreachable_host_reports_transport_condition() {
        let (mut supervisor, recorder) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(ConnectionEvent::Bound, &mut outbox);

        let error = definitions::Error::new(
            ConnectionError::ConnectionForced,
            Some("connection refused".to_string()),
            None,
        );
        supervisor.handle(ConnectionEvent::TransportError(Some(error.clone())), &mut outbox);
        supervisor.handle(ConnectionEvent::TransportClosed, &mut outbox);

        assert_eq!(*recorder.0.lock(), vec![Call::ConnectionError(Some(error))]);
        assert_eq!(count_unbind(&outbox), 1);
        assert_eq!(supervisor.transport().state(), TransportState::Released);
    }

    #[test]
    fn test_remote_close_takes_priority_over_transport_condition() {
        let (mut supervisor, recorder) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(ConnectionEvent::Bound, &mut outbox);
        supervisor.handle(remote_open(), &mut outbox);

        let remote = definitions::Error::from(AmqpError::UnauthorizedAccess);
        let transport = definitions::Error::from(ConnectionError::FramingError);
        supervisor.handle(ConnectionEvent::RemoteClose(Some(remote.clone())), &mut outbox);
        supervisor.handle(ConnectionEvent::TransportError(Some(transport)), &mut outbox);
        supervisor.handle(ConnectionEvent::TransportClosed, &mut outbox);

        assert_eq!(
            *recorder.0.lock(),
            vec![
                Call::OpenComplete(None),
                Call::ConnectionError(Some(remote.clone()))
            ]
        );
        assert_eq!(supervisor.connection().remote_condition(), Some(&remote));
    }

    #[test]
    fn test_local_close_after_remote_close_unbinds() {
        let (mut supervisor, _) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(ConnectionEvent::Bound, &mut outbox);
        supervisor.handle(remote_open(), &mut outbox);
        supervisor.handle(ConnectionEvent::RemoteClose(None), &mut outbox);
        supervisor.handle(ConnectionEvent::LocalClose, &mut outbox);
        supervisor.handle(ConnectionEvent::LocalClose, &mut outbox);

        assert_eq!(count_unbind(&outbox), 1);
        let closes = outbox
            .iter()
            .filter(|(_, output)| matches!(output, Output::Frame(Performative::Close(_))))
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_local_close_before_remote_close_keeps_transport() {
        let (mut supervisor, _) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(ConnectionEvent::Bound, &mut outbox);
        supervisor.handle(remote_open(), &mut outbox);
        supervisor.handle(ConnectionEvent::LocalClose, &mut outbox);

        assert_eq!(count_unbind(&outbox), 0);
        assert!(supervisor.transport().is_bound());
    }

    #[test]
    fn test_transport_closed_does_not_unbind() {
        let (mut supervisor, recorder) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        supervisor.handle(ConnectionEvent::Bound, &mut outbox);
        supervisor.handle(remote_open(), &mut outbox);
        supervisor.handle(ConnectionEvent::TransportClosed, &mut outbox);

        assert_eq!(count_unbind(&outbox), 0);
        assert_eq!(
            *recorder.0.lock(),
            vec![Call::OpenComplete(None), Call::ConnectionError(None)]
        );
    }

    #[test]
    fn test_unbound_releases_only_after_handshake_began() {
        let (mut supervisor, _) = supervisor();
        let mut outbox = Outbox::new();
        supervisor.handle(ConnectionEvent::Init, &mut outbox);
        assert_eq!(
            supervisor.handle(ConnectionEvent::Unbound, &mut outbox),
            Running::Continue
        );

        supervisor.handle(remote_open(), &mut outbox);
        assert_eq!(
            supervisor.handle(ConnectionEvent::Unbound, &mut outbox),
            Running::Stop
        );
    }
}
