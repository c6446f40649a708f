use std::time::Duration;

use eventhubs_amqp_types::{
    definitions,
    performatives::{Begin, End, Performative},
    states::{EndpointState, SessionState},
};

use crate::{
    connection::ConnectionId,
    constants::{DEFAULT_INCOMING_WINDOW, DEFAULT_OUTGOING_WINDOW},
    handler::SessionHandler,
    reactor::{Outbox, Output},
    scheduler::{Scheduler, TimerTask},
};

use super::{Error, Session, SessionEvent, SessionId};

/// Drives one [`Session`] through its handshake and bounds how long it may stay half-open
pub struct SessionSupervisor {
    pub(crate) session: Session,
    handler: Option<Box<dyn SessionHandler>>,
    open_timeout: Duration,
}

impl std::fmt::Debug for SessionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSupervisor")
            .field("session", &self.session)
            .field("has_handler", &self.handler.is_some())
            .field("open_timeout", &self.open_timeout)
            .finish()
    }
}

impl SessionSupervisor {
    pub(crate) fn new(
        id: SessionId,
        connection: ConnectionId,
        handler: Option<Box<dyn SessionHandler>>,
        open_timeout: Duration,
    ) -> Self {
        Self {
            session: Session::new(id, connection),
            handler,
            open_timeout,
        }
    }

    /// The supervised session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A session can be dropped once it is closed locally and nobody waits for its outcome
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.session.local_state, SessionState::Closed)
            && (self.session.is_settled() || self.handler.is_none())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "EVENT", skip_all, fields(id = %self.session.id)))]
    pub(crate) fn handle(
        &mut self,
        event: SessionEvent,
        scheduler: &mut dyn Scheduler,
        outbox: &mut Outbox,
    ) {
        #[cfg(feature = "tracing")]
        tracing::trace!(?event);
        #[cfg(feature = "log")]
        log::trace!("{}: {:?}", self.session.id, event);

        match event {
            SessionEvent::LocalOpen => self.on_local_open(scheduler, outbox),
            SessionEvent::RemoteOpen(begin) => self.on_remote_open(begin, outbox),
            SessionEvent::RemoteClose(error) => self.on_remote_close(error, outbox),
            SessionEvent::LocalClose => self.close_local(outbox),
        }
    }

    fn on_local_open(&mut self, scheduler: &mut dyn Scheduler, outbox: &mut Outbox) {
        match self.session.local_state {
            SessionState::Uninitialized => {}
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!(state = ?self.session.local_state, "begin already sent");
                #[cfg(feature = "log")]
                log::debug!("{} begin already sent", self.session.id);
                return;
            }
        }

        self.session.local_state = SessionState::LocalOpenSent;
        self.send_begin(outbox);

        // Without a handler nobody could observe a timeout
        if self.handler.is_none() {
            return;
        }

        let task = TimerTask::SessionWatchdog(self.session.id);
        match scheduler.schedule(self.open_timeout, task) {
            Ok(_timer) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(timer = ?_timer, timeout = ?self.open_timeout, "watchdog armed");
                #[cfg(feature = "log")]
                log::trace!("{} watchdog armed {:?}", self.session.id, _timer);
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(%err, "failed to arm watchdog");
                #[cfg(feature = "log")]
                log::error!("{} failed to arm watchdog: {}", self.session.id, err);

                self.session.error_dispatched = true;
                self.close_local(outbox);
                self.report_open_error(None, Some(Error::IoFaulted(err)));
            }
        }
    }

    fn on_remote_open(&mut self, begin: Begin, outbox: &mut Outbox) {
        if self.session.created {
            #[cfg(feature = "tracing")]
            tracing::debug!("session already created");
            #[cfg(feature = "log")]
            log::debug!("{} already created", self.session.id);
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            incoming_window = begin.incoming_window,
            outgoing_window = begin.outgoing_window,
            "remote begin"
        );
        #[cfg(feature = "log")]
        log::info!(
            "{} remote begin: incoming-window {}, outgoing-window {}",
            self.session.id,
            begin.incoming_window,
            begin.outgoing_window
        );

        self.session.created = true;
        self.session.remote_state = EndpointState::Active;

        match self.session.local_state {
            SessionState::Uninitialized => {
                self.send_begin(outbox);
                self.session.local_state = SessionState::Active;
            }
            SessionState::LocalOpenSent => self.session.local_state = SessionState::Active,
            SessionState::Active | SessionState::Closed => {}
        }

        // Answered after the watchdog already gave up on it
        if self.session.error_dispatched {
            self.close_local(outbox);
            return;
        }

        if let Some(handler) = self.handler.as_mut() {
            handler.on_remote_session_open(&self.session);
        }
    }

    fn on_remote_close(&mut self, error: Option<definitions::Error>, outbox: &mut Outbox) {
        #[cfg(feature = "tracing")]
        tracing::info!(?error, "remote end");
        #[cfg(feature = "log")]
        log::info!("{} remote end: {:?}", self.session.id, error);

        self.session.remote_state = EndpointState::Closed;

        if !self.session.is_settled() {
            self.session.error_dispatched = true;
            self.report_open_error(error, None);
        }

        self.close_local(outbox);
    }

    fn send_begin(&mut self, outbox: &mut Outbox) {
        let begin = Begin {
            remote_channel: None,
            next_outgoing_id: 0,
            incoming_window: DEFAULT_INCOMING_WINDOW,
            outgoing_window: DEFAULT_OUTGOING_WINDOW,
        };
        let output = Output::SessionFrame(self.session.id, Performative::Begin(begin));
        outbox.push_back((self.session.connection, output));
    }

    pub(super) fn close_local(&mut self, outbox: &mut Outbox) {
        if let SessionState::Closed = self.session.local_state {
            return;
        }

        self.session.local_state = SessionState::Closed;
        let output = Output::SessionFrame(self.session.id, Performative::End(End::default()));
        outbox.push_back((self.session.connection, output));
    }

    pub(super) fn report_open_error(
        &mut self,
        condition: Option<definitions::Error>,
        cause: Option<Error>,
    ) {
        if let Some(handler) = self.handler.as_mut() {
            handler.on_remote_session_open_error(condition, cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, Instant},
    };

    use eventhubs_amqp_types::{
        definitions::{self, AmqpError},
        performatives::{Begin, Performative},
        states::{EndpointState, SessionState},
    };
    use parking_lot::Mutex;

    use crate::{
        arena::Arena,
        connection::{Connection, ConnectionId},
        handler::SessionHandler,
        reactor::{Outbox, Output},
        scheduler::{ScheduleError, TimerQueue, TimerTask},
        session::{Error, Session, SessionEvent, SessionId},
        transport::Transport,
    };

    use super::SessionSupervisor;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Opened(SessionId),
        OpenError(Option<definitions::Error>, Option<Error>),
    }

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<Call>>>);

    impl SessionHandler for Recorder {
        fn on_remote_session_open(&mut self, session: &Session) {
            self.0.lock().push(Call::Opened(session.id()))
        }

        fn on_remote_session_open_error(
            &mut self,
            condition: Option<definitions::Error>,
            cause: Option<Error>,
        ) {
            self.0.lock().push(Call::OpenError(condition, cause))
        }
    }

    struct Fixture {
        connection: Connection,
        transport: Transport,
        timers: TimerQueue,
        outbox: Outbox,
        supervisor: SessionSupervisor,
        recorder: Recorder,
    }

    impl Fixture {
        fn new() -> Self {
            let mut arena = Arena::default();
            let connection_id = ConnectionId(arena.insert_with(|_| ()));
            let session_id = SessionId(arena.insert_with(|_| ()));
            let config = Connection::builder().hostname("localhost").build().unwrap();
            let recorder = Recorder::default();
            let supervisor = SessionSupervisor::new(
                session_id,
                connection_id,
                Some(Box::new(recorder.clone())),
                Duration::from_secs(10),
            );
            Self {
                connection: Connection::new(&config),
                transport: Transport::default(),
                timers: TimerQueue::new(Instant::now()),
                outbox: Outbox::new(),
                supervisor,
                recorder,
            }
        }

        fn handle(&mut self, event: SessionEvent) {
            self.supervisor
                .handle(event, &mut self.timers, &mut self.outbox);
        }

        fn fire_watchdog(&mut self) {
            self.supervisor
                .on_watchdog(&self.connection, &self.transport, &mut self.outbox);
        }

        fn calls(&self) -> Vec<Call> {
            self.recorder.0.lock().clone()
        }

        fn ends(&self) -> usize {
            self.outbox
                .iter()
                .filter(|(_, output)| {
                    matches!(output, Output::SessionFrame(_, Performative::End(_)))
                })
                .count()
        }
    }

    fn begin() -> Begin {
        Begin {
            remote_channel: Some(0),
            next_outgoing_id: 1,
            incoming_window: 5000,
            outgoing_window: 100,
        }
    }

    #[test]
    fn test_local_open_arms_watchdog() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::LocalOpen);
        fixture.handle(SessionEvent::LocalOpen);

        assert_eq!(fixture.outbox.len(), 1);
        assert_eq!(fixture.timers.len(), 1);
        assert_eq!(
            fixture.supervisor.session().local_state(),
            SessionState::LocalOpenSent
        );
        let deadline = fixture.timers.next_deadline().unwrap();
        fixture.timers.advance_to(deadline);
        assert_eq!(
            fixture.timers.pop_due(),
            Some(TimerTask::SessionWatchdog(fixture.supervisor.session().id()))
        );
    }

    #[test]
    fn test_remote_open_reports_once() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::LocalOpen);
        fixture.handle(SessionEvent::RemoteOpen(begin()));
        fixture.handle(SessionEvent::RemoteOpen(begin()));
        fixture.fire_watchdog();

        let id = fixture.supervisor.session().id();
        assert_eq!(fixture.calls(), vec![Call::Opened(id)]);
        assert_eq!(
            fixture.supervisor.session().local_state(),
            SessionState::Active
        );
        assert_eq!(
            fixture.supervisor.session().remote_state(),
            EndpointState::Active
        );
    }

    #[test]
    fn test_peer_initiated_begin_is_answered() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::RemoteOpen(begin()));

        assert_eq!(fixture.outbox.len(), 1);
        assert!(matches!(
            fixture.outbox[0].1,
            Output::SessionFrame(_, Performative::Begin(_))
        ));
        assert_eq!(
            fixture.supervisor.session().local_state(),
            SessionState::Active
        );
    }

    #[test]
    fn test_remote_close_before_open_reports_condition() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::LocalOpen);
        let error = definitions::Error::from(AmqpError::UnauthorizedAccess);
        fixture.handle(SessionEvent::RemoteClose(Some(error.clone())));
        fixture.fire_watchdog();

        assert_eq!(fixture.calls(), vec![Call::OpenError(Some(error), None)]);
        assert!(fixture.supervisor.session().is_error_dispatched());
        assert_eq!(fixture.ends(), 1);
        assert!(fixture.supervisor.is_finished());
    }

    #[test]
    fn test_remote_close_after_open_only_closes() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::LocalOpen);
        fixture.handle(SessionEvent::RemoteOpen(begin()));
        fixture.handle(SessionEvent::RemoteClose(None));

        let id = fixture.supervisor.session().id();
        assert_eq!(fixture.calls(), vec![Call::Opened(id)]);
        assert_eq!(fixture.ends(), 1);
    }

    #[test]
    fn test_watchdog_reports_timeout() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::LocalOpen);
        fixture.fire_watchdog();
        fixture.fire_watchdog();

        assert_eq!(
            fixture.calls(),
            vec![Call::OpenError(None, Some(Error::SessionCreationTimedOut))]
        );
        assert_eq!(fixture.ends(), 1);
    }

    #[test]
    fn test_late_remote_open_is_not_reported() {
        let mut fixture = Fixture::new();
        fixture.handle(SessionEvent::LocalOpen);
        fixture.fire_watchdog();
        fixture.handle(SessionEvent::RemoteOpen(begin()));

        assert_eq!(fixture.calls().len(), 1);
        assert!(fixture.supervisor.session().is_created());
        assert_eq!(fixture.ends(), 1);
    }

    #[test]
    fn test_scheduling_fault_fails_immediately() {
        let mut fixture = Fixture::new();
        fixture.timers.close();
        fixture.handle(SessionEvent::LocalOpen);

        assert_eq!(
            fixture.calls(),
            vec![Call::OpenError(
                None,
                Some(Error::IoFaulted(ScheduleError::Closed))
            )]
        );
        assert_eq!(
            fixture.supervisor.session().local_state(),
            SessionState::Closed
        );
        assert_eq!(fixture.ends(), 1);
    }

    #[test]
    fn test_unrepresentable_timeout_fails_immediately() {
        let mut fixture = Fixture::new();
        let id = fixture.supervisor.session().id();
        let connection = fixture.supervisor.session().connection();
        fixture.supervisor = SessionSupervisor::new(
            id,
            connection,
            Some(Box::new(fixture.recorder.clone())),
            Duration::MAX,
        );
        fixture.handle(SessionEvent::LocalOpen);

        assert_eq!(
            fixture.calls(),
            vec![Call::OpenError(
                None,
                Some(Error::IoFaulted(ScheduleError::DeadlineOverflow))
            )]
        );
        assert!(fixture.timers.is_empty());
        assert_eq!(fixture.ends(), 1);
    }

    #[test]
    fn test_no_watchdog_without_handler() {
        let mut fixture = Fixture::new();
        let id = fixture.supervisor.session().id();
        let connection = fixture.supervisor.session().connection();
        fixture.supervisor =
            SessionSupervisor::new(id, connection, None, Duration::from_secs(10));
        fixture.handle(SessionEvent::LocalOpen);
        assert!(fixture.timers.is_empty());

        fixture.handle(SessionEvent::LocalClose);
        assert!(fixture.supervisor.is_finished());
    }
}
