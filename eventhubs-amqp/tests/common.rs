#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use eventhubs_amqp::{
    connection::{Connection, ConnectionConfig, ConnectionEvent, ConnectionId},
    handler::{AmqpConnection, SessionHandler},
    reactor::Output,
    session::{self, Session, SessionEvent, SessionId},
    types::performatives::{Begin, Open, Performative},
    types::definitions,
};
use parking_lot::Mutex;

pub const HOSTNAME: &str = "namespace.servicebus.windows.net";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OpenComplete(Option<definitions::Error>),
    ConnectionError(Option<definitions::Error>),
    SessionOpened(SessionId),
    SessionOpenError(Option<definitions::Error>, Option<session::Error>),
}

/// Records every callback it receives, in order
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn connection_handler(&self) -> Box<dyn AmqpConnection> {
        Box::new(self.clone())
    }

    pub fn session_handler(&self) -> Option<Box<dyn SessionHandler>> {
        Some(Box::new(self.clone()))
    }
}

impl AmqpConnection for Recorder {
    fn on_open_complete(&mut self, error: Option<definitions::Error>) {
        self.calls.lock().push(Call::OpenComplete(error))
    }

    fn on_connection_error(&mut self, condition: Option<definitions::Error>) {
        self.calls.lock().push(Call::ConnectionError(condition))
    }
}

impl SessionHandler for Recorder {
    fn on_remote_session_open(&mut self, session: &Session) {
        self.calls.lock().push(Call::SessionOpened(session.id()))
    }

    fn on_remote_session_open_error(
        &mut self,
        condition: Option<definitions::Error>,
        cause: Option<session::Error>,
    ) {
        self.calls
            .lock()
            .push(Call::SessionOpenError(condition, cause))
    }
}

pub fn config(session_open_timeout: Duration) -> ConnectionConfig {
    Connection::builder()
        .container_id("eventhubs-test")
        .url(format!("amqps://{}", HOSTNAME))
        .session_open_timeout(session_open_timeout)
        .build()
        .unwrap()
}

pub fn remote_open() -> ConnectionEvent {
    ConnectionEvent::RemoteOpen(Open {
        container_id: "broker".to_string(),
        hostname: Some(HOSTNAME.to_string()),
        idle_time_out: Some(120_000),
        properties: None,
    })
}

pub fn remote_begin() -> SessionEvent {
    SessionEvent::RemoteOpen(Begin {
        remote_channel: Some(0),
        next_outgoing_id: 1,
        incoming_window: 5000,
        outgoing_window: 2048,
    })
}

pub fn count_unbind(outputs: &[(ConnectionId, Output)]) -> usize {
    outputs
        .iter()
        .filter(|(_, output)| matches!(output, Output::Unbind))
        .count()
}

pub fn count_frames(
    outputs: &[(ConnectionId, Output)],
    f: impl Fn(&Performative) -> bool,
) -> usize {
    outputs
        .iter()
        .filter(|(_, output)| match output {
            Output::Frame(frame) | Output::SessionFrame(_, frame) => f(frame),
            _ => false,
        })
        .count()
}
