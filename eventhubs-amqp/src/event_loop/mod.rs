//! Runs a [`Reactor`] on a single tokio task
//!
//! Every command, every watchdog and every callback into a handler runs on the task spawned
//! by [`EventLoop::spawn`], so connection and session state is never touched from two places
//! at once. Side effects leave the loop over the output channel returned alongside the
//! [`EventLoopHandle`].

use std::pin::Pin;

use futures_util::StreamExt;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};

use crate::{
    connection::{ConnectionConfig, ConnectionEvent, ConnectionId},
    constants::{DEFAULT_CONTROL_CHAN_BUF, DEFAULT_OUTPUT_CHAN_BUF},
    control::EventLoopControl,
    handler::{
        AmqpConnection, ChannelHandler, ConnectionNotification, SessionHandler,
        SessionNotification,
    },
    reactor::{self, Output, Reactor},
    session::{SessionEvent, SessionId},
    util::Running,
};

mod deadline;
use deadline::Deadline;

/// Error communicating with an [`EventLoop`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The loop is no longer running
    #[error("Event loop has stopped")]
    Stopped,

    /// The reactor rejected the request
    #[error(transparent)]
    Reactor(#[from] reactor::Error),

    /// The loop task panicked or was cancelled
    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
}

/// The task that owns a [`Reactor`]
pub struct EventLoop {
    reactor: Reactor,
    control: mpsc::Receiver<EventLoopControl>,
    outputs: mpsc::Sender<(ConnectionId, Output)>,
    deadline: Pin<Box<Deadline>>,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("reactor", &self.reactor)
            .finish()
    }
}

impl EventLoop {
    /// Spawns the loop onto the current tokio runtime
    ///
    /// Outputs are delivered in the order the reactor produced them. The loop waits for room
    /// on the output channel, so the receiver should be drained.
    pub fn spawn() -> (EventLoopHandle, mpsc::Receiver<(ConnectionId, Output)>) {
        let (control_tx, control_rx) = mpsc::channel(DEFAULT_CONTROL_CHAN_BUF);
        let (output_tx, output_rx) = mpsc::channel(DEFAULT_OUTPUT_CHAN_BUF);

        let event_loop = EventLoop {
            reactor: Reactor::new(Instant::now().into_std()),
            control: control_rx,
            outputs: output_tx,
            deadline: Box::pin(Deadline::never()),
        };
        let handle = tokio::spawn(event_loop.event_loop());

        let handle = EventLoopHandle {
            control: control_tx,
            handle: Some(handle),
        };
        (handle, output_rx)
    }

    fn on_control(&mut self, control: EventLoopControl) -> Running {
        // Watchdogs are scheduled relative to the reactor clock
        self.reactor.advance(Instant::now().into_std());

        match control {
            EventLoopControl::Open {
                config,
                handler,
                responder,
            } => {
                let id = self.reactor.open_connection(config, handler);
                let _ = responder.send(id);
            }
            EventLoopControl::Connection {
                id,
                event,
                responder,
            } => {
                let _ = responder.send(self.reactor.dispatch(id, event));
            }
            EventLoopControl::CreateSession {
                connection,
                handler,
                responder,
            } => {
                let result = self
                    .reactor
                    .create_session(connection, handler)
                    .and_then(|id| {
                        self.reactor
                            .dispatch_session(id, SessionEvent::LocalOpen)
                            .map(|_| id)
                    });
                let _ = responder.send(result);
            }
            EventLoopControl::Session {
                id,
                event,
                responder,
            } => {
                let _ = responder.send(self.reactor.dispatch_session(id, event));
            }
            EventLoopControl::Shutdown => {
                self.reactor.shutdown();
                return Running::Stop;
            }
        }
        Running::Continue
    }

    fn on_deadline(&mut self) -> Running {
        self.reactor.advance(Instant::now().into_std());
        Running::Continue
    }

    async fn flush(&mut self) {
        for output in self.reactor.drain_outputs() {
            if self.outputs.send(output).await.is_err() {
                #[cfg(feature = "tracing")]
                tracing::trace!("output receiver is dropped");
                #[cfg(feature = "log")]
                log::trace!("output receiver is dropped");
                break;
            }
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "EVENT_LOOP", skip_all))]
    async fn event_loop(mut self) {
        // Outputs of anything that happened before the loop started
        self.flush().await;

        loop {
            let next = self.reactor.next_deadline().map(Instant::from_std);
            self.deadline.as_mut().reset(next);

            let running = tokio::select! {
                _ = self.deadline.next() => self.on_deadline(),
                control = self.control.recv() => {
                    match control {
                        Some(control) => self.on_control(control),
                        None => {
                            // All handles are dropped
                            self.reactor.shutdown();
                            Running::Stop
                        }
                    }
                }
            };

            self.flush().await;
            if let Running::Stop = running {
                break;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            connections = self.reactor.connection_count(),
            sessions = self.reactor.session_count(),
            "stopped"
        );
        #[cfg(feature = "log")]
        log::debug!(
            "event loop stopped with {} connections and {} sessions",
            self.reactor.connection_count(),
            self.reactor.session_count()
        );
    }
}

/// A handle to a running [`EventLoop`]
///
/// Dropping the handle stops the loop.
#[derive(Debug)]
pub struct EventLoopHandle {
    control: mpsc::Sender<EventLoopControl>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for EventLoopHandle {
    fn drop(&mut self) {
        let _ = self.control.try_send(EventLoopControl::Shutdown);
    }
}

impl EventLoopHandle {
    /// Checks if the underlying event loop has stopped
    pub fn is_closed(&self) -> bool {
        self.control.is_closed()
    }

    /// Opens a connection whose outcome is delivered over the returned receiver
    pub async fn open(
        &self,
        config: ConnectionConfig,
    ) -> Result<
        (
            ConnectionId,
            mpsc::UnboundedReceiver<ConnectionNotification>,
        ),
        Error,
    > {
        let (handler, rx) = ChannelHandler::<ConnectionNotification>::new();
        let id = self.open_with_handler(config, Box::new(handler)).await?;
        Ok((id, rx))
    }

    /// Opens a connection whose outcome is delivered to `handler`
    pub async fn open_with_handler(
        &self,
        config: ConnectionConfig,
        handler: Box<dyn AmqpConnection>,
    ) -> Result<ConnectionId, Error> {
        self.request(|responder| EventLoopControl::Open {
            config,
            handler,
            responder,
        })
        .await
    }

    /// Delivers a protocol event to a connection
    pub async fn dispatch(&self, id: ConnectionId, event: ConnectionEvent) -> Result<(), Error> {
        self.request(|responder| EventLoopControl::Connection {
            id,
            event,
            responder,
        })
        .await?
        .map_err(Into::into)
    }

    /// Creates a session and sends its begin. The outcome is delivered over the returned
    /// receiver.
    pub async fn create_session(
        &self,
        connection: ConnectionId,
    ) -> Result<(SessionId, mpsc::UnboundedReceiver<SessionNotification>), Error> {
        let (handler, rx) = ChannelHandler::<SessionNotification>::new();
        let id = self
            .create_session_with_handler(connection, Some(Box::new(handler)))
            .await?;
        Ok((id, rx))
    }

    /// Creates a session and sends its begin. A session without a handler is not watched.
    pub async fn create_session_with_handler(
        &self,
        connection: ConnectionId,
        handler: Option<Box<dyn SessionHandler>>,
    ) -> Result<SessionId, Error> {
        self.request(|responder| EventLoopControl::CreateSession {
            connection,
            handler,
            responder,
        })
        .await?
        .map_err(Into::into)
    }

    /// Delivers a protocol event to a session
    pub async fn dispatch_session(&self, id: SessionId, event: SessionEvent) -> Result<(), Error> {
        self.request(|responder| EventLoopControl::Session {
            id,
            event,
            responder,
        })
        .await?
        .map_err(Into::into)
    }

    /// Stops the loop and waits for it to exit
    ///
    /// Watchdogs still pending are dropped.
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        // The loop may already be gone, which is reflected by the join handle
        let _ = self.control.send(EventLoopControl::Shutdown).await;
        match self.handle.take() {
            Some(handle) => handle.await.map_err(Into::into),
            None => Ok(()),
        }
    }

    async fn request<T>(
        &self,
        control: impl FnOnce(oneshot::Sender<T>) -> EventLoopControl,
    ) -> Result<T, Error> {
        let (responder, rx) = oneshot::channel();
        self.control
            .send(control(responder))
            .await
            .map_err(|_| Error::Stopped)?;
        rx.await.map_err(|_| Error::Stopped)
    }
}
