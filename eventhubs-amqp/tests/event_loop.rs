use std::time::Duration;

use eventhubs_amqp::{
    connection::ConnectionEvent,
    event_loop::{self, EventLoop},
    handler::{ConnectionNotification, SessionNotification},
    reactor::{self, Output},
    session,
    types::performatives::Performative,
};
use tokio::time::Instant;

mod common;
use common::{config, remote_begin, remote_open};

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn test_connection_outputs_and_notifications() {
    let (mut handle, mut outputs) = EventLoop::spawn();
    let (id, mut notifications) = handle.open(config(TIMEOUT)).await.unwrap();

    let (connection, output) = outputs.recv().await.unwrap();
    assert_eq!(connection, id);
    assert!(matches!(output, Output::Frame(Performative::Open(_))));

    handle.dispatch(id, ConnectionEvent::Bound).await.unwrap();
    let (_, output) = outputs.recv().await.unwrap();
    assert!(matches!(output, Output::Negotiate { .. }));

    handle.dispatch(id, remote_open()).await.unwrap();
    assert_eq!(
        notifications.recv().await,
        Some(ConnectionNotification::OpenComplete(None))
    );

    handle.dispatch(id, ConnectionEvent::TransportError(None)).await.unwrap();
    assert_eq!(
        notifications.recv().await,
        Some(ConnectionNotification::ConnectionError(None))
    );
    let (_, output) = outputs.recv().await.unwrap();
    assert_eq!(output, Output::Unbind);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_session_watchdog_fires_on_loop() {
    let (mut handle, _outputs) = EventLoop::spawn();
    let (id, _notifications) = handle.open(config(TIMEOUT)).await.unwrap();
    handle.dispatch(id, ConnectionEvent::Bound).await.unwrap();
    handle.dispatch(id, remote_open()).await.unwrap();

    let start = Instant::now();
    let (_session, mut notifications) = handle.create_session(id).await.unwrap();
    let notification = notifications.recv().await.unwrap();

    assert!(start.elapsed() >= TIMEOUT);
    assert_eq!(
        notification,
        SessionNotification::OpenError {
            condition: None,
            cause: Some(session::Error::SessionCreationTimedOut),
        }
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_session_answered_in_time() {
    let (mut handle, _outputs) = EventLoop::spawn();
    let (id, _notifications) = handle.open(config(TIMEOUT)).await.unwrap();
    handle.dispatch(id, ConnectionEvent::Bound).await.unwrap();
    handle.dispatch(id, remote_open()).await.unwrap();

    let (session, mut notifications) = handle.create_session(id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    handle.dispatch_session(session, remote_begin()).await.unwrap();

    assert_eq!(
        notifications.recv().await,
        Some(SessionNotification::Opened(session))
    );

    // Give the watchdog a chance to fire
    tokio::time::sleep(TIMEOUT * 2).await;
    assert!(notifications.try_recv().is_err());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_settles_pending_session() {
    let (mut handle, _outputs) = EventLoop::spawn();
    let (id, _notifications) = handle.open(config(TIMEOUT)).await.unwrap();
    handle.dispatch(id, ConnectionEvent::Bound).await.unwrap();
    handle.dispatch(id, remote_open()).await.unwrap();

    let (_session, mut notifications) = handle.create_session(id).await.unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(
        notifications.recv().await,
        Some(SessionNotification::OpenError {
            condition: None,
            cause: Some(session::Error::ConnectionReleased),
        })
    );
    assert_eq!(notifications.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_settles_pending_session() {
    let (mut handle, _outputs) = EventLoop::spawn();
    let (id, _notifications) = handle.open(config(TIMEOUT)).await.unwrap();
    handle.dispatch(id, ConnectionEvent::Bound).await.unwrap();

    let (_session, mut notifications) = handle.create_session(id).await.unwrap();
    drop(handle);

    assert!(matches!(
        notifications.recv().await,
        Some(SessionNotification::OpenError {
            cause: Some(session::Error::ConnectionReleased),
            ..
        })
    ));
}

#[tokio::test]
async fn test_reactor_errors_are_returned() {
    let (mut handle, _outputs) = EventLoop::spawn();
    let (id, _notifications) = handle.open(config(TIMEOUT)).await.unwrap();
    handle.dispatch(id, ConnectionEvent::Bound).await.unwrap();
    handle.dispatch(id, ConnectionEvent::LocalClose).await.unwrap();

    let result = handle.create_session(id).await;
    assert!(matches!(
        result,
        Err(event_loop::Error::Reactor(reactor::Error::IllegalState(_)))
    ));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_requests_after_shutdown_fail() {
    let (mut handle, _outputs) = EventLoop::spawn();
    handle.shutdown().await.unwrap();

    assert!(handle.is_closed());
    let result = handle.open(config(TIMEOUT)).await;
    assert!(matches!(result, Err(event_loop::Error::Stopped)));
}
