#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Connection and session lifecycle supervision for AMQP1.0 Event Hubs clients
//!
//! The crate does not perform any IO itself. A [`Reactor`](reactor::Reactor) receives the
//! protocol events observed by an IO layer, drives every connection and session through
//! its state machine, and hands back the frames and transport actions that have to be
//! carried out. Each connection reports exactly one open-complete and at most one
//! connection-error to its [`AmqpConnection`](handler::AmqpConnection). Each watched
//! session reports exactly one outcome to its [`SessionHandler`](handler::SessionHandler),
//! even if the peer never answers.
//!
//! ```rust
//! use std::time::Instant;
//!
//! use eventhubs_amqp::{
//!     connection::{Connection, ConnectionEvent},
//!     handler::{ChannelHandler, ConnectionNotification},
//!     reactor::{Output, Reactor},
//! };
//!
//! let config = Connection::builder()
//!     .url("amqps://namespace.servicebus.windows.net")
//!     .build()
//!     .unwrap();
//!
//! let mut reactor = Reactor::new(Instant::now());
//! let (handler, mut notifications) = ChannelHandler::<ConnectionNotification>::new();
//! let id = reactor.open_connection(config, Box::new(handler));
//! reactor.dispatch(id, ConnectionEvent::Bound).unwrap();
//!
//! let outputs = reactor.drain_outputs();
//! assert!(matches!(outputs[0].1, Output::Frame(_)));
//! assert!(matches!(outputs[1].1, Output::Negotiate { .. }));
//! assert!(notifications.try_recv().is_err());
//! ```
//!
//! # Feature flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `"tracing"` | enables logging with `tracing` (default) |
//! | `"log"` | enables logging with `log` |
//! | `"rustls"` | builds `rustls` client configurations for the negotiated TLS settings |

pub(crate) mod arena;
pub(crate) mod control;
pub(crate) mod util;

pub mod connection;
pub mod constants;
pub mod event_loop;
pub mod handler;
pub mod reactor;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use eventhubs_amqp_types as types;

pub use connection::{Connection, ConnectionEvent, ConnectionId};
pub use event_loop::{EventLoop, EventLoopHandle};
pub use reactor::{Output, Reactor};
pub use session::{Session, SessionEvent, SessionId};
