//! Endpoint states tracked by the connection core
//!
//! These are deliberately coarser than the frame-level states of the AMQP 1.0
//! Protocol Part 2.4.6 and 2.5.5. Header exchange and pipelining are handled by the
//! framing layer; supervisors only need to know whether each side is open.

use serde::{Deserialize, Serialize};

/// The state of one side (local or remote) of an endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointState {
    /// Nothing has been sent or received for this side yet
    #[default]
    Uninitialized,

    /// An open (or begin) has been sent or received
    Active,

    /// A close (or end) has been sent or received
    Closed,
}

/// The local state of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// The session exists, but no begin has been sent
    #[default]
    Uninitialized,

    /// A begin has been sent but the remote begin has not been received
    LocalOpenSent,

    /// Begin has been both sent and received
    Active,

    /// An end has been sent
    Closed,
}
