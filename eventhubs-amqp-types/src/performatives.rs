//! The lifecycle performatives exchanged while opening and closing connections and sessions
//!
//! Only the fields inspected by the connection core are modelled. Encoding onto the wire is
//! left to the framing layer.

use serde::{Deserialize, Serialize};

use crate::definitions::{Error, Fields, Milliseconds, TransferNumber};

/// 2.7.1 Open
///
/// Negotiate connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Open {
    /// The id of the source container
    pub container_id: String,

    /// The name of the target host
    pub hostname: Option<String>,

    /// Idle time-out
    pub idle_time_out: Option<Milliseconds>,

    /// Connection properties
    pub properties: Option<Fields>,
}

/// 2.7.2 Begin
///
/// Begin a session on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Begin {
    /// The remote channel for this session
    ///
    /// If a session is locally initiated, the remote-channel MUST NOT be set.
    pub remote_channel: Option<u16>,

    /// The transfer-id of the first transfer id the sender will send
    pub next_outgoing_id: TransferNumber,

    /// The initial incoming-window of the sender
    pub incoming_window: u32,

    /// The initial outgoing-window of the sender
    pub outgoing_window: u32,
}

/// 2.7.8 End
///
/// End the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct End {
    /// Error causing the end
    pub error: Option<Error>,
}

/// 2.7.9 Close
///
/// Signal a connection close
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    /// Error causing the close
    pub error: Option<Error>,
}

/// Any lifecycle performative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Performative {
    Open(Open),
    Begin(Begin),
    End(End),
    Close(Close),
}
