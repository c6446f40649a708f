//! Types defined in AMQP 1.0 specification Part 2.8: Definitions

use std::collections::BTreeMap;

use crate::primitives::Symbol;

/// 2.8.6 Milliseconds
pub type Milliseconds = u32;

/// 2.8.9 Transfer Number
pub type TransferNumber = u32;

/// 2.8.13 Fields
///
/// Only string valued entries are exchanged by this crate
pub type Fields = BTreeMap<Symbol, String>;

/// 2.8.14 Error
mod error;
pub use error::Error;

mod error_cond;
pub use error_cond::ErrorCondition;

/// 2.8.15 AMQP Error
mod amqp_error;
pub use amqp_error::AmqpError;

/// 2.8.16 Connection Error
mod conn_error;
pub use conn_error::ConnectionError;

/// 2.8.17 Session Error
mod session_error;
pub use session_error::SessionError;

/// the IANA assigned port number for AMQP.
pub const PORT: u16 = 5672;

/// the IANA assigned port number for secure AMQP (amqps).
///
/// Implementations listening on this port SHOULD NOT expect a protocol handshake before TLS is negotiated.
pub const SECURE_PORT: u16 = 5671;
