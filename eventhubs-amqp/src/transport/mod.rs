//! Per-connection byte-stream binding
//!
//! The [`Transport`] does not own a socket. It records how the IO layer has to negotiate the
//! stream (TLS first, then SASL, then AMQP) and whether the stream is still bound. Releasing
//! the OS level resources is requested through [`Output::Unbind`](crate::reactor::Output::Unbind),
//! which is emitted at most once per transport.

use eventhubs_amqp_types::definitions;

use crate::connection::ConnectionId;

mod error;
pub use error::*;

mod io_cleanup;
pub use io_cleanup::IoCleanupHandler;

mod negotiator;
pub use negotiator::TransportNegotiator;

pub mod sasl;
pub mod tls;

use sasl::SaslConfig;
use tls::TlsConfig;

/// Binding state of a [`Transport`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Not yet bound to a connection
    #[default]
    Unbound,

    /// Bound to a connection; OS resources are held
    Bound,

    /// Unbound after having been bound; OS resources are released
    Released,
}

/// A negotiation layer, in the order it runs on the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// TLS handshake
    Tls,

    /// SASL handshake
    Sasl,

    /// AMQP frames
    Amqp,
}

/// Per-connection byte-stream binding
#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
    connection: Option<ConnectionId>,
    tls: Option<TlsConfig>,
    sasl: Option<SaslConfig>,
    condition: Option<definitions::Error>,
}

impl Transport {
    /// Binding state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Whether the transport currently holds OS resources
    pub fn is_bound(&self) -> bool {
        matches!(self.state, TransportState::Bound)
    }

    /// The connection that owns this transport, if still associated
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// TLS configuration selected at bind time
    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }

    /// SASL configuration selected at bind time
    pub fn sasl(&self) -> Option<&SaslConfig> {
        self.sasl.as_ref()
    }

    /// The last error condition reported by the transport
    pub fn condition(&self) -> Option<&definitions::Error> {
        self.condition.as_ref()
    }

    /// Negotiation layers in the order they run
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers = Vec::with_capacity(3);
        if self.tls.is_some() {
            layers.push(Layer::Tls);
        }
        if self.sasl.is_some() {
            layers.push(Layer::Sasl);
        }
        layers.push(Layer::Amqp);
        layers
    }

    pub(crate) fn bind(&mut self, connection: ConnectionId) -> bool {
        match self.state {
            TransportState::Unbound => {
                self.state = TransportState::Bound;
                self.connection = Some(connection);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` only for the call that actually released the transport
    pub(crate) fn unbind(&mut self) -> bool {
        match self.state {
            TransportState::Bound => {
                self.state = TransportState::Released;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_tls(&mut self, tls: TlsConfig) {
        self.tls = Some(tls);
    }

    pub(crate) fn set_sasl(&mut self, sasl: SaslConfig) {
        self.sasl = Some(sasl);
    }

    pub(crate) fn set_condition(&mut self, condition: Option<definitions::Error>) {
        if condition.is_some() {
            self.condition = condition;
        }
    }
}
