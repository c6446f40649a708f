use eventhubs_amqp_types::{
    definitions::{self, AmqpError},
    primitives::Symbol,
};

/// Errors negotiating the security layers of a transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    /// None of the locally allowed SASL mechanisms is offered by the server
    #[error("SASL mechanism not supported. Server offered {0:?}")]
    MechanismNotSupported(Vec<Symbol>),

    /// TLS could not be set up
    #[error("TLS negotiation failed: {0}")]
    Tls(String),
}

impl From<NegotiationError> for definitions::Error {
    fn from(err: NegotiationError) -> Self {
        let description = err.to_string();
        match err {
            NegotiationError::MechanismNotSupported(_) => {
                definitions::Error::new(AmqpError::NotImplemented, Some(description), None)
            }
            NegotiationError::Tls(_) => {
                definitions::Error::new(AmqpError::IllegalState, Some(description), None)
            }
        }
    }
}
