//! SASL mechanism selection
//!
//! Only the ANONYMOUS mechanism is allowed. Credentials are exchanged later over the
//! AMQP claims-based-security link, which is outside of this crate.

use eventhubs_amqp_types::primitives::Symbol;

use super::NegotiationError;

/// SASL ANONYMOUS
pub const ANONYMOUS: &str = "ANONYMOUS";

/// A SASL mechanism the client is willing to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslProfile {
    /// SASL ANONYMOUS
    Anonymous,
}

impl SaslProfile {
    /// The mechanism name
    pub fn mechanism(&self) -> Symbol {
        let value = match self {
            SaslProfile::Anonymous => ANONYMOUS,
        };
        Symbol::from(value)
    }

    /// Initial response sent with the sasl-init frame
    pub fn initial_response(&self) -> Option<Vec<u8>> {
        match self {
            SaslProfile::Anonymous => None,
        }
    }
}

/// Content of the sasl-init frame chosen by [`SaslConfig::select`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslInit {
    /// Selected security mechanism
    pub mechanism: Symbol,

    /// Security response data
    pub initial_response: Option<Vec<u8>>,

    /// The name of the target host
    pub hostname: Option<String>,
}

/// The SASL mechanisms a transport may negotiate, in order of preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslConfig {
    profiles: Vec<SaslProfile>,
}

impl SaslConfig {
    /// Restricts negotiation to SASL ANONYMOUS
    pub fn anonymous() -> Self {
        Self {
            profiles: vec![SaslProfile::Anonymous],
        }
    }

    /// Mechanism names in order of preference
    pub fn mechanisms(&self) -> Vec<Symbol> {
        self.profiles.iter().map(SaslProfile::mechanism).collect()
    }

    /// Picks the first locally allowed mechanism that the server offers
    pub fn select(
        &self,
        server_mechanisms: &[Symbol],
        hostname: Option<&str>,
    ) -> Result<SaslInit, NegotiationError> {
        self.profiles
            .iter()
            .find(|profile| server_mechanisms.contains(&profile.mechanism()))
            .map(|profile| SaslInit {
                mechanism: profile.mechanism(),
                initial_response: profile.initial_response(),
                hostname: hostname.map(Into::into),
            })
            .ok_or_else(|| NegotiationError::MechanismNotSupported(server_mechanisms.to_vec()))
    }
}
