use std::{
    convert::TryFrom,
    fmt::{Debug, Display},
};

use serde::{de, ser};

use crate::primitives::Symbol;

use super::ErrorCondition;

/// Symbols used to indicate connection error conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// An operator intervened to close the connection for some reason
    ConnectionForced,

    /// A valid frame header cannot be formed from the incoming byte stream
    FramingError,

    /// The container is no longer available on the current connection
    Redirect,
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self, f)
    }
}

impl std::error::Error for ConnectionError {}

impl From<ConnectionError> for ErrorCondition {
    fn from(err: ConnectionError) -> Self {
        ErrorCondition::ConnectionError(err)
    }
}

impl From<&ConnectionError> for Symbol {
    fn from(value: &ConnectionError) -> Self {
        let val = match value {
            ConnectionError::ConnectionForced => "amqp:connection:forced",
            ConnectionError::FramingError => "amqp:connection:framing-error",
            ConnectionError::Redirect => "amqp:connection:redirect",
        };
        Symbol::from(val)
    }
}

impl<'a> TryFrom<&'a str> for ConnectionError {
    type Error = &'a str;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        let val = match value {
            "amqp:connection:forced" => ConnectionError::ConnectionForced,
            "amqp:connection:framing-error" => ConnectionError::FramingError,
            "amqp:connection:redirect" => ConnectionError::Redirect,
            _ => return Err(value),
        };
        Ok(val)
    }
}

impl ser::Serialize for ConnectionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Symbol::from(self).serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for ConnectionError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let symbol = Symbol::deserialize(deserializer)?;
        ConnectionError::try_from(symbol.as_str())
            .map_err(|_| de::Error::custom("Invalid symbol value for ConnectionError"))
    }
}
