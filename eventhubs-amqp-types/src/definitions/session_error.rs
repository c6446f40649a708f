use std::{
    convert::TryFrom,
    fmt::{Debug, Display},
};

use serde::{de, ser};

use crate::primitives::Symbol;

use super::ErrorCondition;

/// Symbols used to indicate session error conditions
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SessionError {
    WindowViolation,
    ErrantLink,
    HandleInUse,
    UnattachedHandle,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self, f)
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for ErrorCondition {
    fn from(err: SessionError) -> Self {
        ErrorCondition::SessionError(err)
    }
}

impl From<&SessionError> for Symbol {
    fn from(value: &SessionError) -> Self {
        let val = match value {
            SessionError::WindowViolation => "amqp:session:window-violation",
            SessionError::ErrantLink => "amqp:session:errant-link",
            SessionError::HandleInUse => "amqp:session:handle-in-use",
            SessionError::UnattachedHandle => "amqp:session:unattached-handle",
        };
        Symbol::from(val)
    }
}

impl<'a> TryFrom<&'a str> for SessionError {
    type Error = &'a str;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        let val = match value {
            "amqp:session:window-violation" => SessionError::WindowViolation,
            "amqp:session:errant-link" => SessionError::ErrantLink,
            "amqp:session:handle-in-use" => SessionError::HandleInUse,
            "amqp:session:unattached-handle" => SessionError::UnattachedHandle,
            _ => return Err(value),
        };
        Ok(val)
    }
}

impl ser::Serialize for SessionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Symbol::from(self).serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for SessionError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let symbol = Symbol::deserialize(deserializer)?;
        SessionError::try_from(symbol.as_str())
            .map_err(|_| de::Error::custom("Invalid symbol value for SessionError"))
    }
}
