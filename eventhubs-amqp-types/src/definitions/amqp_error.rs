use std::{
    convert::TryFrom,
    fmt::{Debug, Display},
};

use serde::{de, ser};

use crate::primitives::Symbol;

use super::ErrorCondition;

/// Shared error conditions
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AmqpError {
    InternalError,
    NotFound,
    UnauthorizedAccess,
    DecodeError,
    ResourceLimitExceeded,
    NotAllowed,
    InvalidField,
    NotImplemented,
    ResourceLocked,
    PreconditionFailed,
    ResourceDeleted,
    IllegalState,
    FrameSizeTooSmall,
}

impl Display for AmqpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self, f)
    }
}

impl std::error::Error for AmqpError {}

impl From<AmqpError> for ErrorCondition {
    fn from(err: AmqpError) -> Self {
        ErrorCondition::AmqpError(err)
    }
}

impl From<&AmqpError> for Symbol {
    fn from(value: &AmqpError) -> Self {
        let s = match value {
            AmqpError::InternalError => "amqp:internal-error",
            AmqpError::NotFound => "amqp:not-found",
            AmqpError::UnauthorizedAccess => "amqp:unauthorized-access",
            AmqpError::DecodeError => "amqp:decode-error",
            AmqpError::ResourceLimitExceeded => "amqp:resource-limit-exceeded",
            AmqpError::NotAllowed => "amqp:not-allowed",
            AmqpError::InvalidField => "amqp:invalid-field",
            AmqpError::NotImplemented => "amqp:not-implemented",
            AmqpError::ResourceLocked => "amqp:resource-locked",
            AmqpError::PreconditionFailed => "amqp:precondition-failed",
            AmqpError::ResourceDeleted => "amqp:resource-deleted",
            AmqpError::IllegalState => "amqp:illegal-state",
            AmqpError::FrameSizeTooSmall => "amqp:frame-size-too-small",
        };
        Symbol::from(s)
    }
}

impl<'a> TryFrom<&'a str> for AmqpError {
    type Error = &'a str;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        let val = match value {
            "amqp:internal-error" => AmqpError::InternalError,
            "amqp:not-found" => AmqpError::NotFound,
            "amqp:unauthorized-access" => AmqpError::UnauthorizedAccess,
            "amqp:decode-error" => AmqpError::DecodeError,
            "amqp:resource-limit-exceeded" => AmqpError::ResourceLimitExceeded,
            "amqp:not-allowed" => AmqpError::NotAllowed,
            "amqp:invalid-field" => AmqpError::InvalidField,
            "amqp:not-implemented" => AmqpError::NotImplemented,
            "amqp:resource-locked" => AmqpError::ResourceLocked,
            "amqp:precondition-failed" => AmqpError::PreconditionFailed,
            "amqp:resource-deleted" => AmqpError::ResourceDeleted,
            "amqp:illegal-state" => AmqpError::IllegalState,
            "amqp:frame-size-too-small" => AmqpError::FrameSizeTooSmall,
            _ => return Err(value),
        };
        Ok(val)
    }
}

impl ser::Serialize for AmqpError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Symbol::from(self).serialize(serializer)
    }
}

impl<'de> de::Deserialize<'de> for AmqpError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let symbol = Symbol::deserialize(deserializer)?;
        AmqpError::try_from(symbol.as_str())
            .map_err(|_| de::Error::custom("Invalid symbol value for AmqpError"))
    }
}

#[cfg(test)]
mod tests {
    use super::AmqpError;

    #[test]
    fn test_serialize_and_deserialize_amqp_error() {
        let val = AmqpError::UnauthorizedAccess;
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#""amqp:unauthorized-access""#);
        let val2: AmqpError = serde_json::from_str(&json).unwrap();
        assert_eq!(val, val2);
    }
}
