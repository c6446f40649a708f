use std::fmt::Display;

use serde::{de, ser};

use crate::primitives::Symbol;

use super::{AmqpError, ConnectionError, SessionError};

/// The symbolic code of an AMQP error
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ErrorCondition {
    AmqpError(AmqpError),
    ConnectionError(ConnectionError),
    SessionError(SessionError),
    Custom(Symbol),
}

impl ErrorCondition {
    /// The symbolic representation of the condition
    pub fn symbol(&self) -> Symbol {
        match self {
            Self::AmqpError(err) => Symbol::from(err),
            Self::ConnectionError(err) => Symbol::from(err),
            Self::SessionError(err) => Symbol::from(err),
            Self::Custom(sym) => sym.clone(),
        }
    }

    /// A custom condition carrying an empty symbol
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Custom(sym) if sym.is_empty())
    }
}

impl From<Symbol> for ErrorCondition {
    fn from(value: Symbol) -> Self {
        let v = value.as_str();
        if let Ok(val) = AmqpError::try_from(v) {
            return ErrorCondition::AmqpError(val);
        }
        if let Ok(val) = ConnectionError::try_from(v) {
            return ErrorCondition::ConnectionError(val);
        }
        if let Ok(val) = SessionError::try_from(v) {
            return ErrorCondition::SessionError(val);
        }
        ErrorCondition::Custom(value)
    }
}

impl From<&str> for ErrorCondition {
    fn from(value: &str) -> Self {
        Self::from(Symbol::from(value))
    }
}

impl Display for ErrorCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.symbol(), f)
    }
}

impl ser::Serialize for ErrorCondition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::AmqpError(err) => err.serialize(serializer),
            Self::ConnectionError(err) => err.serialize(serializer),
            Self::SessionError(err) => err.serialize(serializer),
            Self::Custom(err) => err.serialize(serializer),
        }
    }
}

impl<'de> de::Deserialize<'de> for ErrorCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Symbol::deserialize(deserializer)?;
        Ok(ErrorCondition::from(value))
    }
}

#[cfg(test)]
mod tests {
    use crate::{definitions::AmqpError, primitives::Symbol};

    use super::ErrorCondition;

    #[test]
    fn test_condition_from_symbol() {
        let cond = ErrorCondition::from("amqp:unauthorized-access");
        assert_eq!(cond, ErrorCondition::AmqpError(AmqpError::UnauthorizedAccess));

        let cond = ErrorCondition::from("com.microsoft:server-busy");
        assert_eq!(
            cond,
            ErrorCondition::Custom(Symbol::from("com.microsoft:server-busy"))
        );
        assert_eq!(cond.to_string(), "com.microsoft:server-busy");
    }

    #[test]
    fn test_deserialize_error_condition() {
        let cond: ErrorCondition = serde_json::from_str(r#""amqp:connection:forced""#).unwrap();
        assert_eq!(
            cond,
            ErrorCondition::ConnectionError(crate::definitions::ConnectionError::ConnectionForced)
        );
        assert!(!cond.is_empty());
        assert!(ErrorCondition::from("").is_empty());
    }
}
