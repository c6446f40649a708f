use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{ErrorCondition, Fields};

/// Details of an error, attached to a close or end frame
///
/// <type name="error" class="composite" source="list">
/// <descriptor name="amqp:error:list" code="0x00000000:0x0000001d"/>
/// </type>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Error {
    /// <field name="condition" type="symbol" requires="error-condition" mandatory="true"/>
    pub condition: ErrorCondition,

    /// <field name="description" type="string"/>
    pub description: Option<String>,

    /// <field name="info" type="fields"/>
    pub info: Option<Fields>,
}

impl Error {
    /// Creates a new error
    pub fn new(
        condition: impl Into<ErrorCondition>,
        description: Option<String>,
        info: Option<Fields>,
    ) -> Self {
        Self {
            condition: condition.into(),
            description,
            info,
        }
    }

    /// An error is empty if it neither names a condition nor describes anything
    pub fn is_empty(&self) -> bool {
        self.condition.is_empty() && self.description.as_deref().map_or(true, str::is_empty)
    }
}

impl<T> From<T> for Error
where
    T: Into<ErrorCondition>,
{
    fn from(condition: T) -> Self {
        Self {
            condition: condition.into(),
            description: None,
            info: None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.condition, description),
            None => write!(f, "{}", self.condition),
        }
    }
}
