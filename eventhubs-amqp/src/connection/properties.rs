use eventhubs_amqp_types::{definitions::Fields, primitives::Symbol};

use crate::constants::{FRAMEWORK, PLATFORM, PRODUCT, VERSION};

/// Client identification sent in the properties of the local open
///
/// The values are fixed once the connection is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProperties {
    /// Client product name
    pub product: String,

    /// Client version
    pub version: String,

    /// Host platform
    pub platform: String,

    /// Runtime framework
    pub framework: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            product: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            framework: String::from("Rust tokio"),
        }
    }
}

impl ConnectionProperties {
    /// The properties as an open's `properties` field
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(Symbol::from(PRODUCT), self.product.clone());
        fields.insert(Symbol::from(VERSION), self.version.clone());
        fields.insert(Symbol::from(PLATFORM), self.platform.clone());
        fields.insert(Symbol::from(FRAMEWORK), self.framework.clone());
        fields
    }
}
