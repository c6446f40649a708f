use std::time::Duration;

use eventhubs_amqp_types::definitions::{Milliseconds, SECURE_PORT};
use url::Url;

use crate::{
    constants::{DEFAULT_SESSION_OPEN_TIMEOUT, MAX_SESSION_OPEN_TIMEOUT},
    transport::tls::PeerVerifyMode,
};

use super::{BuilderError, ConnectionProperties};

/// Immutable settings of one connection
///
/// # Default configuration
///
/// | Field | Default Value |
/// |-------|---------------|
/// |`container_id`| random uuid |
/// |`session_open_timeout`| [`DEFAULT_SESSION_OPEN_TIMEOUT`] |
/// |`peer_verify_mode`| [`PeerVerifyMode::AnonymousPeer`] |
/// |`idle_time_out`| `None` |
/// |`properties`| [`ConnectionProperties::default()`] |
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    container_id: String,
    hostname: Option<String>,
    port: u16,
    session_open_timeout: Duration,
    peer_verify_mode: PeerVerifyMode,
    idle_time_out: Option<Milliseconds>,
    properties: ConnectionProperties,
}

impl ConnectionConfig {
    /// Container id of the local endpoint
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Target hostname
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Target port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// How long a session may stay half-open
    pub fn session_open_timeout(&self) -> Duration {
        self.session_open_timeout
    }

    /// TLS peer verification mode
    pub fn peer_verify_mode(&self) -> PeerVerifyMode {
        self.peer_verify_mode
    }

    /// Idle time-out advertised in the local open
    pub fn idle_time_out(&self) -> Option<Milliseconds> {
        self.idle_time_out
    }

    /// Client identification properties
    pub fn properties(&self) -> &ConnectionProperties {
        &self.properties
    }
}

/// Builder for [`ConnectionConfig`]
///
/// ```rust
/// use std::time::Duration;
/// use eventhubs_amqp::connection::Connection;
///
/// let config = Connection::builder()
///     .container_id("connection-1")
///     .url("amqps://namespace.servicebus.windows.net")
///     .session_open_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(config.hostname(), Some("namespace.servicebus.windows.net"));
/// assert_eq!(config.port(), 5671);
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    container_id: Option<String>,
    hostname: Option<String>,
    url: Option<String>,
    session_open_timeout: Duration,
    peer_verify_mode: PeerVerifyMode,
    idle_time_out: Option<Milliseconds>,
    properties: ConnectionProperties,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a builder with the default configuration
    pub fn new() -> Self {
        Self {
            container_id: None,
            hostname: None,
            url: None,
            session_open_timeout: DEFAULT_SESSION_OPEN_TIMEOUT,
            peer_verify_mode: PeerVerifyMode::default(),
            idle_time_out: None,
            properties: ConnectionProperties::default(),
        }
    }

    /// Container id of the local endpoint
    pub fn container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }

    /// Target hostname. A hostname found in the url takes precedence.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Endpoint url. Only the "amqps" scheme is accepted.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// How long a session may stay half-open before it is reported as failed
    pub fn session_open_timeout(mut self, timeout: Duration) -> Self {
        self.session_open_timeout = timeout;
        self
    }

    /// TLS peer verification mode
    pub fn peer_verify_mode(mut self, mode: PeerVerifyMode) -> Self {
        self.peer_verify_mode = mode;
        self
    }

    /// Idle time-out advertised in the local open
    pub fn idle_time_out(mut self, idle_time_out: impl Into<Milliseconds>) -> Self {
        self.idle_time_out = Some(idle_time_out.into());
        self
    }

    /// Client identification properties
    pub fn properties(mut self, properties: ConnectionProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Validates the settings
    pub fn build(self) -> Result<ConnectionConfig, BuilderError> {
        if self.session_open_timeout.is_zero() {
            return Err(BuilderError::ZeroTimeout);
        }
        if self.session_open_timeout > MAX_SESSION_OPEN_TIMEOUT {
            return Err(BuilderError::TimeoutOutOfRange);
        }

        let (hostname, port) = match self.url {
            Some(url) => {
                let url = Url::parse(&url)?;
                if url.scheme() != "amqps" {
                    return Err(BuilderError::InvalidScheme);
                }
                let hostname = url.host_str().ok_or(BuilderError::InvalidDomain)?;
                (hostname.to_string(), url.port().unwrap_or(SECURE_PORT))
            }
            None => {
                let hostname = self.hostname.ok_or(BuilderError::HostnameNotFound)?;
                (hostname, SECURE_PORT)
            }
        };

        let container_id = self
            .container_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        Ok(ConnectionConfig {
            container_id,
            hostname: Some(hostname),
            port,
            session_open_timeout: self.session_open_timeout,
            peer_verify_mode: self.peer_verify_mode,
            idle_time_out: self.idle_time_out,
            properties: self.properties,
        })
    }
}
