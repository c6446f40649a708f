//! Implements errors associated with the connection configuration

/// Error building a [`ConnectionConfig`](super::ConnectionConfig)
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// Error parsing the url
    #[error(transparent)]
    UrlError(#[from] url::ParseError),

    /// Scheme is invalid or not found
    #[error(r#"Invalid scheme. Only "amqps" is supported."#)]
    InvalidScheme,

    /// Domain is invalid or not found
    #[error("Invalid domain")]
    InvalidDomain,

    /// Neither a hostname nor a url was supplied
    #[error("Hostname is not found")]
    HostnameNotFound,

    /// The session open timeout must be longer than zero
    #[error("Session open timeout must be non-zero")]
    ZeroTimeout,

    /// The session open timeout is longer than [`MAX_SESSION_OPEN_TIMEOUT`](crate::constants::MAX_SESSION_OPEN_TIMEOUT)
    #[error("Session open timeout is out of range")]
    TimeoutOutOfRange,
}
