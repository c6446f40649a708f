use crate::transport::{
    sasl::SaslConfig,
    tls::{PeerVerifyMode, TlsConfig},
    Transport,
};

/// Configures TLS and SASL on a freshly bound transport before any bytes flow
///
/// The negotiator has no failure path of its own. A rejected handshake surfaces later as a
/// transport error on the connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransportNegotiator;

impl TransportNegotiator {
    /// Selects TLS client mode with the given peer verification and restricts SASL to
    /// ANONYMOUS
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, transport)))]
    pub fn configure(
        &self,
        transport: &mut Transport,
        mode: PeerVerifyMode,
        server_name: Option<&str>,
    ) {
        if let PeerVerifyMode::VerifyPeerName = mode {
            #[cfg(feature = "tracing")]
            tracing::debug!("peer name verification is left to the TLS connector");
            #[cfg(feature = "log")]
            log::debug!("peer name verification is left to the TLS connector");
        }

        transport.set_tls(TlsConfig::client(mode, server_name.map(Into::into)));
        transport.set_sasl(SaslConfig::anonymous());
    }
}
