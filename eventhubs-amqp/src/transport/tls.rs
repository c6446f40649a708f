//! TLS client configuration

/// How the identity of the peer is checked during the TLS handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeerVerifyMode {
    /// Accept any peer identity
    #[default]
    AnonymousPeer,

    /// Verify the certificate chain and that it names the target host
    VerifyPeerName,
}

/// TLS settings of a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    mode: PeerVerifyMode,
    server_name: Option<String>,
}

impl TlsConfig {
    /// TLS in client mode
    pub fn client(mode: PeerVerifyMode, server_name: Option<String>) -> Self {
        Self { mode, server_name }
    }

    /// Peer verification mode
    pub fn mode(&self) -> PeerVerifyMode {
        self.mode
    }

    /// Name used for SNI and, with [`PeerVerifyMode::VerifyPeerName`], for verification
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Builds a `rustls::ClientConfig` that enforces the peer verification mode
    #[cfg(feature = "rustls")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rustls")))]
    pub fn client_config(&self) -> librustls::ClientConfig {
        rustls_config::client_config(self.mode)
    }
}

#[cfg(feature = "rustls")]
mod rustls_config {
    use std::sync::Arc;

    use librustls::{
        client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider},
        pki_types::{CertificateDer, ServerName, UnixTime},
        ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
    };

    use super::PeerVerifyMode;

    /// Accepts any certificate chain, handshake signatures are still checked
    #[derive(Debug)]
    struct AnonymousPeer(Arc<CryptoProvider>);

    impl ServerCertVerifier for AnonymousPeer {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, librustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, librustls::Error> {
            verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, librustls::Error> {
            verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }

    pub(super) fn client_config(mode: PeerVerifyMode) -> ClientConfig {
        match mode {
            PeerVerifyMode::AnonymousPeer => {
                let provider = Arc::new(librustls::crypto::ring::default_provider());
                ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AnonymousPeer(provider)))
                    .with_no_client_auth()
            }
            PeerVerifyMode::VerifyPeerName => {
                let root_cert_store = RootCertStore {
                    roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
                };
                ClientConfig::builder()
                    .with_root_certificates(root_cert_store)
                    .with_no_client_auth()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PeerVerifyMode, TlsConfig};

    #[test]
    fn test_default_mode_is_anonymous_peer() {
        assert_eq!(PeerVerifyMode::default(), PeerVerifyMode::AnonymousPeer);
        let config = TlsConfig::client(PeerVerifyMode::default(), Some("localhost".to_string()));
        assert_eq!(config.server_name(), Some("localhost"));
    }

    #[cfg(feature = "rustls")]
    #[test]
    fn test_rustls_client_config_builds_for_both_modes() {
        let config = TlsConfig::client(PeerVerifyMode::AnonymousPeer, None);
        let _ = config.client_config();
        let config = TlsConfig::client(PeerVerifyMode::VerifyPeerName, None);
        let _ = config.client_config();
    }
}
