//! Upstream HTTP transport.
//!
//! One pooled client is built at startup for the resolved target and shared
//! by every request. Certificate verification is decided here, once: an
//! `https+insecure` target gets a verifier that accepts any certificate.

use std::sync::Arc;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore};
use thiserror::Error;

use super::target::{ResolvedTarget, Scheme};

/// Client type used to reach the upstream.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to configure TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("failed to load native root certificates: {0}")]
    NativeRoots(#[from] std::io::Error),
}

/// Crypto provider shared by the upstream client and the listener.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// The process-wide upstream client and the trust decision it was built with.
#[derive(Clone)]
pub struct UpstreamTransport {
    client: UpstreamClient,
    insecure_skip_verify: bool,
}

impl UpstreamTransport {
    /// Build the transport for `target`.
    ///
    /// Native roots are only loaded when the upstream speaks verified HTTPS.
    pub fn for_target(target: &ResolvedTarget) -> Result<Self, TransportError> {
        let provider = crypto_provider();

        let mut http = HttpConnector::new();
        http.enforce_http(false);

        let builder = HttpsConnectorBuilder::new();
        let connector = match target.scheme {
            Scheme::HttpsInsecure => {
                tracing::warn!(
                    upstream = %target,
                    "TLS certificate verification DISABLED for upstream"
                );
                let config = rustls::ClientConfig::builder_with_provider(provider.clone())
                    .with_safe_default_protocol_versions()?
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(NoVerifier { provider }))
                    .with_no_client_auth();
                builder.with_tls_config(config)
            }
            Scheme::Https => builder.with_provider_and_native_roots(provider)?,
            Scheme::Http => {
                let config = rustls::ClientConfig::builder_with_provider(provider)
                    .with_safe_default_protocol_versions()?
                    .with_root_certificates(RootCertStore::empty())
                    .with_no_client_auth();
                builder.with_tls_config(config)
            }
        }
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            insecure_skip_verify: target.insecure_skip_verify(),
        })
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// True when upstream certificates are accepted without verification.
    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }
}

/// Certificate verifier for `https+insecure` upstreams.
///
/// Chain and hostname checks are skipped; handshake signatures are still
/// checked so the session keys belong to whoever presented the certificate.
#[derive(Debug)]
struct NoVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
