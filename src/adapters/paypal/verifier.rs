//! Wallet-provider webhook signature verification.
//!
//! The provider signs a canonical message built from its transmission
//! headers plus a CRC32 of the raw request body, using the RSA key of a
//! certificate it hosts. Verification:
//!
//! 1. Extract the four transmission headers; reject if any is absent.
//! 2. CRC32 the raw body, interpreted as an unsigned integer.
//! 3. Build `transmissionId|timestamp|webhookId|crc`.
//! 4. Fetch the signing certificate from `paypal-cert-url`, through a local
//!    file cache keyed by a sanitized form of the URL. Cache writes are
//!    best-effort; a write failure never fails verification.
//! 5. Verify the RSA-SHA256 signature (base64-decoded) of the canonical
//!    message against the certificate's public key.
//!
//! A certificate fetch failure is a hard verification failure; nothing here
//! retries, the provider's redelivery does.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::domain::webhook::WebhookError;

pub const TRANSMISSION_ID_HEADER: &str = "paypal-transmission-id";
pub const TRANSMISSION_TIME_HEADER: &str = "paypal-transmission-time";
pub const CERT_URL_HEADER: &str = "paypal-cert-url";
pub const TRANSMISSION_SIG_HEADER: &str = "paypal-transmission-sig";

/// Timeout for the certificate fetch.
const CERT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Verifier for wallet-provider webhook signatures.
pub struct PaypalWebhookVerifier {
    /// The webhook id assigned by the provider dashboard; part of the
    /// signed canonical message.
    webhook_id: String,

    /// Directory for the shared certificate cache. Content-addressed by
    /// URL, so concurrent overwrites are harmless.
    cert_cache_dir: PathBuf,

    http_client: reqwest::Client,
}

impl PaypalWebhookVerifier {
    pub fn new(webhook_id: impl Into<String>, cert_cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            webhook_id: webhook_id.into(),
            cert_cache_dir: cert_cache_dir.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Verifies the webhook signature over the raw body.
    ///
    /// # Errors
    ///
    /// - `MissingHeader` - any required transmission header absent
    /// - `Certificate` - certificate fetch or parse failed
    /// - `ParseError` - signature is not valid base64
    /// - `InvalidSignature` - RSA verification failed
    pub async fn verify(&self, payload: &[u8], headers: &HeaderMap) -> Result<(), WebhookError> {
        let transmission_id = required_header(headers, TRANSMISSION_ID_HEADER)?;
        let transmission_time = required_header(headers, TRANSMISSION_TIME_HEADER)?;
        let cert_url = required_header(headers, CERT_URL_HEADER)?;
        let signature_b64 = required_header(headers, TRANSMISSION_SIG_HEADER)?;

        let crc = crc32fast::hash(payload);
        let message =
            canonical_message(transmission_id, transmission_time, &self.webhook_id, crc);

        let cert_pem = self.load_certificate(cert_url).await?;
        let public_key = public_key_from_cert_pem(&cert_pem)?;

        let signature = BASE64
            .decode(signature_b64)
            .map_err(|e| WebhookError::ParseError(format!("invalid signature base64: {}", e)))?;

        verify_with_key(&public_key, message.as_bytes(), &signature)
    }

    /// Loads the signing certificate, consulting the file cache first.
    async fn load_certificate(&self, cert_url: &str) -> Result<Vec<u8>, WebhookError> {
        if !cert_url.starts_with("https://") {
            return Err(WebhookError::Certificate(format!(
                "refusing non-https certificate url: {}",
                cert_url
            )));
        }

        let cache_path = self.cert_cache_dir.join(cache_key(cert_url));
        if let Ok(cached) = tokio::fs::read(&cache_path).await {
            return Ok(cached);
        }

        tracing::debug!(url = cert_url, "fetching signing certificate");
        let response = self
            .http_client
            .get(cert_url)
            .timeout(CERT_FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| WebhookError::Certificate(format!("certificate fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WebhookError::Certificate(format!(
                "certificate fetch returned {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WebhookError::Certificate(format!("certificate read failed: {}", e)))?
            .to_vec();

        if let Err(e) = self.write_cache(&cache_path, &body).await {
            tracing::warn!(path = %cache_path.display(), error = %e, "certificate cache write failed");
        }

        Ok(body)
    }

    async fn write_cache(&self, path: &Path, body: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.cert_cache_dir).await?;
        tokio::fs::write(path, body).await
    }
}

fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}

/// The signed canonical message: `transmissionId|timestamp|webhookId|crc`,
/// with the CRC rendered as an unsigned decimal.
fn canonical_message(
    transmission_id: &str,
    transmission_time: &str,
    webhook_id: &str,
    crc: u32,
) -> String {
    format!(
        "{}|{}|{}|{}",
        transmission_id, transmission_time, webhook_id, crc
    )
}

/// Sanitizes a certificate URL into a cache file name.
fn cache_key(cert_url: &str) -> String {
    let sanitized: String = cert_url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.pem", sanitized)
}

/// Extracts the RSA public key from a PEM-encoded X.509 certificate.
fn public_key_from_cert_pem(pem: &[u8]) -> Result<RsaPublicKey, WebhookError> {
    let (_, parsed) = x509_parser::pem::parse_x509_pem(pem)
        .map_err(|e| WebhookError::Certificate(format!("invalid certificate pem: {}", e)))?;
    let certificate = parsed
        .parse_x509()
        .map_err(|e| WebhookError::Certificate(format!("invalid certificate: {}", e)))?;

    RsaPublicKey::from_public_key_der(certificate.public_key().raw)
        .map_err(|e| WebhookError::Certificate(format!("unsupported public key: {}", e)))
}

/// Verifies an RSA-SHA256 signature over the message.
fn verify_with_key(
    key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), WebhookError> {
    let digest = Sha256::digest(message);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .map_err(|_| WebhookError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rsa::RsaPrivateKey;

    fn full_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRANSMISSION_ID_HEADER,
            HeaderValue::from_static("69cd13f0-d67a-11e5"),
        );
        headers.insert(
            TRANSMISSION_TIME_HEADER,
            HeaderValue::from_static("2026-03-10T21:31:36Z"),
        );
        headers.insert(
            CERT_URL_HEADER,
            HeaderValue::from_static("https://api.sandbox.paypal.com/cert/cert-1"),
        );
        headers.insert(TRANSMISSION_SIG_HEADER, HeaderValue::from_static("c2ln"));
        headers
    }

    // Fail-closed header checks

    #[tokio::test]
    async fn missing_any_required_header_is_rejected() {
        let verifier = PaypalWebhookVerifier::new("WH-1", std::env::temp_dir());

        for absent in [
            TRANSMISSION_ID_HEADER,
            TRANSMISSION_TIME_HEADER,
            CERT_URL_HEADER,
            TRANSMISSION_SIG_HEADER,
        ] {
            let mut headers = full_headers();
            headers.remove(absent);

            let result = verifier.verify(b"{}", &headers).await;
            assert!(
                matches!(result, Err(WebhookError::MissingHeader(name)) if name == absent),
                "expected MissingHeader({}) for absent header",
                absent
            );
        }
    }

    // Canonical message

    #[test]
    fn canonical_message_uses_unsigned_crc() {
        // CRC32 of "123456789" is 0xCBF43926.
        let crc = crc32fast::hash(b"123456789");
        assert_eq!(crc, 0xCBF4_3926);

        let message = canonical_message("tid", "2026-03-10T21:31:36Z", "WH-9", crc);
        assert_eq!(message, "tid|2026-03-10T21:31:36Z|WH-9|3421780262");
    }

    #[test]
    fn cache_key_sanitizes_url() {
        let key = cache_key("https://api.paypal.com/cert/cert-1?x=1");
        assert_eq!(key, "https___api_paypal_com_cert_cert_1_x_1.pem");
        assert!(!key.contains('/'));
    }

    // RSA verification round-trip

    fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).expect("keygen");
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    fn sign(private: &RsaPrivateKey, message: &[u8]) -> Vec<u8> {
        let digest = Sha256::digest(message);
        private
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .expect("sign")
    }

    #[test]
    fn signature_round_trip_verifies() {
        let (private, public) = test_keypair();
        let message = canonical_message("tid", "ts", "WH-9", crc32fast::hash(b"{\"id\":1}"));
        let signature = sign(&private, message.as_bytes());

        assert!(verify_with_key(&public, message.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn flipped_signature_byte_fails() {
        let (private, public) = test_keypair();
        let message = canonical_message("tid", "ts", "WH-9", crc32fast::hash(b"{\"id\":1}"));
        let mut signature = sign(&private, message.as_bytes());
        signature[0] ^= 0x01;

        let result = verify_with_key(&public, message.as_bytes(), &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn different_body_crc_fails_verification() {
        let (private, public) = test_keypair();
        let signed =
            canonical_message("tid", "ts", "WH-9", crc32fast::hash(b"{\"amount\":100}"));
        let tampered =
            canonical_message("tid", "ts", "WH-9", crc32fast::hash(b"{\"amount\":999}"));
        let signature = sign(&private, signed.as_bytes());

        let result = verify_with_key(&public, tampered.as_bytes(), &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    // Certificate handling

    #[test]
    fn garbage_certificate_pem_is_rejected() {
        let result = public_key_from_cert_pem(b"not a certificate");
        assert!(matches!(result, Err(WebhookError::Certificate(_))));
    }

    #[tokio::test]
    async fn non_https_cert_url_is_rejected() {
        let verifier = PaypalWebhookVerifier::new("WH-1", std::env::temp_dir());
        let result = verifier
            .load_certificate("http://evil.example/cert")
            .await;
        assert!(matches!(result, Err(WebhookError::Certificate(_))));
    }

    #[tokio::test]
    async fn cached_certificate_is_served_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = PaypalWebhookVerifier::new("WH-1", dir.path());

        let url = "https://api.paypal.com/cert/cached-cert";
        let cache_path = dir.path().join(cache_key(url));
        tokio::fs::write(&cache_path, b"cached pem bytes")
            .await
            .unwrap();

        // No HTTP server behind the url: a hit proves the cache was used.
        let loaded = verifier.load_certificate(url).await.unwrap();
        assert_eq!(loaded, b"cached pem bytes");
    }
}
