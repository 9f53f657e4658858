use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePublicKey, ObjectIdentifier, PrivateKeyInfo, SecretDocument};
use rsa::{RsaPrivateKey, RsaPublicKey};
use x509_cert::Certificate;
use x509_cert::der::{Decode, DecodePem, Encode};

use crate::core::CpeError;

/// `rsaEncryption` (PKCS#1).
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Decoded signer material: the RSA private key and the DER certificate
/// embedded in every signature.
///
/// Immutable once built. Share it across threads by reference.
#[derive(Clone)]
pub struct SigningCredentials {
    key: RsaPrivateKey,
    certificate_der: Vec<u8>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("certificate_der", &format!("{} bytes", self.certificate_der.len()))
            .finish_non_exhaustive()
    }
}

impl SigningCredentials {
    /// Decode a PEM certificate and a PKCS#1 or PKCS#8 PEM private key.
    ///
    /// The certificate's public key must belong to the private key.
    pub fn from_pem(certificate_pem: &str, key_pem: &str) -> Result<Self, CpeError> {
        let key = decode_private_key(key_pem)?;
        let certificate = decode_certificate(certificate_pem)?;
        let certificate_der = certificate
            .to_der()
            .map_err(|e| CpeError::Certificate(format!("DER encoding: {e}")))?;

        if certificate_public_key(&certificate)? != key.to_public_key() {
            return Err(CpeError::Certificate(
                "certificate public key does not match the private key".into(),
            ));
        }

        Ok(Self {
            key,
            certificate_der,
        })
    }

    /// Decode base64-of-PEM inputs, as delivered by the transport layer.
    pub fn from_base64_pem(certificate_b64: &str, key_b64: &str) -> Result<Self, CpeError> {
        let certificate_pem = decode_base64_text(certificate_b64)
            .map_err(|e| CpeError::Certificate(format!("base64 certificate: {e}")))?;
        let key_pem = decode_base64_text(key_b64)
            .map_err(|e| CpeError::UnsupportedKeyFormat(format!("base64 key: {e}")))?;
        Self::from_pem(&certificate_pem, &key_pem)
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }

    /// Raw DER of the signer certificate.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }
}

fn decode_base64_text(input: &str) -> Result<String, String> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Decode an RSA private key from PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8
/// (`PRIVATE KEY`) PEM.
pub fn decode_private_key(pem: &str) -> Result<RsaPrivateKey, CpeError> {
    let pem = pem.trim();
    if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
        return Ok(key);
    }

    let (label, document) = SecretDocument::from_pem(pem)
        .map_err(|e| CpeError::UnsupportedKeyFormat(format!("neither PKCS#1 nor PKCS#8 PEM: {e}")))?;
    if label != "PRIVATE KEY" {
        return Err(CpeError::UnsupportedKeyFormat(format!(
            "unexpected PEM label {label:?}"
        )));
    }

    let info: PrivateKeyInfo<'_> = document
        .decode_msg()
        .map_err(|e| CpeError::UnsupportedKeyFormat(format!("PKCS#8 structure: {e}")))?;
    if info.algorithm.oid != RSA_ENCRYPTION {
        return Err(CpeError::UnsupportedKeyAlgorithm(format!(
            "expected RSA, got algorithm {}",
            info.algorithm.oid
        )));
    }

    RsaPrivateKey::try_from(info)
        .map_err(|e| CpeError::UnsupportedKeyFormat(format!("PKCS#8 RSA key: {e}")))
}

pub fn decode_certificate(pem: &str) -> Result<Certificate, CpeError> {
    Certificate::from_pem(pem.trim().as_bytes())
        .map_err(|e| CpeError::Certificate(format!("PEM certificate: {e}")))
}

pub fn decode_certificate_der(der: &[u8]) -> Result<Certificate, CpeError> {
    Certificate::from_der(der).map_err(|e| CpeError::Certificate(format!("DER certificate: {e}")))
}

/// RSA public key from a certificate's subject public key info.
pub fn certificate_public_key(certificate: &Certificate) -> Result<RsaPublicKey, CpeError> {
    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| CpeError::Certificate(format!("public key info: {e}")))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| CpeError::Certificate(format!("certificate key is not RSA: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT: &str = include_str!("../../tests/fixtures/cert.pem");
    const PKCS1: &str = include_str!("../../tests/fixtures/rsa_pkcs1.pem");
    const PKCS8: &str = include_str!("../../tests/fixtures/rsa_pkcs8.pem");
    const EC: &str = include_str!("../../tests/fixtures/ec_pkcs8.pem");

    #[test]
    fn pkcs1_and_pkcs8_decode_to_same_key() {
        let a = decode_private_key(PKCS1).unwrap();
        let b = decode_private_key(PKCS8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ec_key_is_unsupported_algorithm() {
        let err = decode_private_key(EC).unwrap_err();
        assert!(matches!(err, CpeError::UnsupportedKeyAlgorithm(_)), "{err}");
    }

    #[test]
    fn garbage_is_unsupported_format() {
        let err = decode_private_key("not a key").unwrap_err();
        assert!(matches!(err, CpeError::UnsupportedKeyFormat(_)));

        let err = decode_private_key(CERT).unwrap_err();
        assert!(matches!(err, CpeError::UnsupportedKeyFormat(_)));
    }

    #[test]
    fn credentials_from_pem() {
        let creds = SigningCredentials::from_pem(CERT, PKCS8).unwrap();
        assert!(!creds.certificate_der().is_empty());
        let cert = decode_certificate_der(creds.certificate_der()).unwrap();
        assert_eq!(certificate_public_key(&cert).unwrap(), creds.public_key());
    }

    #[test]
    fn credentials_from_base64_pem() {
        let creds = SigningCredentials::from_base64_pem(
            &STANDARD.encode(CERT),
            &STANDARD.encode(PKCS1),
        )
        .unwrap();
        assert_eq!(
            creds.certificate_der(),
            SigningCredentials::from_pem(CERT, PKCS1).unwrap().certificate_der()
        );
    }

    #[test]
    fn bad_certificate() {
        let err = SigningCredentials::from_pem("-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----", PKCS1)
            .unwrap_err();
        assert!(matches!(err, CpeError::Certificate(_)));
    }
}
