use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::events::Event;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};

use super::embed;
use super::keys::{certificate_public_key, decode_certificate_der};
use crate::core::CpeError;
use crate::ubl::EXTENSION_CONTENT;

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    /// `Id` of the `ds:Signature` element.
    pub id: String,
    /// SHA-256 of the document in placeholder form.
    pub digest: Vec<u8>,
    /// Signer certificate subject, RFC 4514 form.
    pub subject: String,
    pub certificate_der: Vec<u8>,
}

#[derive(Default)]
struct EmbeddedValues {
    id: Option<String>,
    digest_value: Option<String>,
    signature_value: Option<String>,
    certificate: Option<String>,
}

/// Verify the enveloped signature of a signed document.
///
/// The signature block is stripped back to its placeholder, the digest is
/// recomputed over the result and compared with `ds:DigestValue`, then
/// `ds:SignatureValue` is checked with the public key of the embedded
/// certificate.
pub fn verify_signed_xml(xml: &str) -> Result<VerifiedSignature, CpeError> {
    let values = read_signature(xml)?;
    let missing = |name: &str| CpeError::VerificationFailed(format!("missing {name}"));

    let digest_value = values.digest_value.ok_or_else(|| missing("ds:DigestValue"))?;
    let signature_value = values.signature_value.ok_or_else(|| missing("ds:SignatureValue"))?;
    let certificate = values.certificate.ok_or_else(|| missing("ds:X509Certificate"))?;

    let unsigned = embed::strip(xml)?;
    let digest = Sha256::digest(unsigned.as_bytes()).to_vec();

    let embedded_digest = decode(&digest_value, "ds:DigestValue")?;
    if embedded_digest != digest {
        return Err(CpeError::VerificationFailed(
            "digest does not match document content".into(),
        ));
    }

    let certificate_der = decode(&certificate, "ds:X509Certificate")?;
    let certificate = decode_certificate_der(&certificate_der)?;
    let public_key = certificate_public_key(&certificate)?;

    let signature = decode(&signature_value, "ds:SignatureValue")?;
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .map_err(|e| CpeError::VerificationFailed(format!("signature: {e}")))?;

    Ok(VerifiedSignature {
        id: values.id.unwrap_or_default(),
        digest,
        subject: certificate.tbs_certificate.subject.to_string(),
        certificate_der,
    })
}

fn decode(value: &str, field: &str) -> Result<Vec<u8>, CpeError> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| CpeError::VerificationFailed(format!("{field} is not base64: {e}")))
}

fn read_signature(xml: &str) -> Result<EmbeddedValues, CpeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut values = EmbeddedValues::default();
    let mut current = String::new();
    let mut in_container = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if current == EXTENSION_CONTENT {
                    in_container = true;
                } else if !in_container {
                    current.clear();
                } else if current == "ds:Signature" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"Id" {
                            values.id = Some(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                let slot = match current.as_str() {
                    "ds:DigestValue" => &mut values.digest_value,
                    "ds:SignatureValue" => &mut values.signature_value,
                    "ds:X509Certificate" => &mut values.certificate,
                    _ => continue,
                };
                slot.get_or_insert(text);
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == EXTENSION_CONTENT.as_bytes() {
                    in_container = false;
                }
                current.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CpeError::VerificationFailed(format!("XML parse error: {e}")));
            }
            _ => {}
        }
    }

    Ok(values)
}
