use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::embed;
use super::keys::SigningCredentials;
use super::{
    C14N_EXCLUSIVE, DIGEST_SHA256, SIGNATURE_RSA_SHA256, TRANSFORM_ENVELOPED,
};
use crate::core::CpeError;
use crate::ubl::{Element, SIGNATURE_ID, serialize_fragment};

/// Values carried by the embedded `ds:Signature`, base64 encoded as they
/// appear in the document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureArtifact {
    pub id: String,
    pub digest_value: String,
    pub signature_value: String,
    /// Signer certificate, raw DER.
    pub certificate: String,
}

impl SignatureArtifact {
    /// The `ds:Signature` element for this artifact.
    pub fn to_element(&self) -> Element {
        let algorithm = |name: &'static str, uri: &str| Element::new(name).attr("Algorithm", uri);

        let signed_info = Element::new("ds:SignedInfo")
            .child(algorithm("ds:CanonicalizationMethod", C14N_EXCLUSIVE))
            .child(algorithm("ds:SignatureMethod", SIGNATURE_RSA_SHA256))
            .child(
                Element::new("ds:Reference")
                    .attr("URI", "")
                    .child(
                        Element::new("ds:Transforms")
                            .child(algorithm("ds:Transform", TRANSFORM_ENVELOPED))
                            .child(algorithm("ds:Transform", C14N_EXCLUSIVE)),
                    )
                    .child(algorithm("ds:DigestMethod", DIGEST_SHA256))
                    .child(Element::text("ds:DigestValue", &self.digest_value)),
            );

        Element::new("ds:Signature")
            .attr("Id", &self.id)
            .child(signed_info)
            .child(Element::text("ds:SignatureValue", &self.signature_value))
            .child(
                Element::new("ds:KeyInfo").child(
                    Element::new("ds:X509Data")
                        .child(Element::text("ds:X509Certificate", &self.certificate)),
                ),
            )
    }
}

/// Serialized document in placeholder form, not yet digested.
#[derive(Debug, Clone)]
pub struct Unsigned {
    xml: String,
}

impl Unsigned {
    /// Accept a serialized document, bringing its signature container to
    /// placeholder form first.
    pub fn new(xml: &str) -> Result<Self, CpeError> {
        Ok(Self {
            xml: embed::normalize(xml)?,
        })
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// SHA-256 over the exact placeholder-form bytes.
    pub fn digest(self) -> Digested {
        let digest: [u8; 32] = Sha256::digest(self.xml.as_bytes()).into();
        debug!(digest = %hex::encode(digest), "document digested");
        Digested {
            xml: self.xml,
            digest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Digested {
    xml: String,
    digest: [u8; 32],
}

impl Digested {
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// RSASSA-PKCS1-v1_5 with SHA-256 over the digest.
    pub fn sign(self, credentials: &SigningCredentials) -> Result<Signed, CpeError> {
        let signature = credentials
            .private_key()
            .sign(Pkcs1v15Sign::new::<Sha256>(), &self.digest)
            .map_err(|e| CpeError::SigningFailed(e.to_string()))?;
        debug!(signature_len = signature.len(), "digest signed");

        let artifact = SignatureArtifact {
            id: SIGNATURE_ID.to_string(),
            digest_value: STANDARD.encode(self.digest),
            signature_value: STANDARD.encode(&signature),
            certificate: STANDARD.encode(credentials.certificate_der()),
        };
        Ok(Signed {
            xml: self.xml,
            artifact,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Signed {
    xml: String,
    artifact: SignatureArtifact,
}

impl Signed {
    pub fn artifact(&self) -> &SignatureArtifact {
        &self.artifact
    }

    /// Splice the signature block into the container.
    pub fn embed(self) -> Result<Embedded, CpeError> {
        let block = serialize_fragment(&self.artifact.to_element())?;
        let xml = embed::splice(&self.xml, &block)?;
        debug!(bytes = xml.len(), "signature embedded");
        Ok(Embedded {
            xml,
            artifact: self.artifact,
        })
    }
}

/// Final signed document. Never mutated after embedding.
#[derive(Debug, Clone)]
pub struct Embedded {
    xml: String,
    artifact: SignatureArtifact,
}

impl Embedded {
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn artifact(&self) -> &SignatureArtifact {
        &self.artifact
    }

    pub fn into_parts(self) -> (String, SignatureArtifact) {
        (self.xml, self.artifact)
    }
}

/// Digest, sign and embed in one step.
pub fn sign_xml(xml: &str, credentials: &SigningCredentials) -> Result<Embedded, CpeError> {
    Unsigned::new(xml)?.digest().sign(credentials)?.embed()
}
