//! Certificate and acknowledgment file bodies.
//!
//! These are plain JSON documents that embed one serialized event alongside
//! auxiliary metadata, the shape exchanged as files between parties rather
//! than streamed. The embedded event is carried verbatim as text, so it must
//! be JSON-kind; its digest and any detached signatures are checked on
//! `verify`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cesr_kernel_core::stream::{unpack_as, ItemKind, StreamItem};
use cesr_kernel_core::{Event, PublicKey, Signature};

use crate::error::{KernelError, Result};

/// A certificate file body: an issuer's event plus the certified content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Digest of the embedded event, qb64.
    pub event_said: String,
    /// Identifier of the issuer.
    pub issuer_aid: String,
    /// The certified content, opaque to the kernel.
    pub certificate: Value,
    /// The embedded event, serialized exactly as streamed.
    pub signed_event_raw: String,
    /// Detached signatures over the embedded event bytes, qb64.
    pub signatures: Vec<String>,
}

impl Certificate {
    /// Build a certificate body around an event.
    pub fn new(
        event: &Event,
        issuer_aid: &str,
        certificate: Value,
        signatures: Vec<Signature>,
    ) -> Result<Self> {
        let event_said = event
            .said()
            .ok_or_else(|| KernelError::IntegrityFailure("event has no digest".to_string()))?;
        let signed_event_raw = String::from_utf8(event.sad().raw().to_vec()).map_err(|_| {
            KernelError::IntegrityFailure("embedded event must be JSON-kind".to_string())
        })?;
        Ok(Self {
            event_said: event_said.qb64(),
            issuer_aid: issuer_aid.to_string(),
            certificate,
            signed_event_raw,
            signatures: signatures.iter().map(Signature::qb64).collect(),
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the embedded event: it must decode as an event, satisfy its own
    /// digest, and match `event_said`. With a key, every detached signature
    /// must also verify over the embedded bytes.
    pub fn verify(&self, key: Option<&PublicKey>) -> Result<Event> {
        verify_embedded(
            &self.signed_event_raw,
            &self.event_said,
            &self.signatures,
            key,
        )
    }
}

/// An acknowledgment file body: a counterparty's event answering a
/// certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    /// Digest of the embedded event, qb64.
    pub event_said: String,
    /// Digest of the certificate's event being acknowledged, qb64.
    pub certificate_said: String,
    /// Identifier of the acknowledging party.
    pub acker_aid: String,
    /// The embedded event, serialized exactly as streamed.
    pub signed_event_raw: String,
    /// Detached signatures over the embedded event bytes, qb64.
    pub signatures: Vec<String>,
}

impl Acknowledgment {
    /// Build an acknowledgment body around an event.
    pub fn new(
        event: &Event,
        certificate: &Certificate,
        acker_aid: &str,
        signatures: Vec<Signature>,
    ) -> Result<Self> {
        let event_said = event
            .said()
            .ok_or_else(|| KernelError::IntegrityFailure("event has no digest".to_string()))?;
        let signed_event_raw = String::from_utf8(event.sad().raw().to_vec()).map_err(|_| {
            KernelError::IntegrityFailure("embedded event must be JSON-kind".to_string())
        })?;
        Ok(Self {
            event_said: event_said.qb64(),
            certificate_said: certificate.event_said.clone(),
            acker_aid: acker_aid.to_string(),
            signed_event_raw,
            signatures: signatures.iter().map(Signature::qb64).collect(),
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the embedded event, as [`Certificate::verify`] does.
    pub fn verify(&self, key: Option<&PublicKey>) -> Result<Event> {
        verify_embedded(
            &self.signed_event_raw,
            &self.event_said,
            &self.signatures,
            key,
        )
    }
}

fn verify_embedded(
    raw: &str,
    declared_said: &str,
    signatures: &[String],
    key: Option<&PublicKey>,
) -> Result<Event> {
    let (item, consumed) = unpack_as(raw.as_bytes(), ItemKind::Message)?;
    if consumed != raw.len() {
        return Err(KernelError::IntegrityFailure(format!(
            "{} trailing bytes after embedded event",
            raw.len() - consumed
        )));
    }
    let StreamItem::Event(event) = item else {
        return Err(KernelError::EmbeddedNotEvent);
    };

    if !event.sad().verify() {
        return Err(KernelError::IntegrityFailure(
            "embedded event fails its own digest".to_string(),
        ));
    }
    let computed = event
        .said()
        .ok_or_else(|| KernelError::IntegrityFailure("event has no digest".to_string()))?;
    if computed.qb64() != declared_said {
        return Err(KernelError::SaidMismatch {
            declared: declared_said.to_string(),
            computed: computed.qb64(),
        });
    }

    if let Some(key) = key {
        for text in signatures {
            let signature = Signature::from_qb64(text).map_err(KernelError::Core)?;
            if !event.sad().verify_signature(key, &signature) {
                return Err(KernelError::IntegrityFailure(format!(
                    "signature {} does not verify",
                    &text[..12.min(text.len())]
                )));
            }
        }
    }
    tracing::debug!(said = declared_said, "verified embedded event");
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesr_kernel_core::{dispatch, Keypair, Message, Sad};
    use serde_json::json;

    fn make_event(keypair: &Keypair) -> Event {
        let Value::Object(map) = json!({
            "v": "KERI10JSON000000_",
            "t": "icp",
            "d": "",
            "i": keypair.public_key().qb64(),
            "s": "0",
            "k": [keypair.public_key().qb64()],
        }) else {
            unreachable!()
        };
        let Message::Event(event) = dispatch(Sad::from_map(map).unwrap()) else {
            unreachable!()
        };
        event
    }

    #[test]
    fn test_certificate_roundtrip_and_verify() {
        let keypair = Keypair::from_seed(&[0x55; 32]);
        let event = make_event(&keypair);
        let signature = event.sad().sign(&keypair);

        let cert = Certificate::new(
            &event,
            &keypair.public_key().qb64(),
            json!({"kind": "membership", "tier": "gold"}),
            vec![signature],
        )
        .unwrap();

        let text = cert.to_json().unwrap();
        let back = Certificate::from_json(&text).unwrap();
        assert_eq!(back, cert);

        let verified = back.verify(Some(&keypair.public_key())).unwrap();
        assert_eq!(verified.said(), event.said());
    }

    #[test]
    fn test_certificate_verify_without_key_skips_signatures() {
        let keypair = Keypair::from_seed(&[0x55; 32]);
        let event = make_event(&keypair);
        let cert = Certificate::new(
            &event,
            &keypair.public_key().qb64(),
            json!({}),
            vec![],
        )
        .unwrap();
        assert!(cert.verify(None).is_ok());
    }

    #[test]
    fn test_tampered_embedded_event_is_rejected() {
        let keypair = Keypair::from_seed(&[0x55; 32]);
        let event = make_event(&keypair);
        let mut cert =
            Certificate::new(&event, &keypair.public_key().qb64(), json!({}), vec![]).unwrap();
        cert.signed_event_raw = cert.signed_event_raw.replace("\"s\":\"0\"", "\"s\":\"1\"");
        assert!(matches!(
            cert.verify(None),
            Err(KernelError::IntegrityFailure(_))
        ));
    }

    #[test]
    fn test_declared_said_mismatch() {
        let keypair = Keypair::from_seed(&[0x55; 32]);
        let event = make_event(&keypair);
        let mut cert =
            Certificate::new(&event, &keypair.public_key().qb64(), json!({}), vec![]).unwrap();
        cert.event_said = format!("E{}", "A".repeat(43));
        assert!(matches!(
            cert.verify(None),
            Err(KernelError::SaidMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_key_fails_signature_check() {
        let keypair = Keypair::from_seed(&[0x55; 32]);
        let event = make_event(&keypair);
        let signature = event.sad().sign(&keypair);
        let cert = Certificate::new(
            &event,
            &keypair.public_key().qb64(),
            json!({}),
            vec![signature],
        )
        .unwrap();

        let other = Keypair::from_seed(&[0x66; 32]);
        assert!(matches!(
            cert.verify(Some(&other.public_key())),
            Err(KernelError::IntegrityFailure(_))
        ));
    }

    #[test]
    fn test_acknowledgment_links_certificate() {
        let issuer = Keypair::from_seed(&[0x55; 32]);
        let acker = Keypair::from_seed(&[0x77; 32]);
        let cert_event = make_event(&issuer);
        let cert =
            Certificate::new(&cert_event, &issuer.public_key().qb64(), json!({}), vec![]).unwrap();

        let ack_event = make_event(&acker);
        let signature = ack_event.sad().sign(&acker);
        let ack = Acknowledgment::new(
            &ack_event,
            &cert,
            &acker.public_key().qb64(),
            vec![signature],
        )
        .unwrap();
        assert_eq!(ack.certificate_said, cert.event_said);

        let text = ack.to_json().unwrap();
        let back = Acknowledgment::from_json(&text).unwrap();
        assert!(back.verify(Some(&acker.public_key())).is_ok());
    }
}
