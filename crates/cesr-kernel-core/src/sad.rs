//! Self-addressing documents.
//!
//! A [`Sad`] is a field map that carries its own digest: one field (`d`, or
//! `$id` for schema documents) holds a qb64 digest computed over the
//! document's canonical serialization with that field blanked to the empty
//! string. Documents that also carry a `v` version marker additionally embed
//! their own exact serialized size in the marker, so the digest covers the
//! size and the size covers the digest's width.
//!
//! The fill procedure runs in fixed passes. With a version field:
//! 1. blank the digest field, zero the marker size, serialize to learn the
//!    base length;
//! 2. the final length is the base length plus the width the filled digest
//!    adds (44 for JSON; 45 for CBOR, whose 44-char text needs a two-byte
//!    header where the empty string needs one);
//! 3. patch the final size into the marker and serialize again, digest still
//!    blank: these bytes are the digest input;
//! 4. derive, fill the digest field, serialize once more for the canonical
//!    raw form.
//! Without a version field only steps 3 and 4 apply.

use bytes::Bytes;
use serde_json::{Map, Value};
use std::fmt;

use crate::canonical::{deserialize_map, serialize_map};
use crate::error::{CoreError, Result};
use crate::primitive::{DigestAlg, Keypair, PublicKey, Said, Signature};
use crate::version::{self, SerialKind, Versage};

/// Digest field label for schema documents.
const SCHEMA_LABEL: &str = "$id";
/// Digest field label for everything else.
const DEFAULT_LABEL: &str = "d";

/// Largest size representable in a version marker's six hex digits.
const MAX_DECLARED_SIZE: usize = 0xff_ffff;

/// A self-addressing document: a field map plus its canonical serialization.
///
/// The two are kept consistent by construction; mutate by rebuilding through
/// [`Sad::from_map`].
#[derive(Clone)]
pub struct Sad {
    fields: Map<String, Value>,
    raw: Bytes,
    versage: Option<Versage>,
    kind: SerialKind,
    label: &'static str,
}

impl Sad {
    /// Build a document from a field map.
    ///
    /// An empty or missing digest field is computed and filled (Blake3-256
    /// here; see [`Sad::from_map_with`]); a non-empty one is kept as a claim
    /// for [`Sad::verify`] to check later. The map's `v` field, when
    /// present, selects the protocol and serialization kind and must come
    /// first; without one the document serializes as JSON and carries no
    /// version marker. A map with neither `d` nor `$id` gets an empty `d`
    /// appended.
    pub fn from_map(fields: Map<String, Value>) -> Result<Self> {
        Self::from_map_with(fields, DigestAlg::Blake3_256)
    }

    /// Like [`Sad::from_map`] with an explicit digest algorithm.
    pub fn from_map_with(mut fields: Map<String, Value>, alg: DigestAlg) -> Result<Self> {
        let label = if fields.contains_key(SCHEMA_LABEL) {
            SCHEMA_LABEL
        } else {
            DEFAULT_LABEL
        };
        let has_claim = fields
            .get(label)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !has_claim {
            fields.insert(label.to_string(), Value::String(String::new()));
        }

        let template = match fields.get("v") {
            Some(Value::String(text)) => {
                if fields.keys().next().map(String::as_str) != Some("v") {
                    return Err(CoreError::MalformedVersion(
                        "version field is not first".to_string(),
                    ));
                }
                Some(Versage::parse(text)?)
            }
            Some(_) => {
                return Err(CoreError::NonStringField {
                    field: "v".to_string(),
                })
            }
            None => None,
        };

        let (versage, kind) = match template {
            Some(t) => {
                fields.insert(
                    "v".to_string(),
                    Value::String(Versage::new(t.proto, t.kind, 0).render()),
                );
                let len0 = serialize_map(&fields, t.kind)?.len();
                // The marker is a constant 17 chars, so patching the size in
                // never changes the length. Filling a blank digest does: 44
                // chars for JSON, 45 for CBOR (the 44-char text needs a
                // two-byte header where the empty string needs one).
                let grow = if has_claim {
                    0
                } else {
                    match t.kind {
                        SerialKind::Json => Said::QB64_SIZE,
                        SerialKind::Cbor => Said::QB64_SIZE + 1,
                    }
                };
                let size = len0 + grow;
                if size > MAX_DECLARED_SIZE {
                    return Err(CoreError::MalformedVersion(format!(
                        "document size {size} exceeds marker capacity"
                    )));
                }
                let versage = Versage::new(t.proto, t.kind, size);
                fields.insert("v".to_string(), Value::String(versage.render()));
                (Some(versage), t.kind)
            }
            None => (None, SerialKind::Json),
        };

        if !has_claim {
            let digest_input = serialize_map(&fields, kind)?;
            let said = Said::derive(alg, &digest_input);
            fields.insert(label.to_string(), Value::String(said.qb64()));
        }

        let raw = serialize_map(&fields, kind)?;
        if let Some(v) = &versage {
            if raw.len() != v.size {
                return Err(CoreError::SizeMismatch {
                    declared: v.size,
                    actual: raw.len(),
                });
            }
        }
        Ok(Self {
            fields,
            raw: Bytes::from(raw),
            versage,
            kind,
            label,
        })
    }

    /// Decode a document from serialized bytes, trying strict framing first
    /// and falling back to the lenient marker sniff.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        match Self::from_raw_strict(raw) {
            Ok(sad) => Ok(sad),
            Err(strict_err) => {
                tracing::debug!(error = %strict_err, "strict decode failed, trying lenient");
                Self::from_raw_lenient(raw)
            }
        }
    }

    /// Decode a document whose version field leads and names a known
    /// protocol. Consumes exactly the declared size; trailing bytes are left
    /// for the caller.
    pub fn from_raw_strict(raw: &[u8]) -> Result<Self> {
        let versage = Versage::peel(raw)?;
        if versage.size > raw.len() {
            return Err(CoreError::ShortStream {
                need: versage.size,
                have: raw.len(),
            });
        }
        let body = &raw[..versage.size];
        let fields = deserialize_map(body, versage.kind)?;
        let label = if fields.contains_key(SCHEMA_LABEL) {
            SCHEMA_LABEL
        } else {
            DEFAULT_LABEL
        };
        Ok(Self {
            fields,
            raw: Bytes::copy_from_slice(body),
            versage: Some(versage),
            kind: versage.kind,
            label,
        })
    }

    /// Decode a document by scanning for a version-marker-shaped pattern
    /// anywhere in the head of the input. The protocol tag is not checked,
    /// so the result carries no versage; callers treat it as a generic data
    /// record.
    pub fn from_raw_lenient(raw: &[u8]) -> Result<Self> {
        let hit = version::sniff(raw)?;
        if hit.size > raw.len() {
            return Err(CoreError::ShortStream {
                need: hit.size,
                have: raw.len(),
            });
        }
        let body = &raw[..hit.size];
        let fields = deserialize_map(body, hit.kind)?;
        let label = if fields.contains_key(SCHEMA_LABEL) {
            SCHEMA_LABEL
        } else {
            DEFAULT_LABEL
        };
        Ok(Self {
            fields,
            raw: Bytes::copy_from_slice(body),
            versage: None,
            kind: hit.kind,
            label,
        })
    }

    /// Recompute the digest and compare it to the stored one.
    ///
    /// The algorithm is the one named by the stored digest's own derivation
    /// code. Returns false for a missing or malformed digest field.
    pub fn verify(&self) -> bool {
        let Some(said) = self.said() else {
            return false;
        };
        let mut blanked = self.fields.clone();
        blanked.insert(self.label.to_string(), Value::String(String::new()));
        let Ok(digest_input) = serialize_map(&blanked, self.kind) else {
            return false;
        };
        Said::derive(said.alg(), &digest_input) == said
    }

    /// The stored digest, if the digest field holds a valid token.
    pub fn said(&self) -> Option<Said> {
        let text = self.fields.get(self.label)?.as_str()?;
        Said::from_qb64(text).ok()
    }

    /// Canonical serialized bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a top-level field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a top-level string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.as_str()
    }

    pub fn versage(&self) -> Option<&Versage> {
        self.versage.as_ref()
    }

    pub fn kind(&self) -> SerialKind {
        self.kind
    }

    /// Which field carries the digest (`d` or `$id`).
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Render the field map as compact JSON, whatever the wire kind.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.fields)?)
    }

    /// Sign the canonical bytes.
    pub fn sign(&self, keypair: &Keypair) -> Signature {
        keypair.sign(&self.raw)
    }

    /// Verify a signature over the canonical bytes.
    pub fn verify_signature(&self, key: &PublicKey, signature: &Signature) -> bool {
        key.verify(&self.raw, signature)
    }
}

impl PartialEq for Sad {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Sad {}

impl fmt::Debug for Sad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sad")
            .field("said", &self.said())
            .field("kind", &self.kind)
            .field("size", &self.raw.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Protocol;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn inception_map() -> Map<String, Value> {
        fields(json!({
            "v": "KERI10JSON000000_",
            "t": "icp",
            "d": "",
            "i": "DKxy2sgzfplyr-tgwIxS19f2OchFHtLwPWD3v4oYimBx",
            "s": "0",
            "kt": "1",
            "k": ["DKxy2sgzfplyr-tgwIxS19f2OchFHtLwPWD3v4oYimBx"],
            "a": [],
        }))
    }

    #[test]
    fn test_from_map_fills_digest_and_size() {
        let sad = Sad::from_map(inception_map()).unwrap();

        let v = sad.get_str("v").unwrap();
        assert_eq!(v.len(), 17);
        let declared = usize::from_str_radix(&v[10..16], 16).unwrap();
        assert_eq!(declared, sad.size());

        let d = sad.get_str("d").unwrap();
        assert_eq!(d.len(), Said::QB64_SIZE);
        assert!(d.starts_with('E'));
        assert!(sad.verify());
    }

    #[test]
    fn test_from_map_is_deterministic() {
        let a = Sad::from_map(inception_map()).unwrap();
        let b = Sad::from_map(inception_map()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.said(), b.said());
    }

    #[test]
    fn test_supplied_digest_is_kept_as_claim() {
        // A non-empty digest is not recomputed; it rides along and fails
        // verification if it does not cover the content.
        let mut claimed = inception_map();
        claimed.insert("d".to_string(), json!(format!("E{}", "A".repeat(43))));
        let sad = Sad::from_map(claimed).unwrap();
        assert_eq!(sad.get_str("d"), Some(format!("E{}", "A".repeat(43))).as_deref());
        assert!(!sad.verify());
    }

    #[test]
    fn test_valid_claim_rebuilds_verifiably() {
        let filled = Sad::from_map(inception_map()).unwrap();
        let rebuilt = Sad::from_map(filled.data().clone()).unwrap();
        assert_eq!(rebuilt, filled);
        assert!(rebuilt.verify());
    }

    #[test]
    fn test_missing_digest_field_is_appended() {
        let sad = Sad::from_map(fields(json!({"name": "thing"}))).unwrap();
        assert_eq!(sad.label(), "d");
        assert_eq!(sad.data().keys().last().map(String::as_str), Some("d"));
        assert!(sad.verify());
    }

    #[test]
    fn test_schema_label() {
        let sad = Sad::from_map(fields(json!({"$id": "", "title": "vc"}))).unwrap();
        assert_eq!(sad.label(), "$id");
        assert!(sad.get_str("$id").unwrap().starts_with('E'));
        assert!(sad.verify());
    }

    #[test]
    fn test_no_version_field() {
        let sad = Sad::from_map(fields(json!({"d": "", "note": "bare"}))).unwrap();
        assert!(sad.versage().is_none());
        assert_eq!(sad.kind(), SerialKind::Json);
        assert!(sad.verify());
    }

    #[test]
    fn test_version_field_must_lead() {
        let mut map = Map::new();
        map.insert("t".to_string(), json!("icp"));
        map.insert("v".to_string(), json!("KERI10JSON000000_"));
        assert!(matches!(
            Sad::from_map(map),
            Err(CoreError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_sha2_algorithm() {
        let sad = Sad::from_map_with(inception_map(), DigestAlg::Sha2_256).unwrap();
        assert!(sad.get_str("d").unwrap().starts_with('I'));
        assert!(sad.verify());
    }

    #[test]
    fn test_cbor_kind() {
        let mut map = inception_map();
        map.insert("v".to_string(), json!("KERI10CBOR000000_"));
        let sad = Sad::from_map(map).unwrap();
        assert_eq!(sad.kind(), SerialKind::Cbor);
        assert_eq!(sad.versage().unwrap().size, sad.size());
        assert!(sad.verify());
    }

    #[test]
    fn test_strict_roundtrip() {
        let sad = Sad::from_map(inception_map()).unwrap();
        let back = Sad::from_raw_strict(sad.raw()).unwrap();
        assert_eq!(back, sad);
        assert_eq!(back.versage().unwrap().proto, Protocol::Keri);
        assert!(back.verify());
    }

    #[test]
    fn test_strict_ignores_trailing_bytes() {
        let sad = Sad::from_map(inception_map()).unwrap();
        let mut buf = sad.raw().to_vec();
        buf.extend_from_slice(b"next object");
        let back = Sad::from_raw_strict(&buf).unwrap();
        assert_eq!(back.size(), sad.size());
    }

    #[test]
    fn test_strict_short_stream() {
        let sad = Sad::from_map(inception_map()).unwrap();
        let err = Sad::from_raw_strict(&sad.raw()[..sad.size() - 5]).unwrap_err();
        assert!(matches!(err, CoreError::ShortStream { .. }));
    }

    #[test]
    fn test_tampered_body_fails_verify() {
        let sad = Sad::from_map(inception_map()).unwrap();
        let text = String::from_utf8(sad.raw().to_vec()).unwrap();
        let tampered = text.replace("\"s\":\"0\"", "\"s\":\"1\"");
        // Same length, so strict decode still succeeds.
        let back = Sad::from_raw_strict(tampered.as_bytes()).unwrap();
        assert!(!back.verify());
    }

    #[test]
    fn test_lenient_decode_of_unknown_protocol() {
        // Hand-build a document whose marker names a protocol we do not
        // recognize but is otherwise well formed.
        let template = r#"{"v":"XKEY10JSONssssss_","d":"","note":"opaque"}"#;
        let size_hex = format!("{:06x}", template.len());
        let doc = template.replace("ssssss", &size_hex);

        assert!(Sad::from_raw_strict(doc.as_bytes()).is_err());
        let sad = Sad::from_raw(doc.as_bytes()).unwrap();
        assert!(sad.versage().is_none());
        assert_eq!(sad.get_str("note"), Some("opaque"));
    }

    #[test]
    fn test_verify_uses_stored_code() {
        let sad = Sad::from_map_with(inception_map(), DigestAlg::Sha2_256).unwrap();
        let back = Sad::from_raw_strict(sad.raw()).unwrap();
        assert_eq!(back.said().unwrap().alg(), DigestAlg::Sha2_256);
        assert!(back.verify());
    }

    #[test]
    fn test_sign_and_verify_signature() {
        let keypair = Keypair::from_seed(&[0x11; 32]);
        let sad = Sad::from_map(inception_map()).unwrap();
        let sig = sad.sign(&keypair);
        assert!(sad.verify_signature(&keypair.public_key(), &sig));

        let other = Keypair::from_seed(&[0x22; 32]);
        assert!(!sad.verify_signature(&other.public_key(), &sig));
    }
}
