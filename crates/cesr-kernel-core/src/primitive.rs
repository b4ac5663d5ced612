//! Primitive codec values: SAIDs, public keys, and signatures.
//!
//! Each primitive is a fixed-size value whose derivation code maps, through
//! the tables in [`crate::codes`], to an exact token length. The text (qb64)
//! form is the wire format: code characters followed by base64url digits.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::codes::{self, CodeTable, Sizage, DIGEST_CODES, KEY_CODES, SIGNATURE_CODES};
use crate::error::{CoreError, Result};

/// Digest algorithms with an assigned derivation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlg {
    /// Blake3-256, code `E`. The default for new documents.
    Blake3_256,
    /// SHA2-256, code `I`.
    Sha2_256,
}

impl DigestAlg {
    pub const fn code(self) -> &'static str {
        match self {
            DigestAlg::Blake3_256 => "E",
            DigestAlg::Sha2_256 => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "E" => Some(DigestAlg::Blake3_256),
            "I" => Some(DigestAlg::Sha2_256),
            _ => None,
        }
    }

    fn digest(self, data: &[u8]) -> [u8; 32] {
        match self {
            DigestAlg::Blake3_256 => *blake3::hash(data).as_bytes(),
            DigestAlg::Sha2_256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                hasher.finalize().into()
            }
        }
    }
}

/// Public-key derivation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Ed25519 transferable, code `D`.
    Ed25519,
    /// Ed25519 non-transferable, code `B`.
    Ed25519N,
}

impl KeyCode {
    pub const fn code(self) -> &'static str {
        match self {
            KeyCode::Ed25519 => "D",
            KeyCode::Ed25519N => "B",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "D" => Some(KeyCode::Ed25519),
            "B" => Some(KeyCode::Ed25519N),
            _ => None,
        }
    }
}

/// Encode a raw value as a qb64 token.
///
/// Base64url-encodes `pad_size` zero bytes followed by the raw bytes, then
/// overwrites the pad characters with the derivation code.
fn encode_qb64(code: &str, raw: &[u8]) -> String {
    let ps = codes::pad_size(raw.len());
    debug_assert_eq!(ps, code.len());
    let mut padded = vec![0u8; ps];
    padded.extend_from_slice(raw);
    let mut text = URL_SAFE_NO_PAD.encode(&padded);
    text.replace_range(..ps, code);
    text
}

/// Read one token from the head of a byte stream, resolving the code against
/// the given table. Trailing bytes beyond the token are left untouched.
fn peel_token<'a>(table: &CodeTable, buf: &'a [u8]) -> Result<(Sizage, &'a str)> {
    let first = *buf.first().ok_or(CoreError::ShortStream { need: 1, have: 0 })?;
    let hs = codes::hard_size(first as char).ok_or(CoreError::ColdStart(first))?;
    if buf.len() < hs {
        return Err(CoreError::ShortToken {
            code: (first as char).to_string(),
            need: hs,
            have: buf.len(),
        });
    }
    let code = std::str::from_utf8(&buf[..hs])
        .map_err(|_| CoreError::MalformedToken("derivation code is not ASCII".into()))?;
    let sz = *table
        .lookup(code)
        .ok_or_else(|| CoreError::UnknownCode(code.to_string()))?;
    if buf.len() < sz.full {
        return Err(CoreError::ShortToken {
            code: code.to_string(),
            need: sz.full,
            have: buf.len(),
        });
    }
    let token = std::str::from_utf8(&buf[..sz.full])
        .map_err(|_| CoreError::MalformedToken("token is not ASCII".into()))?;
    Ok((sz, token))
}

/// Decode the base64 body of a token, rejecting non-zero pad bits.
fn decode_raw(sz: &Sizage, token: &str) -> Result<Vec<u8>> {
    let ps = codes::pad_size(sz.raw);
    let mut text = String::with_capacity(sz.full);
    for _ in 0..ps {
        text.push('A');
    }
    text.push_str(&token[sz.hard..]);
    let padded = URL_SAFE_NO_PAD.decode(text.as_bytes())?;
    if padded.len() != ps + sz.raw {
        return Err(CoreError::MalformedToken(format!(
            "decoded {} bytes, expected {}",
            padded.len(),
            ps + sz.raw
        )));
    }
    if padded[..ps].iter().any(|&b| b != 0) {
        return Err(CoreError::MalformedToken("non-zero pad bits".into()));
    }
    Ok(padded[ps..].to_vec())
}

fn exact_token<'a>(table: &CodeTable, text: &'a str) -> Result<(Sizage, &'a str)> {
    let (sz, token) = peel_token(table, text.as_bytes())?;
    if text.len() != sz.full {
        return Err(CoreError::MalformedToken(format!(
            "token has {} trailing chars",
            text.len() - sz.full
        )));
    }
    Ok((sz, token))
}

/// A Self-Addressing Identifier: a digest of a document's own canonical
/// content, carried as a derivation-code-prefixed text token.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Said {
    alg: DigestAlg,
    raw: [u8; 32],
}

impl Said {
    /// qb64 token length for all current digest codes.
    pub const QB64_SIZE: usize = 44;

    /// Derive a SAID over the given bytes.
    pub fn derive(alg: DigestAlg, data: &[u8]) -> Self {
        Self {
            alg,
            raw: alg.digest(data),
        }
    }

    /// Create from a known algorithm and raw digest bytes.
    pub const fn from_raw(alg: DigestAlg, raw: [u8; 32]) -> Self {
        Self { alg, raw }
    }

    /// Parse from a complete qb64 token.
    pub fn from_qb64(text: &str) -> Result<Self> {
        let (sz, token) = exact_token(&DIGEST_CODES, text)?;
        Self::from_parts(&sz, token)
    }

    /// Decode one SAID from the head of a stream, returning the consumed
    /// byte count.
    pub fn take(buf: &[u8]) -> Result<(Self, usize)> {
        let (sz, token) = peel_token(&DIGEST_CODES, buf)?;
        Ok((Self::from_parts(&sz, token)?, sz.full))
    }

    fn from_parts(sz: &Sizage, token: &str) -> Result<Self> {
        let alg = DigestAlg::from_code(sz.code)
            .ok_or_else(|| CoreError::UnknownCode(sz.code.to_string()))?;
        let raw = decode_raw(sz, token)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&raw);
        Ok(Self { alg, raw: arr })
    }

    pub fn qb64(&self) -> String {
        encode_qb64(self.alg.code(), &self.raw)
    }

    pub const fn alg(&self) -> DigestAlg {
        self.alg
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.raw
    }

    /// Raw digest as lowercase hex, for logs and diagnostics.
    pub fn to_hex(&self) -> String {
        hex::encode(self.raw)
    }

    /// Serialized token length in bytes.
    pub const fn size(&self) -> usize {
        Self::QB64_SIZE
    }
}

impl fmt::Debug for Said {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Said({})", &self.qb64()[..12])
    }
}

impl fmt::Display for Said {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qb64())
    }
}

impl Serialize for Said {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.qb64())
    }
}

impl<'de> Deserialize<'de> for Said {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Said::from_qb64(&text).map_err(de::Error::custom)
    }
}

/// An Ed25519 public key with its derivation code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    code: KeyCode,
    raw: [u8; 32],
}

impl PublicKey {
    /// qb64 token length for all current key codes.
    pub const QB64_SIZE: usize = 44;

    /// Create a transferable (`D`) key from raw bytes.
    pub const fn transferable(raw: [u8; 32]) -> Self {
        Self {
            code: KeyCode::Ed25519,
            raw,
        }
    }

    /// Create a non-transferable (`B`) key from raw bytes.
    pub const fn non_transferable(raw: [u8; 32]) -> Self {
        Self {
            code: KeyCode::Ed25519N,
            raw,
        }
    }

    /// Parse from a complete qb64 token.
    pub fn from_qb64(text: &str) -> Result<Self> {
        let (sz, token) = exact_token(&KEY_CODES, text)?;
        Self::from_parts(&sz, token)
    }

    /// Decode one public key from the head of a stream.
    pub fn take(buf: &[u8]) -> Result<(Self, usize)> {
        let (sz, token) = peel_token(&KEY_CODES, buf)?;
        Ok((Self::from_parts(&sz, token)?, sz.full))
    }

    fn from_parts(sz: &Sizage, token: &str) -> Result<Self> {
        let code =
            KeyCode::from_code(sz.code).ok_or_else(|| CoreError::UnknownCode(sz.code.to_string()))?;
        let raw = decode_raw(sz, token)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&raw);
        Ok(Self { code, raw: arr })
    }

    pub fn qb64(&self) -> String {
        encode_qb64(self.code.code(), &self.raw)
    }

    pub const fn code(&self) -> KeyCode {
        self.code
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.raw
    }

    pub const fn size(&self) -> usize {
        Self::QB64_SIZE
    }

    /// Verify a signature over a message. Returns false for malformed key
    /// material as well as for a failed check; integrity-requiring callers
    /// must branch on the result.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.raw) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        key.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.qb64()[..12])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qb64())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.qb64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PublicKey::from_qb64(&text).map_err(de::Error::custom)
    }
}

/// An Ed25519 signature, code `0B`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    raw: [u8; 64],
}

impl Signature {
    /// qb64 token length for the Ed25519 signature code.
    pub const QB64_SIZE: usize = 88;

    pub const fn from_raw(raw: [u8; 64]) -> Self {
        Self { raw }
    }

    /// Parse from a complete qb64 token.
    pub fn from_qb64(text: &str) -> Result<Self> {
        let (sz, token) = exact_token(&SIGNATURE_CODES, text)?;
        Self::from_parts(&sz, token)
    }

    /// Decode one signature from the head of a stream.
    pub fn take(buf: &[u8]) -> Result<(Self, usize)> {
        let (sz, token) = peel_token(&SIGNATURE_CODES, buf)?;
        Ok((Self::from_parts(&sz, token)?, sz.full))
    }

    fn from_parts(sz: &Sizage, token: &str) -> Result<Self> {
        let raw = decode_raw(sz, token)?;
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&raw);
        Ok(Self { raw: arr })
    }

    pub fn qb64(&self) -> String {
        encode_qb64("0B", &self.raw)
    }

    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.raw
    }

    pub const fn size(&self) -> usize {
        Self::QB64_SIZE
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.qb64()[..12])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qb64())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.qb64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Signature::from_qb64(&text).map_err(de::Error::custom)
    }
}

/// A signing keypair. Never serialized; only the public half has a wire form.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The transferable public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::transferable(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_raw(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_said_qb64_roundtrip() {
        let said = Said::derive(DigestAlg::Blake3_256, b"hello world");
        let text = said.qb64();
        assert_eq!(text.len(), Said::QB64_SIZE);
        assert!(text.starts_with('E'));

        let back = Said::from_qb64(&text).unwrap();
        assert_eq!(back, said);
        assert_eq!(back.qb64(), text);
    }

    #[test]
    fn test_said_sha2_code() {
        let said = Said::derive(DigestAlg::Sha2_256, b"hello world");
        assert!(said.qb64().starts_with('I'));
        assert_eq!(said.alg(), DigestAlg::Sha2_256);
    }

    #[test]
    fn test_said_hex_fingerprint() {
        let said = Said::from_raw(DigestAlg::Blake3_256, [0xab; 32]);
        assert_eq!(said.to_hex(), "ab".repeat(32));
    }

    #[test]
    fn test_said_literal_token() {
        // All-zero raw digest encodes as the code followed by 43 'A's.
        let text = format!("E{}", "A".repeat(43));
        let said = Said::from_qb64(&text).unwrap();
        assert_eq!(said.as_bytes(), &[0u8; 32]);
        assert_eq!(said.qb64(), text);
    }

    #[test]
    fn test_said_take_leaves_trailing_bytes() {
        let said = Said::derive(DigestAlg::Blake3_256, b"x");
        let mut buf = said.qb64().into_bytes();
        buf.extend_from_slice(b"trailing");
        let (back, consumed) = Said::take(&buf).unwrap();
        assert_eq!(back, said);
        assert_eq!(consumed, Said::QB64_SIZE);
    }

    #[test]
    fn test_short_token_is_error_not_panic() {
        let said = Said::derive(DigestAlg::Blake3_256, b"x");
        let text = said.qb64();
        let err = Said::from_qb64(&text[..20]).unwrap_err();
        assert!(matches!(err, CoreError::ShortToken { need: 44, have: 20, .. }));
    }

    #[test]
    fn test_unknown_code_is_error() {
        let text = format!("Z{}", "A".repeat(43));
        assert!(matches!(
            Said::from_qb64(&text).unwrap_err(),
            CoreError::UnknownCode(_)
        ));
    }

    #[test]
    fn test_nonzero_pad_bits_rejected() {
        // 'Q' in the first body position puts non-zero bits in the pad byte.
        let text = format!("EQ{}", "A".repeat(42));
        assert!(matches!(
            Said::from_qb64(&text).unwrap_err(),
            CoreError::MalformedToken(_)
        ));
    }

    #[test]
    fn test_public_key_roundtrip() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let pk = keypair.public_key();
        let text = pk.qb64();
        assert_eq!(text.len(), PublicKey::QB64_SIZE);
        assert!(text.starts_with('D'));
        assert_eq!(PublicKey::from_qb64(&text).unwrap(), pk);
    }

    #[test]
    fn test_non_transferable_key_code() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let pk = PublicKey::non_transferable(*keypair.public_key().as_bytes());
        assert!(pk.qb64().starts_with('B'));
        assert_eq!(PublicKey::from_qb64(&pk.qb64()).unwrap().code(), KeyCode::Ed25519N);
    }

    #[test]
    fn test_signature_roundtrip() {
        let keypair = Keypair::from_seed(&[0x07; 32]);
        let sig = keypair.sign(b"message");
        let text = sig.qb64();
        assert_eq!(text.len(), Signature::QB64_SIZE);
        assert!(text.starts_with("0B"));
        assert_eq!(Signature::from_qb64(&text).unwrap(), sig);
    }

    #[test]
    fn test_sign_verify() {
        let keypair = Keypair::generate();
        let sig = keypair.sign(b"payload");
        assert!(keypair.public_key().verify(b"payload", &sig));
        assert!(!keypair.public_key().verify(b"payloaD", &sig));
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let kp1 = Keypair::from_seed(&[0x01; 32]);
        let kp2 = Keypair::from_seed(&[0x01; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_serde_as_qb64_string() {
        let said = Said::derive(DigestAlg::Blake3_256, b"doc");
        let json = serde_json::to_string(&said).unwrap();
        assert_eq!(json, format!("\"{}\"", said.qb64()));
        let back: Said = serde_json::from_str(&json).unwrap();
        assert_eq!(back, said);
    }

    #[test]
    fn test_trailing_chars_rejected_for_exact_parse() {
        let said = Said::derive(DigestAlg::Blake3_256, b"x");
        let text = format!("{}A", said.qb64());
        assert!(matches!(
            Said::from_qb64(&text).unwrap_err(),
            CoreError::MalformedToken(_)
        ));
    }
}
