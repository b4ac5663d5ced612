//! The polymorphic stream codec.
//!
//! A stream is a concatenation of self-delimiting encodings: serialized
//! documents (JSON or CBOR, each declaring its own size in its version
//! marker) interleaved with primitive tokens (each declaring its size
//! through its derivation code). The first byte of each item decides which
//! decoder runs, and every successful decode advances the cursor by exactly
//! the bytes of that one item.

use std::fmt;

use crate::codes::{self, DIGEST_CODES, KEY_CODES, SIGNATURE_CODES};
use crate::error::{CoreError, Result};
use crate::message::{self, DataRecord, Message};
use crate::primitive::{PublicKey, Said, Signature};
use crate::sad::Sad;

/// What the first byte of an item says about its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cold {
    /// `{`: a JSON document.
    Json,
    /// A definite-length CBOR map header: a CBOR document.
    Cbor,
    /// A base64url character: a primitive token.
    Text,
}

/// Classify a leading byte.
pub fn sniff_cold(first: u8) -> Result<Cold> {
    match first {
        b'{' => Ok(Cold::Json),
        0xa0..=0xbf => Ok(Cold::Cbor),
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => Ok(Cold::Text),
        other => Err(CoreError::ColdStart(other)),
    }
}

/// One decoded stream item.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(message::Event),
    Credential(message::Credential),
    Record(DataRecord),
    Said(Said),
    Key(PublicKey),
    Sig(Signature),
}

impl StreamItem {
    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            StreamItem::Event(e) => e.sad().size(),
            StreamItem::Credential(c) => c.sad().size(),
            StreamItem::Record(r) => r.sad().size(),
            StreamItem::Said(s) => s.size(),
            StreamItem::Key(k) => k.size(),
            StreamItem::Sig(s) => s.size(),
        }
    }

    /// Append the wire encoding to a buffer.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            StreamItem::Event(e) => buf.extend_from_slice(e.sad().raw()),
            StreamItem::Credential(c) => buf.extend_from_slice(c.sad().raw()),
            StreamItem::Record(r) => buf.extend_from_slice(r.sad().raw()),
            StreamItem::Said(s) => buf.extend_from_slice(s.qb64().as_bytes()),
            StreamItem::Key(k) => buf.extend_from_slice(k.qb64().as_bytes()),
            StreamItem::Sig(s) => buf.extend_from_slice(s.qb64().as_bytes()),
        }
    }
}

impl From<Message> for StreamItem {
    fn from(message: Message) -> Self {
        match message {
            Message::Event(e) => StreamItem::Event(e),
            Message::Credential(c) => StreamItem::Credential(c),
            Message::Record(r) => StreamItem::Record(r),
        }
    }
}

impl From<Said> for StreamItem {
    fn from(said: Said) -> Self {
        StreamItem::Said(said)
    }
}

impl From<PublicKey> for StreamItem {
    fn from(key: PublicKey) -> Self {
        StreamItem::Key(key)
    }
}

impl From<Signature> for StreamItem {
    fn from(sig: Signature) -> Self {
        StreamItem::Sig(sig)
    }
}

/// Item categories, for callers that know what the next item must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Message,
    Said,
    Key,
    Signature,
}

/// Encode a sequence of items into one stream.
pub fn pack(items: &[StreamItem]) -> Vec<u8> {
    let total = items.iter().map(StreamItem::size).sum();
    let mut buf = Vec::with_capacity(total);
    for item in items {
        item.encode_into(&mut buf);
    }
    buf
}

/// Decode an entire stream.
///
/// Fails on the first undecodable item; items before it are discarded. Use
/// [`Unpacker`] to consume a stream incrementally instead.
pub fn unpack(buf: &[u8]) -> Result<Vec<StreamItem>> {
    Unpacker::new(buf).collect()
}

/// Decode one item of a known category from the head of a buffer, returning
/// the item and the consumed byte count.
pub fn unpack_as(buf: &[u8], kind: ItemKind) -> Result<(StreamItem, usize)> {
    match kind {
        ItemKind::Message => {
            let (msg, n) = decode_message(buf)?;
            Ok((msg.into(), n))
        }
        ItemKind::Said => {
            expect_table(buf, &DIGEST_CODES)?;
            let (said, n) = Said::take(buf)?;
            Ok((said.into(), n))
        }
        ItemKind::Key => {
            expect_table(buf, &KEY_CODES)?;
            let (key, n) = PublicKey::take(buf)?;
            Ok((key.into(), n))
        }
        ItemKind::Signature => {
            expect_table(buf, &SIGNATURE_CODES)?;
            let (sig, n) = Signature::take(buf)?;
            Ok((sig.into(), n))
        }
    }
}

/// Distinguish "code from another table" from "code known nowhere" when a
/// caller forces a category. Short or unknown tokens fall through to the
/// category decoder's own errors.
fn expect_table(buf: &[u8], table: &codes::CodeTable) -> Result<()> {
    let Some(&first) = buf.first() else {
        return Ok(());
    };
    let Some(hs) = codes::hard_size(first as char) else {
        return Ok(());
    };
    let Some(code) = buf.get(..hs).and_then(|c| std::str::from_utf8(c).ok()) else {
        return Ok(());
    };
    if table.lookup(code).is_none()
        && codes::classify(code, &[&DIGEST_CODES, &KEY_CODES, &SIGNATURE_CODES]).is_some()
    {
        return Err(CoreError::WrongCode {
            expected: table.name(),
            got: code.to_string(),
        });
    }
    Ok(())
}

/// An incremental stream decoder.
///
/// Yields one `Result<StreamItem>` per item. After yielding an error the
/// iterator is fused: the cursor no longer advances and subsequent calls
/// return `None`, so a partially readable stream surfaces its good prefix
/// followed by exactly one error.
pub struct Unpacker<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Unpacker<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    /// Cursor position in bytes.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

impl fmt::Debug for Unpacker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unpacker")
            .field("pos", &self.pos)
            .field("len", &self.buf.len())
            .field("failed", &self.failed)
            .finish()
    }
}

impl Iterator for Unpacker<'_> {
    type Item = Result<StreamItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];
        let decoded = match sniff_cold(rest[0]) {
            Ok(Cold::Json | Cold::Cbor) => {
                decode_message(rest).map(|(msg, n)| (StreamItem::from(msg), n))
            }
            Ok(Cold::Text) => decode_primitive(rest),
            Err(e) => Err(e),
        };
        match decoded {
            Ok((item, consumed)) => {
                debug_assert!(consumed > 0 && consumed <= rest.len());
                self.pos += consumed;
                tracing::trace!(size = consumed, pos = self.pos, "decoded stream item");
                Some(Ok(item))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode one document from the head of a buffer and dispatch it.
///
/// Strict framing first; when that fails, the lenient marker sniff produces
/// a generic record. The consumed size is always the document's declared
/// size, so trailing stream bytes survive either path.
fn decode_message(buf: &[u8]) -> Result<(Message, usize)> {
    match Sad::from_raw_strict(buf) {
        Ok(sad) => {
            let size = sad.size();
            Ok((message::dispatch(sad), size))
        }
        Err(strict_err) => {
            tracing::debug!(error = %strict_err, "strict decode failed, trying lenient");
            let sad = Sad::from_raw_lenient(buf)?;
            let size = sad.size();
            Ok((Message::Record(DataRecord::new(sad)), size))
        }
    }
}

/// Decode one primitive token from the head of a buffer.
///
/// The derivation code resolves against the tables in priority order:
/// digests, then keys, then signatures.
fn decode_primitive(buf: &[u8]) -> Result<(StreamItem, usize)> {
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

    let tables = [&DIGEST_CODES, &KEY_CODES, &SIGNATURE_CODES];
    let (table, _) = codes::classify(code, &tables)
        .ok_or_else(|| CoreError::UnknownCode(code.to_string()))?;
    match table.name() {
        "digest" => {
            let (said, n) = Said::take(buf)?;
            Ok((said.into(), n))
        }
        "key" => {
            let (key, n) = PublicKey::take(buf)?;
            Ok((key.into(), n))
        }
        _ => {
            let (sig, n) = Signature::take(buf)?;
            Ok((sig.into(), n))
        }
    }
}
