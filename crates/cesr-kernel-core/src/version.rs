//! Version markers for message-kind documents.
//!
//! A marker is a fixed 17-character field of the form `PPPPMmKKKKllllll_`:
//! four protocol characters, major and minor version hex digits, four
//! serialization-kind characters, six lowercase-hex size characters, and a
//! terminator. The declared size is the exact total byte length of the
//! serialized document; it is what lets a stream reader skip to the next
//! object without parsing the document's interior.

use regex::bytes::Regex;
use std::fmt;

use crate::error::{CoreError, Result};

/// Length of a rendered version marker.
pub const VERSION_SIZE: usize = 17;

/// How far into a document the lenient sniffer will look for a marker.
pub const MAX_VERSION_OFFSET: usize = 128;

/// Supported protocol major.minor.
pub const MAJOR: u8 = 1;
pub const MINOR: u8 = 0;

/// Protocol tags for message-kind documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// The event protocol (`KERI`).
    Keri,
    /// The credential protocol (`ACDC`).
    Acdc,
}

impl Protocol {
    pub const fn tag(self) -> &'static str {
        match self {
            Protocol::Keri => "KERI",
            Protocol::Acdc => "ACDC",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "KERI" => Ok(Protocol::Keri),
            "ACDC" => Ok(Protocol::Acdc),
            other => Err(CoreError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Serialization kinds for document bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialKind {
    /// Compact JSON text.
    Json,
    /// Deterministic, definite-length CBOR.
    Cbor,
}

impl SerialKind {
    pub const fn tag(self) -> &'static str {
        match self {
            SerialKind::Json => "JSON",
            SerialKind::Cbor => "CBOR",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "JSON" => Ok(SerialKind::Json),
            "CBOR" => Ok(SerialKind::Cbor),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

/// A parsed version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versage {
    pub proto: Protocol,
    pub major: u8,
    pub minor: u8,
    pub kind: SerialKind,
    pub size: usize,
}

impl Versage {
    /// A marker for the current protocol version.
    pub fn new(proto: Protocol, kind: SerialKind, size: usize) -> Self {
        Self {
            proto,
            major: MAJOR,
            minor: MINOR,
            kind,
            size,
        }
    }

    /// Render to the 17-character wire form.
    pub fn render(&self) -> String {
        format!(
            "{}{:x}{:x}{}{:06x}_",
            self.proto.tag(),
            self.major,
            self.minor,
            self.kind.tag(),
            self.size
        )
    }

    /// Parse a complete 17-character marker.
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() != VERSION_SIZE || !text.is_ascii() || !text.ends_with('_') {
            return Err(CoreError::MalformedVersion(text.to_string()));
        }
        let proto = Protocol::from_tag(&text[..4])?;
        let major = u8::from_str_radix(&text[4..5], 16)
            .map_err(|_| CoreError::MalformedVersion(text.to_string()))?;
        let minor = u8::from_str_radix(&text[5..6], 16)
            .map_err(|_| CoreError::MalformedVersion(text.to_string()))?;
        if major != MAJOR || minor != MINOR {
            return Err(CoreError::UnsupportedVersion { major, minor });
        }
        let kind = SerialKind::from_tag(&text[6..10])?;
        let size = usize::from_str_radix(&text[10..16], 16)
            .map_err(|_| CoreError::MalformedVersion(text.to_string()))?;
        Ok(Self {
            proto,
            major,
            minor,
            kind,
            size,
        })
    }

    /// Extract the marker from the head of a serialized document.
    ///
    /// Strict framing: the version field must be the first field of the
    /// document. For JSON the document must begin with `{"v":"`, for CBOR
    /// with a definite-length map header followed by the `v` key and a
    /// 17-character text value.
    pub fn peel(raw: &[u8]) -> Result<Self> {
        let offset = match raw.first() {
            Some(b'{') => {
                if raw.len() < 6 + VERSION_SIZE + 1 || &raw[..6] != b"{\"v\":\"" {
                    return Err(CoreError::MalformedVersion(
                        "version field is not first".to_string(),
                    ));
                }
                6
            }
            Some(&b) if (0xa1..=0xb8).contains(&b) => {
                // Map header, then key "v" (0x61 0x76), then tstr-17 (0x71).
                let key_at = if b == 0xb8 { 2 } else { 1 };
                let head = [0x61, b'v', 0x71];
                if raw.len() < key_at + 3 + VERSION_SIZE
                    || raw[key_at..key_at + 3] != head
                {
                    return Err(CoreError::MalformedVersion(
                        "version field is not first".to_string(),
                    ));
                }
                key_at + 3
            }
            Some(&b) => return Err(CoreError::ColdStart(b)),
            None => return Err(CoreError::ShortStream { need: 1, have: 0 }),
        };
        let text = std::str::from_utf8(&raw[offset..offset + VERSION_SIZE])
            .map_err(|_| CoreError::MalformedVersion("marker is not ASCII".to_string()))?;
        let versage = Self::parse(text)?;
        let expected = match raw[0] {
            b'{' => SerialKind::Json,
            _ => SerialKind::Cbor,
        };
        if versage.kind != expected {
            return Err(CoreError::MalformedVersion(format!(
                "kind {} does not match framing",
                versage.kind.tag()
            )));
        }
        Ok(versage)
    }
}

impl fmt::Display for Versage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A version-marker pattern found by the lenient sniffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHit {
    /// Byte offset of the marker within the document.
    pub offset: usize,
    /// Serialization kind named by the marker.
    pub kind: SerialKind,
    /// Declared total document size in bytes.
    pub size: usize,
    /// The raw marker text, protocol tag included.
    pub marker: String,
}

/// Scan the first [`MAX_VERSION_OFFSET`] bytes for a version-marker-shaped
/// pattern, without requiring a known protocol tag.
///
/// This is the reduced-compatibility fallback for documents that are
/// self-addressing but not full protocol messages. It accepts any
/// four-uppercase-letter protocol tag; the caller treats the result as a
/// generic data record.
pub fn sniff(raw: &[u8]) -> Result<VersionHit> {
    let re = Regex::new(r"[A-Z]{4}[0-9a-f]{2}(JSON|CBOR)[0-9a-f]{6}_").expect("invalid regex");
    let window = &raw[..raw.len().min(MAX_VERSION_OFFSET)];
    let m = re
        .find(window)
        .ok_or_else(|| CoreError::MalformedVersion("no version marker in sniff window".into()))?;
    let marker = std::str::from_utf8(m.as_bytes())
        .map_err(|_| CoreError::MalformedVersion("marker is not ASCII".to_string()))?;
    let kind = SerialKind::from_tag(&marker[6..10])?;
    let size = usize::from_str_radix(&marker[10..16], 16)
        .map_err(|_| CoreError::MalformedVersion(marker.to_string()))?;
    Ok(VersionHit {
        offset: m.start(),
        kind,
        size,
        marker: marker.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_parse_roundtrip() {
        let v = Versage::new(Protocol::Keri, SerialKind::Json, 0xfb);
        assert_eq!(v.render(), "KERI10JSON0000fb_");
        assert_eq!(Versage::parse(&v.render()).unwrap(), v);

        let v = Versage::new(Protocol::Acdc, SerialKind::Cbor, 0x1234);
        assert_eq!(v.render(), "ACDC10CBOR001234_");
        assert_eq!(Versage::parse(&v.render()).unwrap(), v);
    }

    #[test]
    fn test_parse_rejects_bad_markers() {
        assert!(matches!(
            Versage::parse("KERI10JSON0000fb"),
            Err(CoreError::MalformedVersion(_))
        ));
        assert!(matches!(
            Versage::parse("XXXX10JSON0000fb_"),
            Err(CoreError::UnknownProtocol(_))
        ));
        assert!(matches!(
            Versage::parse("KERI10MGPK0000fb_"),
            Err(CoreError::UnknownKind(_))
        ));
        assert!(matches!(
            Versage::parse("KERI20JSON0000fb_"),
            Err(CoreError::UnsupportedVersion { major: 2, minor: 0 })
        ));
    }

    #[test]
    fn test_peel_json() {
        let raw = br#"{"v":"KERI10JSON0000fb_","t":"icp"}"#;
        let v = Versage::peel(raw).unwrap();
        assert_eq!(v.proto, Protocol::Keri);
        assert_eq!(v.kind, SerialKind::Json);
        assert_eq!(v.size, 0xfb);
    }

    #[test]
    fn test_peel_requires_version_first() {
        let raw = br#"{"t":"icp","v":"KERI10JSON0000fb_"}"#;
        assert!(matches!(
            Versage::peel(raw),
            Err(CoreError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_peel_cbor() {
        // {"v": "ACDC10CBOR000020_"} as a 1-entry definite map.
        let mut raw = vec![0xa1, 0x61, b'v', 0x71];
        raw.extend_from_slice(b"ACDC10CBOR000020_");
        let v = Versage::peel(&raw).unwrap();
        assert_eq!(v.proto, Protocol::Acdc);
        assert_eq!(v.kind, SerialKind::Cbor);
        assert_eq!(v.size, 0x20);
    }

    #[test]
    fn test_peel_kind_must_match_framing() {
        let raw = br#"{"v":"KERI10CBOR0000fb_","t":"icp"}"#;
        assert!(matches!(
            Versage::peel(raw),
            Err(CoreError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_sniff_finds_embedded_marker() {
        let raw = br#"{"d":"","note":"x","v":"DATA10JSON00002a_"}"#;
        let hit = sniff(raw).unwrap();
        assert_eq!(hit.kind, SerialKind::Json);
        assert_eq!(hit.size, 0x2a);
        assert_eq!(&hit.marker[..4], "DATA");
    }

    #[test]
    fn test_sniff_window_is_bounded() {
        let mut raw = vec![b' '; MAX_VERSION_OFFSET];
        raw.extend_from_slice(b"KERI10JSON000010_");
        assert!(sniff(&raw).is_err());
    }
}
