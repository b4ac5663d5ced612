//! Derivation-code tables for the primitive codec.
//!
//! A derivation code is the short text prefix of a primitive token. It names
//! the algorithm and, through these tables, fixes the exact token length, so
//! a stream reader never needs external length information.
//!
//! Every code in the current tables pairs a hard size equal to its pad size
//! (1-char codes carry 32-byte raws, 2-char codes carry 64-byte raws), which
//! is what lets the code occupy the base64 pad positions exactly.

/// Size row for one derivation code.
///
/// `hard` is the code length in characters, `full` the total qb64 token
/// length, and `raw` the decoded byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizage {
    pub code: &'static str,
    pub hard: usize,
    pub full: usize,
    pub raw: usize,
}

/// A closed lookup table of derivation codes.
#[derive(Debug, Clone, Copy)]
pub struct CodeTable {
    name: &'static str,
    entries: &'static [Sizage],
}

impl CodeTable {
    pub const fn new(name: &'static str, entries: &'static [Sizage]) -> Self {
        Self { name, entries }
    }

    /// Table name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a code in this table.
    pub fn lookup(&self, code: &str) -> Option<&Sizage> {
        self.entries.iter().find(|s| s.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|s| s.code)
    }
}

/// Digest codes (self-addressing identifiers).
pub const DIGEST_CODES: CodeTable = CodeTable::new(
    "digest",
    &[
        // Blake3-256
        Sizage { code: "E", hard: 1, full: 44, raw: 32 },
        // SHA2-256
        Sizage { code: "I", hard: 1, full: 44, raw: 32 },
    ],
);

/// Public-key codes, transferable and non-transferable.
pub const KEY_CODES: CodeTable = CodeTable::new(
    "key",
    &[
        // Ed25519 transferable
        Sizage { code: "D", hard: 1, full: 44, raw: 32 },
        // Ed25519 non-transferable
        Sizage { code: "B", hard: 1, full: 44, raw: 32 },
    ],
);

/// Signature codes.
pub const SIGNATURE_CODES: CodeTable = CodeTable::new(
    "signature",
    &[
        // Ed25519 signature
        Sizage { code: "0B", hard: 2, full: 88, raw: 64 },
    ],
);

/// Hard (code) size implied by the first character of a token.
///
/// Letters start 1-char codes; `0` starts 2-char codes. Anything else is not
/// a primitive cold start.
pub fn hard_size(first: char) -> Option<usize> {
    match first {
        'A'..='Z' | 'a'..='z' => Some(1),
        '0' => Some(2),
        _ => None,
    }
}

/// Base64 pad size for a raw length.
pub fn pad_size(raw: usize) -> usize {
    (3 - raw % 3) % 3
}

/// Resolve a code against tables in priority order, returning the first
/// table that recognizes it.
///
/// Codes can be ambiguous across tables; callers must pass tables in the
/// documented priority order (digests, then keys, then signatures) so that
/// resolution is a fixed tie-break rather than a guess.
pub fn classify<'a>(code: &str, tables: &[&'a CodeTable]) -> Option<(&'a CodeTable, &'a Sizage)> {
    tables
        .iter()
        .find_map(|t| t.lookup(code).map(|s| (*t, s)))
}
