//! Typed views over decoded documents.
//!
//! Dispatch is by protocol tag, then by the `t` ilk field for events. The
//! typed wrappers own their [`Sad`] and expose the well-known fields as
//! accessors; unknown or missing fields read as `None` rather than failing,
//! since a decoded document is already integrity-checked (or checkable)
//! through its digest.

use serde_json::Value;

use crate::primitive::Said;
use crate::sad::Sad;
use crate::version::Protocol;

/// Event ilks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `icp`, establishes an identifier.
    Inception,
    /// `dip`, establishes a delegated identifier.
    DelegatedInception,
    /// `rot` or `drt`, rotates keys.
    Rotation,
    /// `ixn`, anchors data without changing keys.
    Interaction,
    /// Any other ilk, carried through untyped.
    Other,
}

impl EventKind {
    pub fn from_ilk(ilk: &str) -> Self {
        match ilk {
            "icp" => EventKind::Inception,
            "dip" => EventKind::DelegatedInception,
            "rot" | "drt" => EventKind::Rotation,
            "ixn" => EventKind::Interaction,
            _ => EventKind::Other,
        }
    }
}

/// A key event: an event-protocol document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    sad: Sad,
    kind: EventKind,
}

impl Event {
    pub fn new(sad: Sad) -> Self {
        let kind = sad
            .get_str("t")
            .map(EventKind::from_ilk)
            .unwrap_or(EventKind::Other);
        Self { sad, kind }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The identifier prefix this event belongs to.
    pub fn aid(&self) -> Option<&str> {
        self.sad.get_str("i")
    }

    /// Sequence number, parsed from the hex `s` field.
    pub fn sn(&self) -> Option<u64> {
        u64::from_str_radix(self.sad.get_str("s")?, 16).ok()
    }

    pub fn ilk(&self) -> Option<&str> {
        self.sad.get_str("t")
    }

    /// Digest of the prior event.
    pub fn prior(&self) -> Option<Said> {
        Said::from_qb64(self.sad.get_str("p")?).ok()
    }

    /// Anchored seals, the `a` array.
    pub fn seals(&self) -> Option<&Vec<Value>> {
        self.sad.get("a")?.as_array()
    }

    pub fn said(&self) -> Option<Said> {
        self.sad.said()
    }

    pub fn sad(&self) -> &Sad {
        &self.sad
    }

    pub fn into_sad(self) -> Sad {
        self.sad
    }
}

/// A credential: a credential-protocol document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    sad: Sad,
}

impl Credential {
    pub fn new(sad: Sad) -> Self {
        Self { sad }
    }

    /// Issuer identifier.
    pub fn issuer(&self) -> Option<&str> {
        self.sad.get_str("i")
    }

    /// Schema digest.
    pub fn schema(&self) -> Option<Said> {
        Said::from_qb64(self.sad.get_str("s")?).ok()
    }

    /// The attribute block, the `a` field.
    pub fn attributes(&self) -> Option<&Value> {
        self.sad.get("a")
    }

    /// Recipient identifier: the top-level `ri` field, or the `i` field of
    /// the attribute block.
    pub fn recipient(&self) -> Option<&str> {
        if let Some(ri) = self.sad.get_str("ri") {
            return Some(ri);
        }
        self.sad.get("a")?.as_object()?.get("i")?.as_str()
    }

    pub fn said(&self) -> Option<Said> {
        self.sad.said()
    }

    pub fn sad(&self) -> &Sad {
        &self.sad
    }

    pub fn into_sad(self) -> Sad {
        self.sad
    }
}

/// A generic self-addressing record with no protocol semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    sad: Sad,
}

impl DataRecord {
    pub fn new(sad: Sad) -> Self {
        Self { sad }
    }

    pub fn said(&self) -> Option<Said> {
        self.sad.said()
    }

    pub fn sad(&self) -> &Sad {
        &self.sad
    }

    pub fn into_sad(self) -> Sad {
        self.sad
    }
}

/// A dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Event(Event),
    Credential(Credential),
    Record(DataRecord),
}

impl Message {
    /// The underlying document.
    pub fn sad(&self) -> &Sad {
        match self {
            Message::Event(e) => e.sad(),
            Message::Credential(c) => c.sad(),
            Message::Record(r) => r.sad(),
        }
    }

    pub fn said(&self) -> Option<Said> {
        self.sad().said()
    }
}

/// Dispatch a decoded document to its typed view.
///
/// Event-protocol documents become [`Event`]s, credential-protocol documents
/// become [`Credential`]s, and documents without a versage (the lenient
/// path) become [`DataRecord`]s.
pub fn dispatch(sad: Sad) -> Message {
    match sad.versage().map(|v| v.proto) {
        Some(Protocol::Keri) => Message::Event(Event::new(sad)),
        Some(Protocol::Acdc) => Message::Credential(Credential::new(sad)),
        None => Message::Record(DataRecord::new(sad)),
    }
}
