//! # CESR Kernel Core
//!
//! Pure primitives for the CESR Kernel: self-addressing documents,
//! derivation-coded primitives, and the polymorphic stream codec.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Sad`] - A self-addressing document: a field map covering its own digest
//! - [`Said`] - A digest token with a derivation-code prefix
//! - [`PublicKey`] / [`Signature`] - Ed25519 material in the same token form
//! - [`Message`] - A decoded document dispatched by protocol and ilk
//!
//! ## Streams
//!
//! Documents and primitive tokens concatenate into one stream; each item is
//! self-delimiting, so [`stream::unpack`] walks the stream without any outer
//! framing. See the [`stream`] module.

pub mod canonical;
pub mod codes;
pub mod error;
pub mod message;
pub mod primitive;
pub mod sad;
pub mod stream;
pub mod version;

pub use canonical::{deserialize_map, serialize_map};
pub use codes::{CodeTable, Sizage, DIGEST_CODES, KEY_CODES, SIGNATURE_CODES};
pub use error::{CoreError, Result};
pub use message::{dispatch, Credential, DataRecord, Event, EventKind, Message};
pub use primitive::{DigestAlg, KeyCode, Keypair, PublicKey, Said, Signature};
pub use sad::Sad;
pub use stream::{pack, sniff_cold, unpack, unpack_as, Cold, ItemKind, StreamItem, Unpacker};
pub use version::{Protocol, SerialKind, Versage, VERSION_SIZE};
