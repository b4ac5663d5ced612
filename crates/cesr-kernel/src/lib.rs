//! # CESR Kernel
//!
//! The unified API for the CESR Kernel: self-addressing documents, typed
//! protocol messages, and the polymorphic stream codec, plus the file-level
//! exchange shapes built on them.
//!
//! ## Overview
//!
//! - **Documents**: field maps that carry their own digest; the digest covers
//!   the serialization with the digest field blanked
//! - **Messages**: documents with a version marker, dispatched by protocol
//!   into events, credentials, or generic records
//! - **Streams**: concatenations of self-delimiting documents and primitive
//!   tokens, decoded item by item
//! - **Exchange**: certificate and acknowledgment bodies embedding a signed
//!   event, and an alias registry for naming digests
//!
//! ## Usage
//!
//! ```rust
//! use cesr_kernel::core::{dispatch, pack, unpack, Keypair, Message, Sad, StreamItem};
//! use serde_json::json;
//!
//! let keypair = Keypair::generate();
//! let serde_json::Value::Object(map) = json!({
//!     "v": "KERI10JSON000000_",
//!     "t": "icp",
//!     "d": "",
//!     "i": keypair.public_key().qb64(),
//!     "s": "0",
//! }) else { unreachable!() };
//!
//! let sad = Sad::from_map(map).unwrap();
//! assert!(sad.verify());
//!
//! let stream = pack(&[StreamItem::from(dispatch(sad))]);
//! let items = unpack(&stream).unwrap();
//! assert!(matches!(items[0], StreamItem::Event(_)));
//! ```

pub use cesr_kernel_core as core;

pub mod documents;
pub mod error;
pub mod registry;

pub use documents::{Acknowledgment, Certificate};
pub use error::{KernelError, Result};
pub use registry::AliasRegistry;
