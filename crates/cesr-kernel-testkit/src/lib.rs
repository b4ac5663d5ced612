//! # CESR Kernel Testkit
//!
//! Testing utilities for the CESR Kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known documents with expected digests for
//!   cross-implementation verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use cesr_kernel_testkit::vectors::{all_vectors, build_vector};
//!
//! for vector in all_vectors() {
//!     let sad = build_vector(&vector);
//!     assert!(sad.verify());
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust
//! use cesr_kernel_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed(&[0x42; 32]);
//! let event = fixture.make_inception();
//! assert!(event.sad().verify());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
pub use vectors::{all_vectors, build_vector, GoldenVector};
