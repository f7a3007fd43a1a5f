//! Nullable infrastructure for deterministic testing.
//!
//! The client reaches the outside world through two seams: the
//! [`HttpBackend`](voxverify_client::HttpBackend) and the
//! [`Clock`](voxverify_client::Clock). This crate provides test-friendly
//! implementations of both that:
//! - Return scripted, deterministic values
//! - Record what the client did, for assertions
//! - Never touch the network or wait on real time
//!
//! Usage: build a client with `VerificationClient::with_parts` and pass
//! nullables instead of the production backend and clock.

pub mod backend;
pub mod clock;

pub use backend::{NullBackend, Scripted};
pub use clock::NullClock;
