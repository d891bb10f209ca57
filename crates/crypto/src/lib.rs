//! Content digest computation for Proofmark
//!
//! Turns raw file bytes into a deterministic hexadecimal fingerprint using
//! a pluggable 256-bit digest backend. BLAKE2b-256 is the default; BLAKE3
//! is available as an alternative.

pub mod digest;

pub use digest::{Blake2b256, Blake3, Digest256, DigestComputer, DigestError};
