//! Digest backends and the fingerprint computer.

use proofmark_types::Fingerprint;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from fingerprint computation.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The file could not be fully read. The caller's previous fingerprint
    /// must be left unchanged; a partial read is never hashed.
    #[error("failed to read {path}: {source}")]
    ReadFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown digest backend: {0}")]
    UnknownBackend(String),
}

/// Trait for 256-bit digest backends.
pub trait Digest256: Send + Sync {
    /// Hash the full input and return the 32-byte digest.
    fn digest(&self, data: &[u8]) -> [u8; 32];

    /// Get the name of the backend.
    fn name(&self) -> &'static str;
}

/// BLAKE2b-256 implementation (the digest used by the target chain).
pub struct Blake2b256;

impl Digest256 for Blake2b256 {
    fn digest(&self, data: &[u8]) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(data);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    fn name(&self) -> &'static str {
        "blake2b-256"
    }
}

/// BLAKE3 implementation.
pub struct Blake3;

impl Digest256 for Blake3 {
    fn digest(&self, data: &[u8]) -> [u8; 32] {
        use blake3::Hasher;
        let mut hasher = Hasher::new();
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    fn name(&self) -> &'static str {
        "blake3"
    }
}

/// Computes fingerprints from file content.
///
/// Deterministic with respect to its backend: identical bytes always yield
/// the identical fingerprint.
pub struct DigestComputer {
    backend: Box<dyn Digest256>,
}

impl DigestComputer {
    /// Create a computer with the default BLAKE2b-256 backend.
    pub fn new() -> Self {
        Self::with_backend(Box::new(Blake2b256))
    }

    /// Create a computer with an explicit backend.
    pub fn with_backend(backend: Box<dyn Digest256>) -> Self {
        DigestComputer { backend }
    }

    /// Create a computer by backend name.
    pub fn by_name(name: &str) -> Result<Self, DigestError> {
        match name.to_lowercase().as_str() {
            "blake2b-256" => Ok(Self::with_backend(Box::new(Blake2b256))),
            "blake3" => Ok(Self::with_backend(Box::new(Blake3))),
            other => Err(DigestError::UnknownBackend(other.to_string())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Fingerprint the given bytes.
    pub fn compute(&self, data: &[u8]) -> Fingerprint {
        Fingerprint::from_digest(self.backend.digest(data))
    }

    /// Read the entire file at `path` and fingerprint its content.
    ///
    /// Any read failure is reported as [`DigestError::ReadFailure`] without
    /// hashing partial data.
    pub fn compute_file(&self, path: &Path) -> Result<Fingerprint, DigestError> {
        let bytes = fs::read(path).map_err(|source| DigestError::ReadFailure {
            path: path.display().to_string(),
            source,
        })?;
        Ok(self.compute(&bytes))
    }
}

impl Default for DigestComputer {
    fn default() -> Self {
        Self::new()
    }
}
