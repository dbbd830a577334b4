//! Incremental digest engine used by the hashing pipe decorators.
//!
//! `DigestState` only ever grows: bytes are appended, snapshots are taken from a
//! clone of the running state, and nothing here finalizes or resets the engine.

use std::fmt;
use std::str::FromStr;

use digest::Digest;
use num_enum::TryFromPrimitive;
use sha2::{Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};

/// Digest-related errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("unknown or unsupported digest algorithm id: 0x{0:04x}")]
    UnknownAlgorithm(u16),

    #[error("unknown or unsupported digest algorithm name: {0:?}")]
    UnknownAlgorithmName(String),
}

/// Supported digest algorithms.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum DigestAlg {
    Sha256   = 0x0001,
    Sha512   = 0x0002,
    Blake3   = 0x0003, // un-keyed BLAKE3
    Sha384   = 0x0004,
    Sha3_256 = 0x0005,
    Sha3_512 = 0x0006,
}

impl DigestAlg {
    /// Resolve a numeric selector, failing on ids this crate does not know.
    pub fn from_id(id: u16) -> Result<Self, DigestError> {
        Self::try_from_primitive(id).map_err(|e| DigestError::UnknownAlgorithm(e.number))
    }

    pub fn id(self) -> u16 {
        self as u16
    }

    /// Digest length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlg::Sha256 | DigestAlg::Sha3_256 | DigestAlg::Blake3 => 32,
            DigestAlg::Sha384 => 48,
            DigestAlg::Sha512 | DigestAlg::Sha3_512 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlg::Sha256   => "sha256",
            DigestAlg::Sha384   => "sha384",
            DigestAlg::Sha512   => "sha512",
            DigestAlg::Sha3_256 => "sha3-256",
            DigestAlg::Sha3_512 => "sha3-512",
            DigestAlg::Blake3   => "blake3",
        }
    }
}

impl fmt::Display for DigestAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlg {
    type Err = DigestError;

    /// Accepts `sha256`, `SHA-256`, `sha3_256`, `Blake3` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "sha256"  => Ok(DigestAlg::Sha256),
            "sha384"  => Ok(DigestAlg::Sha384),
            "sha512"  => Ok(DigestAlg::Sha512),
            "sha3256" => Ok(DigestAlg::Sha3_256),
            "sha3512" => Ok(DigestAlg::Sha3_512),
            "blake3"  => Ok(DigestAlg::Blake3),
            _ => Err(DigestError::UnknownAlgorithmName(s.to_owned())),
        }
    }
}

/// Running hash state for one decorator.
#[derive(Clone)]
pub enum DigestState {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha3_256(Sha3_256),
    Sha3_512(Sha3_512),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    pub fn new(alg: DigestAlg) -> Self {
        match alg {
            DigestAlg::Sha256   => DigestState::Sha256(Sha256::new()),
            DigestAlg::Sha384   => DigestState::Sha384(Sha384::new()),
            DigestAlg::Sha512   => DigestState::Sha512(Sha512::new()),
            DigestAlg::Sha3_256 => DigestState::Sha3_256(Sha3_256::new()),
            DigestAlg::Sha3_512 => DigestState::Sha3_512(Sha3_512::new()),
            DigestAlg::Blake3   => DigestState::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    pub fn alg(&self) -> DigestAlg {
        match self {
            DigestState::Sha256(_)   => DigestAlg::Sha256,
            DigestState::Sha384(_)   => DigestAlg::Sha384,
            DigestState::Sha512(_)   => DigestAlg::Sha512,
            DigestState::Sha3_256(_) => DigestAlg::Sha3_256,
            DigestState::Sha3_512(_) => DigestAlg::Sha3_512,
            DigestState::Blake3(_)   => DigestAlg::Blake3,
        }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Sha256(h)   => h.update(data),
            DigestState::Sha384(h)   => h.update(data),
            DigestState::Sha512(h)   => h.update(data),
            DigestState::Sha3_256(h) => h.update(data),
            DigestState::Sha3_512(h) => h.update(data),
            // blake3 returns &mut Hasher for chaining
            DigestState::Blake3(h)   => { h.update(data); }
        }
    }

    /// Digest of everything appended so far. The running state is left as is.
    pub fn current(&self) -> Vec<u8> {
        match self {
            DigestState::Sha256(h)   => h.clone().finalize().to_vec(),
            DigestState::Sha384(h)   => h.clone().finalize().to_vec(),
            DigestState::Sha512(h)   => h.clone().finalize().to_vec(),
            DigestState::Sha3_256(h) => h.clone().finalize().to_vec(),
            DigestState::Sha3_512(h) => h.clone().finalize().to_vec(),
            DigestState::Blake3(h)   => h.finalize().as_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for DigestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DigestState").field(&self.alg()).finish()
    }
}

/// One-shot digest of `data`, handy as a reference value.
pub fn digest_oneshot(alg: DigestAlg, data: &[u8]) -> Vec<u8> {
    let mut state = DigestState::new(alg);
    state.update(data);
    state.current()
}
