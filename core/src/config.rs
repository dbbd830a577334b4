use crate::constants::SCRATCH_MIN_SIZE;
use crate::digest::{DigestAlg, DigestError};

/// Construction options shared by [`HashPipeReader`](crate::HashPipeReader) and
/// [`HashPipeWriter`](crate::HashPipeWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashPipeConfig {
    /// Digest algorithm fed by the decorator.
    pub alg: DigestAlg,
    /// Bytes requested from the wrapped writer per `get_memory` call.
    /// Unused on the read side.
    pub scratch_size: usize,
}

impl Default for HashPipeConfig {
    fn default() -> Self {
        Self {
            alg: DigestAlg::Sha256,
            scratch_size: SCRATCH_MIN_SIZE,
        }
    }
}

impl HashPipeConfig {
    pub fn new(alg: DigestAlg) -> Self {
        Self { alg, ..Self::default() }
    }

    /// Resolve the algorithm from a numeric selector.
    pub fn from_algorithm_id(id: u16) -> Result<Self, DigestError> {
        Ok(Self::new(DigestAlg::from_id(id)?))
    }

    pub fn with_alg(mut self, alg: DigestAlg) -> Self {
        self.alg = alg;
        self
    }

    /// A size of 0 is raised to 1 so every acquisition grants some memory.
    pub fn with_scratch_size(mut self, scratch_size: usize) -> Self {
        self.scratch_size = scratch_size.max(1);
        self
    }
}

impl From<DigestAlg> for HashPipeConfig {
    fn from(alg: DigestAlg) -> Self {
        Self::new(alg)
    }
}
