//! telemetry/counters.rs
//! Counters kept by each hashing decorator.
//!
//! Plain integers, no atomics: a decorator has exactly one caller.
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// What a decorator has fed to its digest so far.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCounters {
    /// Bytes appended to the digest.
    pub bytes_hashed: u64,
    /// Contiguous slices appended (one per segment touched).
    pub slices_hashed: u64,
    /// Cursor advances or commits that reached the wrapped endpoint.
    pub advances: u64,
    /// Direct writes hashed in one shot (writer side).
    pub direct_writes: u64,
    /// Try-reads whose whole buffer was hashed at once (reader side).
    pub try_reads: u64,
}

impl HashCounters {
    /// Record one slice appended to the digest.
    pub fn add_slice(&mut self, len: usize) {
        self.slices_hashed += 1;
        self.bytes_hashed += len as u64;
    }

    pub fn add_advance(&mut self) {
        self.advances += 1;
    }

    pub fn add_direct_write(&mut self) {
        self.direct_writes += 1;
    }

    pub fn add_try_read(&mut self) {
        self.try_reads += 1;
    }

    // Used to total reader + writer counters of one pipe.
    pub fn merge(&mut self, other: &HashCounters) {
        *self += *other;
    }
}

impl AddAssign for HashCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.bytes_hashed  += rhs.bytes_hashed;
        self.slices_hashed += rhs.slices_hashed;
        self.advances      += rhs.advances;
        self.direct_writes += rhs.direct_writes;
        self.try_reads     += rhs.try_reads;
    }
}
