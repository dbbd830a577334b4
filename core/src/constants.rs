/// Scratch region requested from the wrapped writer on every `get_memory` call.
/// Caller hints are ignored so the underlying pipe can amortize allocation.
pub const SCRATCH_MIN_SIZE: usize = 8 * 1024; // 8 KiB

/// Segment size used by pipes that split committed bytes into fixed chunks.
pub const DEFAULT_SEGMENT_SIZE: usize = 4 * 1024; // 4 KiB

/// Unconsumed bytes at which a pipe flush should start waiting on the reader.
pub const DEFAULT_PAUSE_WRITER_THRESHOLD: usize = 64 * 1024;

/// Unconsumed bytes at which a paused flush may resume.
pub const DEFAULT_RESUME_WRITER_THRESHOLD: usize = 32 * 1024;

