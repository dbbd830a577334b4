//! hashpipe-core
//!
//! Digest-accumulating decorators for buffered pipes.
//!
//! [`HashPipeReader`] and [`HashPipeWriter`] wrap any [`PipeReader`] / [`PipeWriter`]
//! and behave exactly like the endpoint they wrap, while appending every byte that
//! is irrevocably committed (examined on the read side, committed or written on
//! the write side) to a running digest. `current_digest()` can be queried at any
//! point without disturbing the pipe or the digest.
//!
//! ```
//! use hashpipe_core::prelude::*;
//! # fn wrap<R: PipeReader>(r: R) -> HashPipeReader<R> {
//! let reader = r.hashed(DigestAlg::Sha256);
//! # reader
//! # }
//! ```

#![forbid(unsafe_code)]

// Shared and top level
pub mod config;
pub mod constants;
pub mod types;

pub mod buffer;
pub mod digest;
pub mod telemetry;

// Pipe endpoints and decorators
pub mod pipe;

pub use buffer::{ReadBuffer, SegmentWalker};
pub use config::HashPipeConfig;
pub use digest::{digest_oneshot, DigestAlg, DigestError, DigestState};
pub use pipe::{
    HashPipeReader, HashPipeWriter, PipeAsyncRead, PipeAsyncWrite, PipeReader, PipeReaderExt,
    PipeWriter, PipeWriterExt,
};
pub use telemetry::HashCounters;
pub use types::{FlushResult, PipeError, ReadResult};

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::buffer::ReadBuffer;
    pub use crate::config::HashPipeConfig;
    pub use crate::digest::DigestAlg;
    pub use crate::pipe::{
        HashPipeReader, HashPipeWriter, PipeReader, PipeReaderExt, PipeWriter, PipeWriterExt,
    };
    pub use crate::types::{FlushResult, PipeError, ReadResult};
}
