use std::io;

use crate::buffer::ReadBuffer;

/// Error type shared by every pipe endpoint and decorator.
///
/// Decorators never translate errors coming from the endpoint they wrap: whatever
/// the inner reader or writer returns is handed back to the caller as is.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    /// Caller broke the read/advance or acquire/commit protocol.
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(&'static str),

    /// The endpoint cannot provide the requested capability.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Cursor positions that do not fit the current view.
    #[error("invalid cursor position: consumed={consumed}, examined={examined}, view length={len}")]
    InvalidPosition {
        consumed: usize,
        examined: usize,
        len: usize,
    },

    /// Reading side has been completed.
    #[error("reader already completed")]
    ReaderCompleted,

    /// Writing side has been completed.
    #[error("writer already completed")]
    WriterCompleted,

    /// The other side completed the pipe with an error.
    #[error("pipe faulted: {0}")]
    Faulted(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<PipeError> for io::Error {
    fn from(e: PipeError) -> Self {
        match e {
            PipeError::Io(inner) => inner,
            PipeError::ProtocolMisuse(_) | PipeError::InvalidPosition { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            PipeError::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, e),
            PipeError::ReaderCompleted | PipeError::WriterCompleted => {
                io::Error::new(io::ErrorKind::BrokenPipe, e)
            }
            PipeError::Faulted(_) => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}

/// Outcome of a read on a pipe reader.
#[derive(Debug, Clone, Default)]
pub struct ReadResult {
    /// Bytes currently buffered and not yet consumed.
    pub buffer: ReadBuffer,
    /// The read was cut short by `cancel_pending_read`.
    pub is_canceled: bool,
    /// The writer completed; no more bytes will arrive after `buffer`.
    pub is_completed: bool,
}

impl ReadResult {
    pub fn new(buffer: ReadBuffer, is_canceled: bool, is_completed: bool) -> Self {
        Self { buffer, is_canceled, is_completed }
    }
}

/// Outcome of a flush (or a direct write) on a pipe writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushResult {
    /// The flush was cut short by `cancel_pending_flush`.
    pub is_canceled: bool,
    /// The reader completed; further writes are pointless.
    pub is_completed: bool,
}
