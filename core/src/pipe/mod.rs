//! Pipe endpoint contracts and the hashing decorators built on them.
//!
//! A pipe is a byte channel with a reading end and a writing end. The reader pulls
//! a [`ReadBuffer`](crate::buffer::ReadBuffer) view of everything buffered, then reports two cursors back:
//! `consumed` (bytes the pipe may drop) and `examined` (bytes the reader has looked
//! at; the pipe will not wake the reader again until more than that is buffered).
//! The writer borrows scratch memory, fills it and commits a byte count, or hands
//! over a whole buffer in one write.
//!
//! Endpoints are driven by a single caller. None of the types here lock.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;

use crate::config::HashPipeConfig;
use crate::digest::DigestAlg;
use crate::types::{FlushResult, PipeError, ReadResult};

pub mod reader;
pub mod stream;
pub mod writer;

pub use reader::HashPipeReader;
pub use stream::{PipeAsyncRead, PipeAsyncWrite};
pub use writer::HashPipeWriter;

/// Reading end of a pipe.
pub trait PipeReader: Send {
    /// Wait for buffered bytes, completion or cancellation.
    ///
    /// The returned view stays valid until the next `advance_to`.
    fn poll_read(&mut self, cx: &mut Context<'_>) -> Poll<Result<ReadResult, PipeError>>;

    /// Non-suspending read. `Ok(None)` when nothing new is available.
    fn try_read(&mut self) -> Result<Option<ReadResult>, PipeError>;

    /// Report cursors against the view returned by the last read.
    ///
    /// Requires `consumed <= examined <= view.len()`.
    fn advance_to(&mut self, consumed: usize, examined: usize) -> Result<(), PipeError>;

    /// Shorthand for `advance_to(consumed, consumed)`.
    fn advance(&mut self, consumed: usize) -> Result<(), PipeError> {
        self.advance_to(consumed, consumed)
    }

    /// Make the pending (or next) read return with `is_canceled` set.
    fn cancel_pending_read(&mut self);

    /// Signal that this side will not read anymore.
    fn complete(&mut self, error: Option<PipeError>);
}

/// Writing end of a pipe.
pub trait PipeWriter: Send {
    /// Borrow writable memory of at least `size_hint` bytes (at least one byte when
    /// the hint is 0). Bytes become visible to the reader only after `advance`.
    fn get_memory(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError>;

    /// Synchronous contiguous span; same contract as `get_memory`.
    fn get_span(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError>;

    /// The region handed out by the last `get_memory`/`get_span`, with whatever the
    /// producer has written into it. Empty once `advance` has been called.
    fn pending_memory(&self) -> &[u8];

    /// Commit the first `count` bytes of the granted region.
    fn advance(&mut self, count: usize) -> Result<(), PipeError>;

    /// Copy `source` into the pipe and flush it.
    fn write<'a>(&'a mut self, source: &'a [u8]) -> BoxFuture<'a, Result<FlushResult, PipeError>>;

    /// Make committed bytes available to the reader, waiting on backpressure.
    fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<FlushResult, PipeError>>;

    /// Make the pending (or next) flush return with `is_canceled` set.
    fn cancel_pending_flush(&mut self);

    /// Signal that this side will not write anymore.
    fn complete(&mut self, error: Option<PipeError>);
}

macro_rules! deref_pipe_reader {
    () => {
        fn poll_read(&mut self, cx: &mut Context<'_>) -> Poll<Result<ReadResult, PipeError>> {
            (**self).poll_read(cx)
        }

        fn try_read(&mut self) -> Result<Option<ReadResult>, PipeError> {
            (**self).try_read()
        }

        fn advance_to(&mut self, consumed: usize, examined: usize) -> Result<(), PipeError> {
            (**self).advance_to(consumed, examined)
        }

        fn cancel_pending_read(&mut self) {
            (**self).cancel_pending_read()
        }

        fn complete(&mut self, error: Option<PipeError>) {
            (**self).complete(error)
        }
    };
}

impl<R: PipeReader + ?Sized> PipeReader for Box<R> {
    deref_pipe_reader!();
}

impl<R: PipeReader + ?Sized> PipeReader for &mut R {
    deref_pipe_reader!();
}

macro_rules! deref_pipe_writer {
    () => {
        fn get_memory(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError> {
            (**self).get_memory(size_hint)
        }

        fn get_span(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError> {
            (**self).get_span(size_hint)
        }

        fn pending_memory(&self) -> &[u8] {
            (**self).pending_memory()
        }

        fn advance(&mut self, count: usize) -> Result<(), PipeError> {
            (**self).advance(count)
        }

        fn write<'a>(&'a mut self, source: &'a [u8]) -> BoxFuture<'a, Result<FlushResult, PipeError>> {
            (**self).write(source)
        }

        fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<FlushResult, PipeError>> {
            (**self).poll_flush(cx)
        }

        fn cancel_pending_flush(&mut self) {
            (**self).cancel_pending_flush()
        }

        fn complete(&mut self, error: Option<PipeError>) {
            (**self).complete(error)
        }
    };
}

impl<W: PipeWriter + ?Sized> PipeWriter for Box<W> {
    deref_pipe_writer!();
}

impl<W: PipeWriter + ?Sized> PipeWriter for &mut W {
    deref_pipe_writer!();
}

/// Future returned by [`PipeReaderExt::read`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Read<'a, R: ?Sized> {
    reader: &'a mut R,
}

impl<R: PipeReader + ?Sized> Future for Read<'_, R> {
    type Output = Result<ReadResult, PipeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.reader.poll_read(cx)
    }
}

/// Future returned by [`PipeWriterExt::flush`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Flush<'a, W: ?Sized> {
    writer: &'a mut W,
}

impl<W: PipeWriter + ?Sized> Future for Flush<'_, W> {
    type Output = Result<FlushResult, PipeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.writer.poll_flush(cx)
    }
}

/// Convenience methods for every [`PipeReader`].
pub trait PipeReaderExt: PipeReader {
    fn read(&mut self) -> Read<'_, Self> {
        Read { reader: self }
    }

    /// Wrap this reader so consumed bytes are digested with `alg`.
    fn hashed(self, alg: DigestAlg) -> HashPipeReader<Self>
    where
        Self: Sized,
    {
        HashPipeReader::new(self, alg)
    }

    fn hashed_with(self, config: HashPipeConfig) -> HashPipeReader<Self>
    where
        Self: Sized,
    {
        HashPipeReader::with_config(self, config)
    }

    fn into_async_read(self) -> PipeAsyncRead<Self>
    where
        Self: Sized,
    {
        PipeAsyncRead::new(self)
    }
}

impl<R: PipeReader + ?Sized> PipeReaderExt for R {}

/// Convenience methods for every [`PipeWriter`].
pub trait PipeWriterExt: PipeWriter {
    fn flush(&mut self) -> Flush<'_, Self> {
        Flush { writer: self }
    }

    /// Copy `source` through the memory/commit path, one granted region at a time.
    /// Nothing is flushed.
    fn write_all_committed(&mut self, mut source: &[u8]) -> Result<(), PipeError> {
        while !source.is_empty() {
            let memory = self.get_memory(source.len())?;
            let n = memory.len().min(source.len());
            if n == 0 {
                return Err(PipeError::ProtocolMisuse("get_memory returned an empty region"));
            }
            memory[..n].copy_from_slice(&source[..n]);
            self.advance(n)?;
            source = &source[n..];
        }
        Ok(())
    }

    /// Wrap this writer so committed bytes are digested with `alg`.
    fn hashed(self, alg: DigestAlg) -> HashPipeWriter<Self>
    where
        Self: Sized,
    {
        HashPipeWriter::new(self, alg)
    }

    fn hashed_with(self, config: HashPipeConfig) -> HashPipeWriter<Self>
    where
        Self: Sized,
    {
        HashPipeWriter::with_config(self, config)
    }

    fn into_async_write(self) -> PipeAsyncWrite<Self>
    where
        Self: Sized,
    {
        PipeAsyncWrite::new(self)
    }
}

impl<W: PipeWriter + ?Sized> PipeWriterExt for W {}

