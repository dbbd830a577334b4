//! `futures::io` adapters over pipe endpoints.
//!
//! They let byte-stream code (`AsyncReadExt::read_to_end`, `AsyncWriteExt::write_all`,
//! `futures::io::copy`) drive a pipe, hashed or not.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::io::{AsyncRead, AsyncWrite};

use crate::pipe::{PipeReader, PipeWriter};

/// `AsyncRead` over a [`PipeReader`].
///
/// Each read copies what fits into the caller's buffer and advances the pipe by
/// exactly that many bytes.
#[derive(Debug)]
pub struct PipeAsyncRead<R> {
    reader: R,
}

impl<R> PipeAsyncRead<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: PipeReader + Unpin> AsyncRead for PipeAsyncRead<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        let result = ready!(this.reader.poll_read(cx))?;

        if result.is_canceled {
            this.reader.advance(0)?;
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "pipe read canceled",
            )));
        }

        let view = &result.buffer;
        if view.is_empty() {
            this.reader.advance(0)?;
            if result.is_completed {
                return Poll::Ready(Ok(0));
            }
            // Nothing to hand out yet; yield to the executor and read again later.
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        let mut copied = 0;
        for slice in view.walk(buf.len()) {
            buf[copied..copied + slice.len()].copy_from_slice(slice);
            copied += slice.len();
        }
        this.reader.advance(copied)?;
        Poll::Ready(Ok(copied))
    }
}

/// `AsyncWrite` over a [`PipeWriter`].
///
/// Writes go through the memory/commit path and become visible to the reader on
/// flush. Closing flushes and then completes the writer.
#[derive(Debug)]
pub struct PipeAsyncWrite<W> {
    writer: W,
    completed: bool,
}

impl<W> PipeAsyncWrite<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, completed: false }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: PipeWriter + Unpin> PipeAsyncWrite<W> {
    fn poll_flush_inner(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let result = ready!(self.writer.poll_flush(cx))?;
        if result.is_canceled {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "pipe flush canceled",
            )));
        }
        Poll::Ready(Ok(()))
    }
}

impl<W: PipeWriter + Unpin> AsyncWrite for PipeAsyncWrite<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.completed {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe writer closed")));
        }
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        let memory = this.writer.get_memory(buf.len())?;
        let n = memory.len().min(buf.len());
        memory[..n].copy_from_slice(&buf[..n]);
        this.writer.advance(n)?;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.completed {
            return Poll::Ready(Ok(()));
        }
        this.poll_flush_inner(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.completed {
            ready!(this.poll_flush_inner(cx))?;
            this.writer.complete(None);
            this.completed = true;
        }
        Poll::Ready(Ok(()))
    }
}
