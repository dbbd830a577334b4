use std::cell::Cell;
use std::marker::PhantomData;
use std::task::{Context, Poll};

use crate::buffer::ReadBuffer;
use crate::config::HashPipeConfig;
use crate::digest::{DigestAlg, DigestError, DigestState};
use crate::pipe::PipeReader;
use crate::telemetry::HashCounters;
use crate::types::{PipeError, ReadResult};

/// Pipe reader that digests every byte the caller marks as examined.
///
/// A read only records the returned view. When the caller advances, the bytes in
/// `[0, examined)` of that view are appended to the digest and the view is
/// dropped, so a later read that re-delivers unconsumed bytes starts a fresh view
/// and nothing is hashed twice.
///
/// The type is `Send` but not `Sync`: one caller drives it at a time.
pub struct HashPipeReader<R> {
    reader: R,
    state: DigestState,
    pending: Option<ReadBuffer>,
    counters: HashCounters,
    _not_sync: PhantomData<Cell<()>>,
}

impl<R: PipeReader> HashPipeReader<R> {
    pub fn new(reader: R, alg: DigestAlg) -> Self {
        Self::with_config(reader, HashPipeConfig::new(alg))
    }

    pub fn with_config(reader: R, config: HashPipeConfig) -> Self {
        tracing::debug!(alg = %config.alg, "hashing pipe reader created");
        Self {
            reader,
            state: DigestState::new(config.alg),
            pending: None,
            counters: HashCounters::default(),
            _not_sync: PhantomData,
        }
    }

    /// Build from a numeric algorithm selector; unknown ids are rejected here.
    pub fn from_algorithm_id(reader: R, id: u16) -> Result<Self, DigestError> {
        Ok(Self::new(reader, DigestAlg::from_id(id)?))
    }
}

impl<R> HashPipeReader<R> {
    /// Digest of everything hashed so far. Does not touch the pipe.
    pub fn current_digest(&self) -> Vec<u8> {
        self.state.current()
    }

    pub fn current_digest_hex(&self) -> String {
        hex::encode(self.current_digest())
    }

    pub fn algorithm(&self) -> DigestAlg {
        self.state.alg()
    }

    pub fn counters(&self) -> &HashCounters {
        &self.counters
    }

    /// True between a completed read and the following advance.
    pub fn has_pending_view(&self) -> bool {
        self.pending.is_some()
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Reading through this reference bypasses the digest.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn hash_view(&mut self, view: &ReadBuffer, end: usize) {
        for slice in view.walk(end) {
            self.state.update(slice);
            self.counters.add_slice(slice.len());
        }
        tracing::trace!(bytes = end, segments = view.segment_count(), "hashed examined range");
    }
}

impl<R: PipeReader> PipeReader for HashPipeReader<R> {
    fn poll_read(&mut self, cx: &mut Context<'_>) -> Poll<Result<ReadResult, PipeError>> {
        let result = match self.reader.poll_read(cx) {
            Poll::Ready(Ok(result)) => result,
            other => return other,
        };
        self.pending = Some(result.buffer.clone());
        Poll::Ready(Ok(result))
    }

    // Everything returned here counts as examined; there is no advance step.
    fn try_read(&mut self) -> Result<Option<ReadResult>, PipeError> {
        let result = self.reader.try_read()?;
        if let Some(result) = &result {
            self.hash_view(&result.buffer, result.buffer.len());
            self.counters.add_try_read();
        }
        Ok(result)
    }

    fn advance_to(&mut self, consumed: usize, examined: usize) -> Result<(), PipeError> {
        let Some(view) = self.pending.as_ref() else {
            tracing::warn!(consumed, examined, "advance without a pending read");
            return Err(PipeError::ProtocolMisuse("read must complete before advance_to"));
        };
        if consumed > examined || examined > view.len() {
            return Err(PipeError::InvalidPosition {
                consumed,
                examined,
                len: view.len(),
            });
        }

        // Digest only moves once the wrapped reader has taken the cursors.
        let mut next = self.state.clone();
        for slice in view.walk(examined) {
            next.update(slice);
        }
        self.reader.advance_to(consumed, examined)?;

        self.state = next;
        for slice in view.walk(examined) {
            self.counters.add_slice(slice.len());
        }
        tracing::trace!(bytes = examined, segments = view.segment_count(), "hashed examined range");
        self.pending = None;
        self.counters.add_advance();
        Ok(())
    }

    fn cancel_pending_read(&mut self) {
        self.reader.cancel_pending_read()
    }

    fn complete(&mut self, error: Option<PipeError>) {
        tracing::debug!(
            bytes_hashed = self.counters.bytes_hashed,
            failed = error.is_some(),
            "hashing pipe reader completed"
        );
        self.reader.complete(error)
    }
}

impl<R> std::fmt::Debug for HashPipeReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashPipeReader")
            .field("alg", &self.state.alg())
            .field("pending", &self.pending.as_ref().map(ReadBuffer::len))
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
