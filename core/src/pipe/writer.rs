use std::cell::Cell;
use std::marker::PhantomData;
use std::task::{Context, Poll};

use futures::future::BoxFuture;

use crate::config::HashPipeConfig;
use crate::digest::{DigestAlg, DigestError, DigestState};
use crate::pipe::PipeWriter;
use crate::telemetry::HashCounters;
use crate::types::{FlushResult, PipeError};

/// Pipe writer that digests bytes as they are committed.
///
/// Memory handed out by `get_memory` is not hashed; only the `count` bytes
/// declared by the following `advance` are. A direct `write` hashes its whole
/// source once the wrapped writer has accepted it.
///
/// The type is `Send` but not `Sync`: one caller drives it at a time.
pub struct HashPipeWriter<W> {
    writer: W,
    state: DigestState,
    scratch_size: usize,
    // Length of the region granted by the last `get_memory`, until committed.
    granted: Option<usize>,
    counters: HashCounters,
    _not_sync: PhantomData<Cell<()>>,
}

impl<W: PipeWriter> HashPipeWriter<W> {
    pub fn new(writer: W, alg: DigestAlg) -> Self {
        Self::with_config(writer, HashPipeConfig::new(alg))
    }

    pub fn with_config(writer: W, config: HashPipeConfig) -> Self {
        tracing::debug!(alg = %config.alg, scratch_size = config.scratch_size, "hashing pipe writer created");
        Self {
            writer,
            state: DigestState::new(config.alg),
            scratch_size: config.scratch_size.max(1),
            granted: None,
            counters: HashCounters::default(),
            _not_sync: PhantomData,
        }
    }

    /// Build from a numeric algorithm selector; unknown ids are rejected here.
    pub fn from_algorithm_id(writer: W, id: u16) -> Result<Self, DigestError> {
        Ok(Self::new(writer, DigestAlg::from_id(id)?))
    }
}

impl<W> HashPipeWriter<W> {
    /// Digest of everything committed or written so far. Does not touch the pipe.
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

    /// True between `get_memory` and the commit that follows it.
    pub fn has_scratch(&self) -> bool {
        self.granted.is_some()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Writing through this reference bypasses the digest.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: PipeWriter> PipeWriter for HashPipeWriter<W> {
    fn get_memory(&mut self, _size_hint: usize) -> Result<&mut [u8], PipeError> {
        let memory = self.writer.get_memory(self.scratch_size)?;
        self.granted = Some(memory.len());
        Ok(memory)
    }

    fn get_span(&mut self, _size_hint: usize) -> Result<&mut [u8], PipeError> {
        Err(PipeError::Unsupported(
            "get_span is not available on a hashing writer; use get_memory and advance",
        ))
    }

    fn pending_memory(&self) -> &[u8] {
        self.writer.pending_memory()
    }

    fn advance(&mut self, count: usize) -> Result<(), PipeError> {
        let mut next = None;
        if let Some(granted) = self.granted {
            if count > granted {
                tracing::warn!(count, granted, "commit larger than granted scratch region");
                return Err(PipeError::ProtocolMisuse("advance past the granted memory region"));
            }
            let committed = self
                .writer
                .pending_memory()
                .get(..count)
                .ok_or(PipeError::ProtocolMisuse("granted memory shrank before commit"))?;
            if !committed.is_empty() {
                let mut state = self.state.clone();
                state.update(committed);
                next = Some(state);
            }
        }

        // A commit the wrapped writer refuses leaves the digest and the handle as they were.
        self.writer.advance(count)?;

        if let Some(state) = next {
            self.state = state;
            self.counters.add_slice(count);
            tracing::trace!(bytes = count, "hashed committed scratch bytes");
        }
        self.granted = None;
        self.counters.add_advance();
        Ok(())
    }

    fn write<'a>(&'a mut self, source: &'a [u8]) -> BoxFuture<'a, Result<FlushResult, PipeError>> {
        Box::pin(async move {
            let result = self.writer.write(source).await?;
            self.state.update(source);
            self.counters.add_slice(source.len());
            self.counters.add_direct_write();
            tracing::trace!(bytes = source.len(), "hashed direct write");
            Ok(result)
        })
    }

    fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<FlushResult, PipeError>> {
        self.writer.poll_flush(cx)
    }

    fn cancel_pending_flush(&mut self) {
        self.writer.cancel_pending_flush()
    }

    fn complete(&mut self, error: Option<PipeError>) {
        tracing::debug!(
            bytes_hashed = self.counters.bytes_hashed,
            failed = error.is_some(),
            "hashing pipe writer completed"
        );
        self.writer.complete(error)
    }
}

impl<W> std::fmt::Debug for HashPipeWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashPipeWriter")
            .field("alg", &self.state.alg())
            .field("scratch_size", &self.scratch_size)
            .field("granted", &self.granted)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
