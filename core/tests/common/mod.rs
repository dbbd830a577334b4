//! In-memory segmented pipe used by the integration tests.
//!
//! Committed bytes are split into `segment_size` chunks, so views handed to the
//! reader span several segments once more than one chunk is buffered. A flush
//! waits while the reader lags `pause_writer_threshold` bytes behind and resumes
//! once it falls under `resume_writer_threshold`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use futures::future::BoxFuture;

use hashpipe_core::constants::{
    DEFAULT_PAUSE_WRITER_THRESHOLD, DEFAULT_RESUME_WRITER_THRESHOLD, DEFAULT_SEGMENT_SIZE,
};
use hashpipe_core::{
    FlushResult, PipeError, PipeReader, PipeWriter, PipeWriterExt, ReadBuffer, ReadResult,
};

#[derive(Debug, Clone, Copy)]
pub struct PipeOptions {
    pub segment_size: usize,
    pub pause_writer_threshold: usize,
    pub resume_writer_threshold: usize,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            pause_writer_threshold: DEFAULT_PAUSE_WRITER_THRESHOLD,
            resume_writer_threshold: DEFAULT_RESUME_WRITER_THRESHOLD,
        }
    }
}

impl PipeOptions {
    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size.max(1);
        self
    }
}

#[derive(Default)]
struct State {
    readable: VecDeque<Bytes>,
    readable_len: usize,
    // Bytes at the front of `readable` the reader has already examined.
    examined: usize,
    unflushed: Vec<Bytes>,
    // Length of the outstanding view, if a read is in progress.
    view_len: Option<usize>,
    read_canceled: bool,
    flush_canceled: bool,
    writer_completed: bool,
    writer_error: Option<String>,
    reader_completed: bool,
    read_waker: Option<Waker>,
    flush_waker: Option<Waker>,
}

impl State {
    fn view(&self) -> ReadBuffer {
        ReadBuffer::new(self.readable.iter().cloned())
    }

    fn publish(&mut self) {
        for seg in self.unflushed.drain(..) {
            self.readable_len += seg.len();
            self.readable.push_back(seg);
        }
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
    }

    fn consume(&mut self, mut n: usize) {
        self.readable_len -= n;
        while n > 0 {
            let Some(front) = self.readable.front_mut() else { break };
            if front.len() <= n {
                n -= front.len();
                self.readable.pop_front();
            } else {
                let _ = front.split_to(n);
                n = 0;
            }
        }
    }
}

type Shared = Arc<Mutex<State>>;

fn lock(shared: &Shared) -> MutexGuard<'_, State> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a connected writer/reader pair.
pub fn pipe(options: PipeOptions) -> (MemoryWriter, MemoryReader) {
    let shared: Shared = Arc::new(Mutex::new(State::default()));
    (
        MemoryWriter { shared: shared.clone(), scratch: Vec::new(), options },
        MemoryReader { shared, options },
    )
}

pub struct MemoryWriter {
    shared: Shared,
    scratch: Vec<u8>,
    options: PipeOptions,
}

impl PipeWriter for MemoryWriter {
    fn get_memory(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError> {
        if lock(&self.shared).writer_completed {
            return Err(PipeError::WriterCompleted);
        }
        self.scratch = vec![0; size_hint.max(1)];
        Ok(&mut self.scratch[..])
    }

    fn get_span(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError> {
        self.get_memory(size_hint)
    }

    fn pending_memory(&self) -> &[u8] {
        &self.scratch
    }

    fn advance(&mut self, count: usize) -> Result<(), PipeError> {
        if count > self.scratch.len() {
            return Err(PipeError::ProtocolMisuse("advance past the granted memory region"));
        }
        let mut state = lock(&self.shared);
        if state.writer_completed {
            return Err(PipeError::WriterCompleted);
        }
        for chunk in self.scratch[..count].chunks(self.options.segment_size) {
            state.unflushed.push(Bytes::copy_from_slice(chunk));
        }
        drop(state);
        self.scratch.clear();
        Ok(())
    }

    fn write<'a>(&'a mut self, source: &'a [u8]) -> BoxFuture<'a, Result<FlushResult, PipeError>> {
        Box::pin(async move {
            self.write_all_committed(source)?;
            self.flush().await
        })
    }

    fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<FlushResult, PipeError>> {
        let mut state = lock(&self.shared);
        state.publish();

        if state.flush_canceled {
            state.flush_canceled = false;
            return Poll::Ready(Ok(FlushResult { is_canceled: true, is_completed: state.reader_completed }));
        }
        if state.reader_completed {
            return Poll::Ready(Ok(FlushResult { is_canceled: false, is_completed: true }));
        }
        if state.readable_len >= self.options.pause_writer_threshold {
            state.flush_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        Poll::Ready(Ok(FlushResult::default()))
    }

    fn cancel_pending_flush(&mut self) {
        let mut state = lock(&self.shared);
        state.flush_canceled = true;
        if let Some(waker) = state.flush_waker.take() {
            waker.wake();
        }
    }

    fn complete(&mut self, error: Option<PipeError>) {
        let mut state = lock(&self.shared);
        state.writer_completed = true;
        state.writer_error = error.map(|e| e.to_string());
        state.publish();
    }
}

pub struct MemoryReader {
    shared: Shared,
    options: PipeOptions,
}

impl MemoryReader {
    fn ready_result(state: &mut State) -> Option<Result<ReadResult, PipeError>> {
        if state.reader_completed {
            return Some(Err(PipeError::ReaderCompleted));
        }
        if state.read_canceled {
            state.read_canceled = false;
            state.view_len = Some(state.readable_len);
            return Some(Ok(ReadResult::new(state.view(), true, state.writer_completed)));
        }
        if let Some(msg) = &state.writer_error {
            return Some(Err(PipeError::Faulted(msg.clone())));
        }
        if state.readable_len > state.examined || state.writer_completed {
            state.view_len = Some(state.readable_len);
            return Some(Ok(ReadResult::new(state.view(), false, state.writer_completed)));
        }
        None
    }
}

impl PipeReader for MemoryReader {
    fn poll_read(&mut self, cx: &mut Context<'_>) -> Poll<Result<ReadResult, PipeError>> {
        let mut state = lock(&self.shared);
        match Self::ready_result(&mut state) {
            Some(result) => Poll::Ready(result),
            None => {
                state.read_waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    fn try_read(&mut self) -> Result<Option<ReadResult>, PipeError> {
        let mut state = lock(&self.shared);
        Self::ready_result(&mut state).transpose()
    }

    fn advance_to(&mut self, consumed: usize, examined: usize) -> Result<(), PipeError> {
        let mut state = lock(&self.shared);
        if state.reader_completed {
            return Err(PipeError::ReaderCompleted);
        }
        let Some(len) = state.view_len else {
            return Err(PipeError::ProtocolMisuse("no read in progress"));
        };
        if consumed > examined || examined > len {
            return Err(PipeError::InvalidPosition { consumed, examined, len });
        }

        state.consume(consumed);
        state.examined = examined - consumed;
        state.view_len = None;

        if state.readable_len < self.options.resume_writer_threshold {
            if let Some(waker) = state.flush_waker.take() {
                waker.wake();
            }
        }
        Ok(())
    }

    fn cancel_pending_read(&mut self) {
        let mut state = lock(&self.shared);
        state.read_canceled = true;
        if let Some(waker) = state.read_waker.take() {
            waker.wake();
        }
    }

    fn complete(&mut self, _error: Option<PipeError>) {
        let mut state = lock(&self.shared);
        state.reader_completed = true;
        if let Some(waker) = state.flush_waker.take() {
            waker.wake();
        }
    }
}

/// Deterministic pseudo-random bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    use rand::{rngs::StdRng, RngCore, SeedableRng};
    let mut buf = vec![0u8; len];
    StdRng::seed_from_u64(len as u64).fill_bytes(&mut buf);
    buf
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).to_vec()
}

/// Route decorator logs to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
