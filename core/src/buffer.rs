//! Buffered view over a pipe's unconsumed bytes.
//!
//! A `ReadBuffer` is an ordered list of `Bytes` segments. Each segment is a shared
//! handle over memory owned by the pipe, so cloning or slicing a view never copies
//! payload bytes. A view describes the pipe as it was when the read completed; once
//! the reader advances, the view must not be handed back to the pipe again.

use std::iter::FusedIterator;

use bytes::Bytes;

/// Possibly segmented snapshot of buffered bytes, in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadBuffer {
    segments: Vec<Bytes>,
    len: usize,
}

impl ReadBuffer {
    /// Build a view from segments in stream order. Empty segments are dropped.
    pub fn new<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        let segments: Vec<Bytes> = segments.into_iter().filter(|s| !s.is_empty()).collect();
        let len = segments.iter().map(Bytes::len).sum();
        Self { segments, len }
    }

    pub fn from_segment(segment: impl Into<Bytes>) -> Self {
        Self::new(std::iter::once(segment.into()))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the whole view is one contiguous region (an empty view counts).
    pub fn is_single_segment(&self) -> bool {
        self.segments.len() <= 1
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// First contiguous region, or an empty slice for an empty view.
    pub fn first_segment(&self) -> &[u8] {
        self.segments.first().map(|s| &s[..]).unwrap_or(&[])
    }

    pub fn segments(&self) -> impl Iterator<Item = &Bytes> + '_ {
        self.segments.iter()
    }

    /// Zero-copy sub-view covering `[start, end)`, clamped to the view length.
    pub fn slice(&self, start: usize, end: usize) -> ReadBuffer {
        let end = end.min(self.len);
        let start = start.min(end);

        let mut out = Vec::new();
        let mut seg_start = 0;
        for seg in &self.segments {
            let seg_end = seg_start + seg.len();
            if seg_end > start && seg_start < end {
                let from = start.saturating_sub(seg_start);
                let to = (end - seg_start).min(seg.len());
                out.push(seg.slice(from..to));
            }
            if seg_end >= end {
                break;
            }
            seg_start = seg_end;
        }
        ReadBuffer::new(out)
    }

    /// Copy the whole view into one vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for seg in &self.segments {
            out.extend_from_slice(seg);
        }
        out
    }

    /// Contiguous slices covering `[0, end)` of this view, in order.
    ///
    /// `end` past the view length is clamped.
    pub fn walk(&self, end: usize) -> SegmentWalker<'_> {
        SegmentWalker {
            segments: self.segments.iter(),
            remaining: end.min(self.len),
        }
    }
}

impl From<Bytes> for ReadBuffer {
    fn from(segment: Bytes) -> Self {
        ReadBuffer::from_segment(segment)
    }
}

impl From<Vec<Bytes>> for ReadBuffer {
    fn from(segments: Vec<Bytes>) -> Self {
        ReadBuffer::new(segments)
    }
}

/// Iterator returned by [`ReadBuffer::walk`].
///
/// Yields whole segments until the one holding the end offset, which is sliced
/// there. Nothing is copied; the slices borrow from the originating view.
#[derive(Debug, Clone)]
pub struct SegmentWalker<'a> {
    segments: std::slice::Iter<'a, Bytes>,
    remaining: usize,
}

impl<'a> Iterator for SegmentWalker<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let seg = self.segments.next()?;
        let take = seg.len().min(self.remaining);
        self.remaining -= take;
        Some(&seg[..take])
    }
}

impl FusedIterator for SegmentWalker<'_> {}
