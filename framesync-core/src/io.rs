// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module defines the stream contract the framing core consumes, and ships one
//! reference implementation of it (`RingBufferStream`) for tests and examples.
//!
//! The real producer-side ring buffer is an external collaborator (see the crate-level docs):
//! this module only specifies the shape a ring-backed stream handle must have to be usable by
//! the synchronizers and frame pumps.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::errors::{short_read, Result};

/// Relative position for a `seek`/`seek_ext` call.
#[derive(Copy, Clone, Debug)]
pub enum SeekFrom {
    /// Absolute offset from the start of the logical stream.
    Start(i64),
    /// Offset relative to the current read cursor.
    Current(i64),
    /// Offset relative to the highest byte ever pushed.
    End(i64),
}

/// The contract the framing core requires from a ring-backed byte stream.
///
/// `seek` relocates the read cursor without authorizing release of any buffered bytes.
/// `seek_ext` does the same but additionally tells the stream that everything strictly below
/// the new position may be handed back to the producer, provided dequeue is currently allowed
/// (see `ctrl_allow_dequeue`).
pub trait StreamHandle {
    /// Read up to `buf.len()` bytes, advancing the internal read cursor. Returns the number of
    /// bytes actually read, which may be less than `buf.len()` (including zero) on a short read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Relocate the read cursor. Does not release any buffered memory.
    fn seek(&mut self, whence: SeekFrom) -> Result<i64>;

    /// Relocate the read cursor and authorize release of bytes below the new position.
    fn seek_ext(&mut self, whence: SeekFrom) -> Result<i64>;

    /// Toggle whether `seek_ext` is permitted to release bytes to the producer. Returns the
    /// prior value of the toggle.
    fn ctrl_allow_dequeue(&mut self, allow: bool) -> bool;

    /// Producer-side push of new bytes into the stream.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Positional read built from `seek` + `read`. Does not release memory, so synchronizers
    /// that may need to rewind can use it freely.
    fn read_at(&mut self, offset: i64, buf: &mut [u8]) -> Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        self.read(buf)
    }

    /// Read exactly `buf.len()` bytes at `offset`, or fail with `ShortRead`.
    fn read_at_exact(&mut self, offset: i64, buf: &mut [u8]) -> Result<()> {
        let n = self.read_at(offset, buf)?;
        if n != buf.len() {
            return short_read();
        }
        Ok(())
    }
}

/// A RAII guard that publishes a new read-cursor position to a `StreamHandle` via `seek_ext`
/// when dropped, so every exit path of a function that advances the cursor (including an early
/// `?`-propagated error) releases consumed bytes back to the producer exactly once.
///
/// This implements the "scoped release" design note from the specification: advancing
/// `current_pos` must publish the watermark before returning, on every exit path, not just the
/// success path.
pub struct ScopedRelease<'a> {
    stream: &'a mut dyn StreamHandle,
    new_pos: Option<i64>,
}

impl<'a> ScopedRelease<'a> {
    pub fn new(stream: &'a mut dyn StreamHandle) -> Self {
        ScopedRelease { stream, new_pos: None }
    }

    /// Record the position that should be published when this guard drops.
    pub fn publish(&mut self, pos: i64) {
        self.new_pos = Some(pos);
    }

    /// Borrow the underlying stream for reads that should not themselves publish a position.
    pub fn stream_mut(&mut self) -> &mut dyn StreamHandle {
        self.stream
    }
}

impl Drop for ScopedRelease<'_> {
    fn drop(&mut self) {
        if let Some(pos) = self.new_pos {
            // Best-effort: a failure to seek on the way out of an already-erroring path isn't
            // something we can usefully propagate from a `Drop` impl.
            let _ = self.stream.seek_ext(SeekFrom::Start(pos));
        }
    }
}

/// A rolling read-ahead buffer over a `StreamHandle`, used by the format-specific synchronizers
/// to scan byte-by-byte without issuing a fresh positional read for every candidate (spec.md
/// §4.2: "a rolling buffer of `FRAME_RESYNC_READ_BYTES` bytes is refilled on demand").
///
/// The window only ever holds one contiguous chunk at a time; a request that falls outside the
/// currently buffered range triggers a fresh `chunk_len`-byte read starting at that request's
/// offset, whether the request moved forward (the common case, advancing past the buffered
/// chunk) or backward (resuming a byte-granular scan at `candidate + 1` after a successor chain
/// that looked ahead past the end of the buffer). `read_at` never releases buffered memory, so
/// re-reading an earlier offset is always safe.
pub struct ScanWindow<'s> {
    stream: &'s mut dyn StreamHandle,
    buf: Vec<u8>,
    base: i64,
    chunk_len: usize,
}

impl<'s> ScanWindow<'s> {
    /// Build a window over `stream` that refills in `chunk_len`-byte chunks.
    pub fn new(stream: &'s mut dyn StreamHandle, chunk_len: usize) -> Self {
        ScanWindow { stream, buf: Vec::new(), base: 0, chunk_len: chunk_len.max(1) }
    }

    /// Return up to `len` bytes starting at absolute offset `pos`, refilling the window with a
    /// fresh `chunk_len`-byte read if `pos` isn't already covered by the buffered range. The
    /// returned slice is shorter than `len` (including empty) at end of available data.
    pub fn read(&mut self, pos: i64, len: usize) -> Result<&[u8]> {
        let covered =
            pos >= self.base && (pos - self.base) as usize + len <= self.buf.len();

        if !covered {
            let want = self.chunk_len.max(len);
            self.buf.resize(want, 0);
            let n = self.stream.read_at(pos, &mut self.buf)?;
            self.buf.truncate(n);
            self.base = pos;
        }

        let from = (pos - self.base).max(0) as usize;
        let to = (from + len).min(self.buf.len());
        Ok(&self.buf[from.min(to)..to])
    }
}

struct RingState {
    /// Bytes currently buffered, starting at absolute offset `base`.
    data: VecDeque<u8>,
    /// Absolute stream offset of `data[0]`.
    base: i64,
    /// Absolute read cursor.
    read_pos: i64,
    /// Highest absolute offset ever pushed.
    head: i64,
    allow_dequeue: bool,
}

/// A simple reference `StreamHandle` backed by a growable ring of bytes, guarded by a single
/// handle-scoped mutex (not global state, per the specification's redesign note on the source's
/// process-wide push mutex). Intended for tests and examples; production embedders are expected
/// to back `StreamHandle` with their own ring buffer implementation.
pub struct RingBufferStream {
    state: Mutex<RingState>,
}

impl RingBufferStream {
    pub fn new() -> Self {
        RingBufferStream {
            state: Mutex::new(RingState {
                data: VecDeque::new(),
                base: 0,
                read_pos: 0,
                head: 0,
                allow_dequeue: true,
            }),
        }
    }

    /// Convenience constructor that pre-loads the stream with `bytes`, as if a producer had
    /// pushed them all up front. Used heavily by tests that exercise a static fixture.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let stream = Self::new();
        stream.write(bytes).expect("push into a fresh ring buffer cannot fail");
        stream
    }

    /// Number of bytes currently retained in the buffer (not yet released to the producer).
    pub fn buffered_len(&self) -> usize {
        self.state.lock().unwrap().data.len()
    }
}

impl Default for RingBufferStream {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(whence: SeekFrom, read_pos: i64, head: i64) -> i64 {
    match whence {
        SeekFrom::Start(off) => off,
        SeekFrom::Current(off) => read_pos + off,
        SeekFrom::End(off) => head + off,
    }
}

impl StreamHandle for RingBufferStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut st = self.state.lock().unwrap();
        let avail_from = (st.read_pos - st.base).max(0) as usize;
        if avail_from >= st.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(st.data.len() - avail_from);
        for (i, slot) in buf.iter_mut().take(n).enumerate() {
            *slot = st.data[avail_from + i];
        }
        st.read_pos += n as i64;
        Ok(n)
    }

    fn seek(&mut self, whence: SeekFrom) -> Result<i64> {
        let mut st = self.state.lock().unwrap();
        let pos = resolve(whence, st.read_pos, st.head);
        st.read_pos = pos;
        Ok(pos)
    }

    fn seek_ext(&mut self, whence: SeekFrom) -> Result<i64> {
        let mut st = self.state.lock().unwrap();
        let pos = resolve(whence, st.read_pos, st.head);
        st.read_pos = pos;

        if st.allow_dequeue {
            while st.base < pos && !st.data.is_empty() {
                st.data.pop_front();
                st.base += 1;
            }
            if st.base < pos {
                st.base = pos;
            }
        }
        Ok(pos)
    }

    fn ctrl_allow_dequeue(&mut self, allow: bool) -> bool {
        let mut st = self.state.lock().unwrap();
        let prior = st.allow_dequeue;
        st.allow_dequeue = allow;
        prior
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let mut st = self.state.lock().unwrap();
        st.data.extend(buf.iter().copied());
        st.head += buf.len() as i64;
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_advances_cursor() {
        let mut stream = RingBufferStream::from_bytes(b"hello world");
        let mut buf = [0u8; 5];
        assert_eq!(stream.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(stream.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b" worl");
    }

    #[test]
    fn seek_ext_releases_bytes_below_position() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789");
        assert_eq!(stream.buffered_len(), 10);
        stream.seek_ext(SeekFrom::Start(4)).unwrap();
        assert_eq!(stream.buffered_len(), 6);
        let mut buf = [0u8; 6];
        stream.read(&mut buf).unwrap();
        assert_eq!(&buf, b"456789");
    }

    #[test]
    fn seek_does_not_release() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789");
        stream.seek(SeekFrom::Start(4)).unwrap();
        assert_eq!(stream.buffered_len(), 10);
    }

    #[test]
    fn dequeue_can_be_suppressed() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789");
        let prior = stream.ctrl_allow_dequeue(false);
        assert!(prior);
        stream.seek_ext(SeekFrom::Start(4)).unwrap();
        assert_eq!(stream.buffered_len(), 10);
        stream.ctrl_allow_dequeue(true);
        stream.seek_ext(SeekFrom::Start(4)).unwrap();
        assert_eq!(stream.buffered_len(), 6);
    }

    #[test]
    fn read_at_does_not_release_and_is_rewindable() {
        let mut stream = RingBufferStream::from_bytes(b"abcdefgh");
        let mut buf = [0u8; 3];
        stream.read_at(5, &mut buf).unwrap();
        assert_eq!(&buf, b"fgh");
        stream.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(stream.buffered_len(), 8);
    }

    #[test]
    fn scoped_release_publishes_on_drop() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789");
        {
            let mut guard = ScopedRelease::new(&mut stream);
            guard.publish(4);
        }
        assert_eq!(stream.buffered_len(), 6);
    }

    #[test]
    fn scan_window_serves_reads_within_one_chunk() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789abcdef");
        let mut window = ScanWindow::new(&mut stream, 8);
        assert_eq!(window.read(0, 4).unwrap(), b"0123");
        assert_eq!(window.read(4, 4).unwrap(), b"4567");
    }

    #[test]
    fn scan_window_refills_past_the_current_chunk() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789abcdef");
        let mut window = ScanWindow::new(&mut stream, 4);
        assert_eq!(window.read(0, 4).unwrap(), b"0123");
        // Falls outside the first 4-byte chunk, forcing a refill starting at offset 6.
        assert_eq!(window.read(6, 4).unwrap(), b"6789");
    }

    #[test]
    fn scan_window_refills_on_backward_move() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789abcdef");
        let mut window = ScanWindow::new(&mut stream, 4);
        assert_eq!(window.read(8, 4).unwrap(), b"89ab");
        assert_eq!(window.read(0, 4).unwrap(), b"0123");
    }

    #[test]
    fn scan_window_reports_short_read_at_end_of_stream() {
        let mut stream = RingBufferStream::from_bytes(b"01234567");
        let mut window = ScanWindow::new(&mut stream, 1024);
        assert_eq!(window.read(6, 4).unwrap(), b"67");
        assert!(window.read(8, 4).unwrap().is_empty());
    }

    #[test]
    fn scan_window_does_not_release_buffered_bytes() {
        let mut stream = RingBufferStream::from_bytes(b"0123456789");
        {
            let mut window = ScanWindow::new(&mut stream, 4);
            window.read(6, 4).unwrap();
        }
        assert_eq!(stream.buffered_len(), 10);
    }
}
