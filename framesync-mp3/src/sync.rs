// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The MP3 stream synchronizer (spec.md §4.2): locates the next frame header, confirmed by a
//! chain of successor frames, recovering from loss of sync in the presence of leading ID3v2
//! metadata or arbitrary garbage bytes.

use log::{debug, trace};

use framesync_core::io::{ScanWindow, StreamHandle};
use framesync_core::types::SyncLimits;
use framesync_core::Result;

use crate::header::{check_header, parse_frame_header, FIXED_HEADER_MASK, MPEG_HEADER_LEN};

/// Skip any leading ID3v2 header(s) starting at `pos`. Tolerates multiple concatenated ID3v2
/// headers, as real-world encoders occasionally emit. Only called when `pos == 0`, per spec.
fn skip_id3v2(stream: &mut dyn StreamHandle, pos: &mut i64) -> Result<()> {
    loop {
        let mut buf = [0u8; 10];
        let n = stream.read_at(*pos, &mut buf)?;
        if n < 10 || &buf[0..3] != b"ID3" {
            return Ok(());
        }

        let size = ((buf[6] as u32 & 0x7F) << 21)
            | ((buf[7] as u32 & 0x7F) << 14)
            | ((buf[8] as u32 & 0x7F) << 7)
            | (buf[9] as u32 & 0x7F);

        trace!("skipping id3v2 header of {size} bytes at pos {}", *pos);
        *pos += 10 + size as i64;
    }
}

/// Read a big-endian 32-bit header word at `pos` through the rolling scan window, returning
/// `None` on a short read (end of available data, not an error worth propagating out of the
/// scanner).
fn read_header_word(window: &mut ScanWindow<'_>, pos: i64) -> Result<Option<u32>> {
    let bytes = window.read(pos, MPEG_HEADER_LEN)?;
    if bytes.len() < MPEG_HEADER_LEN {
        return Ok(None);
    }
    let mut buf = [0u8; MPEG_HEADER_LEN];
    buf.copy_from_slice(bytes);
    Ok(Some(u32::from_be_bytes(buf)))
}

/// Check that `header` at `candidate` is confirmed by `match_required` further consistent
/// frames, starting right after the frame `header` claims for itself.
fn confirm_successors(
    window: &mut ScanWindow<'_>,
    header: u32,
    candidate: i64,
    match_header: u32,
    match_required: usize,
) -> Result<bool> {
    let first = match parse_frame_header(header) {
        Ok(h) => h,
        Err(_) => return Ok(false),
    };

    // `frame_size_bytes` is the total size of the frame including its own 4-byte header, so the
    // next frame's header starts exactly that many bytes after this one.
    let mut next_pos = candidate + first.frame_size_bytes as i64;

    for _ in 0..match_required {
        let next_header = match read_header_word(window, next_pos)? {
            Some(h) => h,
            None => return Ok(false),
        };

        if match_header != 0 && (next_header & FIXED_HEADER_MASK) != (match_header & FIXED_HEADER_MASK) {
            return Ok(false);
        }

        let parsed = match parse_frame_header(next_header) {
            Ok(h) => h,
            Err(_) => return Ok(false),
        };

        next_pos += parsed.frame_size_bytes as i64;
    }

    Ok(true)
}

/// Scan forward from `*pos` for a valid, successor-confirmed MP3 frame header.
///
/// If `match_header != 0`, candidates are additionally required to agree with `match_header` on
/// the session-invariant bits (`FIXED_HEADER_MASK`). On success, `*pos` is updated to the start
/// of the confirmed header and the raw header word is returned. On failure (scan budget
/// exhausted or end of available data), `*pos` is left where the scan gave up and `None` is
/// returned; translating this into an end-of-stream signal is the caller's responsibility.
pub fn resync_mp3(
    stream: &mut dyn StreamHandle,
    match_header: u32,
    pos: &mut i64,
    limits: &SyncLimits,
) -> Result<Option<u32>> {
    if *pos == 0 {
        skip_id3v2(stream, pos)?;
    }

    let start = *pos;
    let mut candidate = start;
    let mut window = ScanWindow::new(stream, limits.read_bytes);

    while (candidate - start) < limits.max_check_bytes as i64 {
        let header = match read_header_word(&mut window, candidate)? {
            Some(h) => h,
            None => break,
        };

        if match_header != 0 && (header & FIXED_HEADER_MASK) != (match_header & FIXED_HEADER_MASK) {
            candidate += 1;
            continue;
        }

        if !check_header(header) {
            candidate += 1;
            continue;
        }

        if confirm_successors(&mut window, header, candidate, match_header, limits.match_required)? {
            *pos = candidate;
            debug!("mp3 resync confirmed header 0x{header:08x} at pos {candidate}");
            return Ok(Some(header));
        }

        // Byte-granular backtracking: a rejected candidate advances the scan by exactly one
        // byte, never by the claimed (and unverified) frame size.
        candidate += 1;
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesync_core::io::RingBufferStream;

    fn valid_frame_128kbps_44100() -> Vec<u8> {
        // FF FB 90 00 header, 417-byte frame, body padded with deterministic filler so
        // consecutive frames don't accidentally look like headers themselves.
        let mut frame = vec![0xFFu8, 0xFB, 0x90, 0x00];
        frame.resize(417, 0xAA);
        frame
    }

    #[test]
    fn finds_frame_after_id3v2_header() {
        // Confirmation needs FRAME_MATCH_REQUIRED (2) further consistent frames beyond the
        // candidate, so three frames must follow the ID3v2 header for this to succeed.
        let mut data = Vec::new();
        data.extend_from_slice(b"ID3");
        data.extend_from_slice(&[3, 0, 0, 0, 0, 0, 0x20]); // syncsafe length = 32
        data.extend_from_slice(&[0u8; 32]);
        for _ in 0..3 {
            data.extend_from_slice(&valid_frame_128kbps_44100());
        }

        let mut stream = RingBufferStream::from_bytes(&data);
        let mut pos = 0i64;
        let limits = SyncLimits::default();
        let found = resync_mp3(&mut stream, 0, &mut pos, &limits).unwrap();
        assert!(found.is_some());
        assert_eq!(pos, 42);
    }

    #[test]
    fn skips_false_positive_before_genuine_frame() {
        let mut data = vec![0u8; 2000];
        data.extend_from_slice(&valid_frame_128kbps_44100());
        data.extend_from_slice(&valid_frame_128kbps_44100());
        data.extend_from_slice(&valid_frame_128kbps_44100());

        let mut stream = RingBufferStream::from_bytes(&data);
        let mut pos = 0i64;
        let limits = SyncLimits::default();
        let found = resync_mp3(&mut stream, 0, &mut pos, &limits).unwrap();
        assert!(found.is_some());
        assert_eq!(pos, 2000);
    }

    #[test]
    fn gives_up_after_max_check_bytes() {
        let limits = SyncLimits { max_check_bytes: 64, ..Default::default() };
        let mut data = vec![0u8; 200];
        data.extend_from_slice(&valid_frame_128kbps_44100());

        let mut stream = RingBufferStream::from_bytes(&data);
        let mut pos = 0i64;
        let found = resync_mp3(&mut stream, 0, &mut pos, &limits).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn small_read_bytes_chunk_size_does_not_change_the_result() {
        // A `read_bytes` smaller than a single frame forces the scan window to refill
        // repeatedly; the confirmed position must be identical to the default chunk size.
        let mut data = vec![0u8; 2000];
        data.extend_from_slice(&valid_frame_128kbps_44100());
        data.extend_from_slice(&valid_frame_128kbps_44100());
        data.extend_from_slice(&valid_frame_128kbps_44100());

        let mut stream = RingBufferStream::from_bytes(&data);
        let mut pos = 0i64;
        let limits = SyncLimits { read_bytes: 4, ..Default::default() };
        let found = resync_mp3(&mut stream, 0, &mut pos, &limits).unwrap();
        assert!(found.is_some());
        assert_eq!(pos, 2000);
    }

    #[test]
    fn mask_violation_after_desync_is_rejected() {
        // A header that is individually valid but whose invariant bits differ from the
        // reference (e.g. different sampling rate index) must be rejected even though it
        // parses cleanly on its own.
        let mut data = valid_frame_128kbps_44100();
        // A differently-sampled (48kHz) MPEG-1 Layer III frame: FF FB A0 00 (sr idx 1).
        let mut other = vec![0xFFu8, 0xFB, 0xA0, 0x00];
        other.resize(384, 0xBB);
        data.extend_from_slice(&other);

        let reference_header = 0xFFFB_9000u32;
        let mut stream = RingBufferStream::from_bytes(&data);
        let mut pos = 417; // just past the first (reference) frame
        let limits = SyncLimits::default();
        let found = resync_mp3(&mut stream, reference_header, &mut pos, &limits).unwrap();
        assert!(found.is_none());
    }
}
