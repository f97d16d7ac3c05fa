// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The MP3 frame pump (spec.md §4.5): the per-frame fast path, falling back to the synchronizer
//! on loss of sync.

use log::trace;

use framesync_core::io::{ScopedRelease, StreamHandle};
use framesync_core::types::SyncLimits;
use framesync_core::Result;

use crate::header::{parse_frame_header, FIXED_HEADER_MASK, MPEG_HEADER_LEN};
use crate::sync::resync_mp3;

/// Read the next MP3 frame at `*pos` into `out_buf`, returning its size in bytes.
///
/// Fast path: if the header at `*pos` matches `fixed_header` on the session-invariant bits and
/// parses, the frame is emitted directly. Otherwise sync has been lost; `resync_mp3` is invoked
/// with `fixed_header` as the reference. Returns `Ok(None)` when resync cannot confirm another
/// frame (end of stream).
///
/// Every mutation of `*pos` is published to the stream via `seek_ext` before returning, including
/// on the resync-failure exit path, via the `ScopedRelease` guard.
pub fn get_frame_mp3(
    stream: &mut dyn StreamHandle,
    pos: &mut i64,
    fixed_header: u32,
    limits: &SyncLimits,
    out_buf: &mut Vec<u8>,
) -> Result<Option<usize>> {
    let mut release = ScopedRelease::new(stream);

    loop {
        let mut header_buf = [0u8; MPEG_HEADER_LEN];
        let n = release.stream_mut().read_at(*pos, &mut header_buf)?;
        let header = if n == MPEG_HEADER_LEN {
            Some(u32::from_be_bytes(header_buf))
        } else {
            None
        };

        let valid = header.and_then(|h| {
            if (h & FIXED_HEADER_MASK) == (fixed_header & FIXED_HEADER_MASK) {
                parse_frame_header(h).ok()
            } else {
                None
            }
        });

        if let Some(parsed) = valid {
            out_buf.resize(parsed.frame_size_bytes, 0);
            release.stream_mut().read_at_exact(*pos, out_buf)?;
            *pos += parsed.frame_size_bytes as i64;
            release.publish(*pos);
            return Ok(Some(parsed.frame_size_bytes));
        }

        trace!("mp3 frame pump lost sync at pos {}, resyncing", *pos);
        match resync_mp3(release.stream_mut(), fixed_header, pos, limits)? {
            Some(_) => {
                release.publish(*pos);
                continue;
            }
            None => {
                release.publish(*pos);
                return Ok(None);
            }
        }
    }
}
