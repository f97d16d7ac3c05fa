// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The AAC frame pump (spec.md §4.5): analogous to the MP3 pump, but with no session-invariant
//! header to fast-path against: every frame is validated by sync word and re-parsed.

use log::trace;

use framesync_core::io::{ScopedRelease, StreamHandle};
use framesync_core::types::SyncLimits;
use framesync_core::Result;

use crate::adts::{is_sync_word, parse_adts_header, ADTS_HEADER_LEN};
use crate::sync::resync_aac;

/// Read the next ADTS frame at `*pos` into `out_buf`, returning its size in bytes.
///
/// Fast path: if the header at `*pos` carries a valid sync word and parses, the frame is emitted
/// directly. Otherwise sync has been lost and `resync_aac` is invoked. Returns `Ok(None)` when
/// resync cannot confirm another frame.
pub fn get_frame_aac(
    stream: &mut dyn StreamHandle,
    pos: &mut i64,
    limits: &SyncLimits,
    out_buf: &mut Vec<u8>,
) -> Result<Option<usize>> {
    let mut release = ScopedRelease::new(stream);

    loop {
        let mut header_buf = [0u8; ADTS_HEADER_LEN];
        let n = release.stream_mut().read_at(*pos, &mut header_buf)?;

        let valid = if n == ADTS_HEADER_LEN && is_sync_word(header_buf[0], header_buf[1]) {
            parse_adts_header(&header_buf).ok()
        } else {
            None
        };

        if let Some(parsed) = valid {
            out_buf.resize(parsed.frame_size_bytes, 0);
            release.stream_mut().read_at_exact(*pos, out_buf)?;
            *pos += parsed.frame_size_bytes as i64;
            release.publish(*pos);
            return Ok(Some(parsed.frame_size_bytes));
        }

        trace!("aac frame pump lost sync at pos {}, resyncing", *pos);
        if resync_aac(release.stream_mut(), pos, limits)? {
            release.publish(*pos);
            continue;
        } else {
            release.publish(*pos);
            return Ok(None);
        }
    }
}
