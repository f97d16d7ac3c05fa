// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The AAC ADTS stream synchronizer (spec.md §4.3): same scanning envelope as the MP3
//! synchronizer, but validating only the sync word (no reference-header mask) and confirming
//! successors purely by sync-word match at the computed frame-size offset.

use log::{debug, trace};

use framesync_core::io::{ScanWindow, StreamHandle};
use framesync_core::types::SyncLimits;
use framesync_core::Result;

use crate::adts::{is_sync_word, parse_adts_header, ADTS_HEADER_LEN};

fn read_adts_header(window: &mut ScanWindow<'_>, pos: i64) -> Result<Option<[u8; ADTS_HEADER_LEN]>> {
    let bytes = window.read(pos, ADTS_HEADER_LEN)?;
    if bytes.len() < ADTS_HEADER_LEN {
        return Ok(None);
    }
    let mut buf = [0u8; ADTS_HEADER_LEN];
    buf.copy_from_slice(bytes);
    Ok(Some(buf))
}

fn confirm_successors(
    window: &mut ScanWindow<'_>,
    candidate: i64,
    frame_size: usize,
    match_required: usize,
) -> Result<bool> {
    let mut next_pos = candidate + frame_size as i64;

    for _ in 0..match_required {
        let buf = match read_adts_header(window, next_pos)? {
            Some(b) => b,
            None => return Ok(false),
        };

        if !is_sync_word(buf[0], buf[1]) {
            return Ok(false);
        }

        let header = match parse_adts_header(&buf) {
            Ok(h) => h,
            Err(_) => return Ok(false),
        };

        next_pos += header.frame_size_bytes as i64;
    }

    Ok(true)
}

/// Scan forward from `*pos` for a sync-word-confirmed ADTS frame header. ADTS streams carry no
/// ID3v2 metadata, so unlike `resync_mp3` there is no leading-metadata skip.
pub fn resync_aac(stream: &mut dyn StreamHandle, pos: &mut i64, limits: &SyncLimits) -> Result<bool> {
    let start = *pos;
    let mut candidate = start;
    let mut window = ScanWindow::new(stream, limits.read_bytes);

    while (candidate - start) < limits.max_check_bytes as i64 {
        let buf = match read_adts_header(&mut window, candidate)? {
            Some(b) => b,
            None => break,
        };

        if !is_sync_word(buf[0], buf[1]) {
            candidate += 1;
            continue;
        }

        let header = match parse_adts_header(&buf) {
            Ok(h) => h,
            Err(_) => {
                candidate += 1;
                continue;
            }
        };

        if confirm_successors(&mut window, candidate, header.frame_size_bytes, limits.match_required)? {
            *pos = candidate;
            debug!("aac resync confirmed frame at pos {candidate}");
            return Ok(true);
        }

        trace!("aac candidate at {candidate} rejected, backtracking one byte");
        candidate += 1;
    }

    Ok(false)
}
