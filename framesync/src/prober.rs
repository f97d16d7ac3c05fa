// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The type prober (spec.md §4.4): classifies a fresh stream as MP3, AAC, or Unknown by trial
//! syncing, without committing the caller to any position advance.

use framesync_core::io::StreamHandle;
use framesync_core::types::{AudioType, SyncLimits};
use framesync_core::Result;

use framesync_aac::resync_aac;
use framesync_mp3::resync_mp3;

/// A guard that disables ring-buffer dequeue on construction and restores the prior setting on
/// drop. Every trial sync performed by `probe` runs inside this guard, since the probe's
/// positional reads must not authorize the producer to release bytes the caller still needs.
struct SuppressDequeue<'a> {
    stream: &'a mut dyn StreamHandle,
    prior: bool,
}

impl<'a> SuppressDequeue<'a> {
    fn new(stream: &'a mut dyn StreamHandle) -> Self {
        let prior = stream.ctrl_allow_dequeue(false);
        SuppressDequeue { stream, prior }
    }
}

impl Drop for SuppressDequeue<'_> {
    fn drop(&mut self) {
        self.stream.ctrl_allow_dequeue(self.prior);
    }
}

/// Classify the audio elementary stream starting at the stream's current head.
///
/// 1. An `"ID3"` prefix at offset 0 is treated as MP3 without a full trial resync, since ID3v2
///    metadata is specific to MP3 streams in this core's scope.
/// 2. Otherwise, a suppressed-dequeue trial `resync_mp3` decides MP3.
/// 3. An `"ADIF"` prefix is rejected outright (unsupported, never classified as AAC).
/// 4. Otherwise, a suppressed-dequeue trial `resync_aac` decides AAC.
/// 5. Anything else is `Unknown`.
pub fn probe(stream: &mut dyn StreamHandle, limits: &SyncLimits) -> Result<AudioType> {
    let mut prefix = [0u8; 10];
    let n = stream.read_at(0, &mut prefix)?;

    if n >= 3 && &prefix[0..3] == b"ID3" {
        return Ok(AudioType::Mp3);
    }

    {
        let mut guard = SuppressDequeue::new(stream);
        let mut pos = 0i64;
        if resync_mp3(guard.stream, 0, &mut pos, limits)?.is_some() {
            return Ok(AudioType::Mp3);
        }
    }

    let mut adif = [0u8; 4];
    let n = stream.read_at(0, &mut adif)?;
    if n >= 4 && adif == *b"ADIF" {
        return Ok(AudioType::Unknown);
    }

    {
        let mut guard = SuppressDequeue::new(stream);
        let mut pos = 0i64;
        if resync_aac(guard.stream, &mut pos, limits)? {
            return Ok(AudioType::Aac);
        }
    }

    Ok(AudioType::Unknown)
}
