// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The dispatcher and session state (spec.md §3, §4.6, §9).
//!
//! Dispatch is a tagged variant `{Mp3 { fixed_header }, Aac, Unknown}` rather than a trait object
//! or function pointer table, per the specification's explicit redesign note: the audio type is
//! known once and for the life of a session, so a match on a small enum is both cheaper and
//! clearer than runtime indirection.

use framesync_core::callback::{ConfigCallback, OutputCallback};
use framesync_core::errors::{unsupported_format, FrameError};
use framesync_core::io::StreamHandle;
use framesync_core::types::{AudioType, SyncLimits};
use framesync_core::Result;

use framesync_aac::{get_frame_aac, resync_aac};
use framesync_mp3::{get_frame_mp3, resync_mp3};

use crate::prober::probe;

/// The per-variant state needed to keep pumping frames of a classified stream.
#[derive(Debug)]
enum Dispatch {
    Mp3 { fixed_header: u32 },
    Aac,
    Unknown,
}

/// Session state held by the dispatcher for the lifetime of a playback session (spec.md §3).
///
/// `decoder_external` and `decoder_memory` are opaque byte regions this type owns but does not
/// interpret; only the decoder adapter and the user's `config` callback assign them meaning.
pub struct Session {
    dispatch: Dispatch,
    current_pos: i64,
    decoder_external: Vec<u8>,
    decoder_memory: Vec<u8>,
    frames_emitted: u64,
    last_error: Option<FrameError>,
    limits: SyncLimits,
}

impl Session {
    /// Classify `stream` and locate the first frame, confirming it with the full successor chain
    /// the synchronizer requires. Allocates the decoder's opaque buffers and runs `config` and
    /// `init` on the caller-supplied decoder adapter. Fails with `UnsupportedFormat` if the
    /// stream cannot be classified, or propagates a decoder init failure.
    pub fn init(
        stream: &mut dyn StreamHandle,
        limits: SyncLimits,
        decoder: &mut dyn crate::decoder::DecoderAdapter,
        mut config: impl ConfigCallback,
    ) -> Result<Self> {
        let audio_type = probe(stream, &limits)?;

        let sizes = decoder.queried_buffer_sizes();
        let mut decoder_external = vec![0u8; sizes.external_bytes];
        let mut decoder_memory = vec![0u8; sizes.memory_bytes];

        decoder.reset();
        config(audio_type, &mut decoder_external);
        decoder.init(&mut decoder_external, &mut decoder_memory)?;

        let mut current_pos = 0i64;

        let dispatch = match audio_type {
            AudioType::Mp3 => {
                // A zero reference header imposes no mask constraint (spec.md §4.2 step 3),
                // which is exactly what's needed to locate and lock in the session's first
                // fixed header rather than compare against one that doesn't exist yet.
                match resync_mp3(stream, 0, &mut current_pos, &limits)? {
                    Some(fixed_header) => Dispatch::Mp3 { fixed_header },
                    None => return unsupported_format("could not confirm first mp3 frame"),
                }
            }
            AudioType::Aac => {
                if !resync_aac(stream, &mut current_pos, &limits)? {
                    return unsupported_format("could not confirm first aac frame");
                }
                Dispatch::Aac
            }
            AudioType::Unknown => return unsupported_format("stream could not be classified"),
        };

        Ok(Session {
            dispatch,
            current_pos,
            decoder_external,
            decoder_memory,
            frames_emitted: 0,
            last_error: None,
            limits,
        })
    }

    pub fn audio_type(&self) -> AudioType {
        match self.dispatch {
            Dispatch::Mp3 { .. } => AudioType::Mp3,
            Dispatch::Aac => AudioType::Aac,
            Dispatch::Unknown => AudioType::Unknown,
        }
    }

    pub fn current_pos(&self) -> i64 {
        self.current_pos
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn last_error(&self) -> Option<&FrameError> {
        self.last_error.as_ref()
    }

    /// Pump one frame, decode it, and invoke `output` with the resulting PCM. Returns `false` on
    /// end-of-stream or unrecoverable desync, per the `run` loop's termination condition (§5).
    pub fn get_frame(
        &mut self,
        stream: &mut dyn StreamHandle,
        decoder: &mut dyn crate::decoder::DecoderAdapter,
        mut output: impl OutputCallback,
    ) -> Result<bool> {
        let mut frame_buf = Vec::new();

        let size = match &self.dispatch {
            Dispatch::Mp3 { fixed_header } => {
                get_frame_mp3(stream, &mut self.current_pos, *fixed_header, &self.limits, &mut frame_buf)?
            }
            Dispatch::Aac => get_frame_aac(stream, &mut self.current_pos, &self.limits, &mut frame_buf)?,
            Dispatch::Unknown => return unsupported_format("no audio type classified for session"),
        };

        let size = match size {
            Some(size) => size,
            None => return Ok(false),
        };

        match decoder.decode_frame(&frame_buf[..size], &mut self.decoder_external, &mut self.decoder_memory) {
            Ok(pcm) => {
                output(&pcm);
                self.frames_emitted += 1;
            }
            Err(err) => {
                // DecodeFailed is recoverable at the session level: failed frames are silently
                // skipped by `run`, which retries `get_frame` on the next call (spec.md §7).
                self.last_error = Some(err);
            }
        }

        Ok(true)
    }
}
