// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The decoder adapter contract (§1 "Out of scope", §4.6, §6.3): the actual MP3/AAC decoders are
//! external collaborators. The dispatcher only feeds them complete frame payloads and reads back
//! PCM descriptors through this trait; it never interprets decoder-internal buffer layouts.

use framesync_core::errors::Result;
use framesync_core::types::PcmDescriptor;

/// Byte sizes of the opaque buffers a decoder adapter needs, queried by `init_decoder` before
/// allocation.
#[derive(Copy, Clone, Debug, Default)]
pub struct BufferSizes {
    /// Size of the caller-visible "external" buffer, exposed to the `config` callback so the
    /// caller may set decoder parameters before the first frame.
    pub external_bytes: usize,
    /// Size of the decoder's private working memory, never exposed to the caller.
    pub memory_bytes: usize,
}

/// A decoder that consumes complete elementary-stream frames and produces PCM.
///
/// The dispatcher owns a `Box<dyn DecoderAdapter>` per session rather than a generic type
/// parameter, so `Session` itself stays free of a decoder type parameter (spec.md §9, "opaque
/// decoder buffers": do not embed decoder types into the core's type system). The decoded PCM
/// borrows from `&mut self`, mirroring how Symphonia's codec traits hand back a buffer borrowed
/// from the decoder's own internal state rather than from the call's arguments.
pub trait DecoderAdapter {
    /// Report the buffer sizes this decoder requires. Queried once, before `init`.
    fn queried_buffer_sizes(&self) -> BufferSizes;

    /// Reset any internal decode state, discarding partial frames. Called once before `init`.
    fn reset(&mut self);

    /// Initialize the decoder using the external buffer as configured by the `config` callback.
    fn init(&mut self, external: &mut [u8], memory: &mut [u8]) -> Result<()>;

    /// Decode one complete frame payload, returning the produced PCM.
    ///
    /// Valid only until the next call to `decode_frame`.
    fn decode_frame(
        &mut self,
        frame: &[u8],
        external: &mut [u8],
        memory: &mut [u8],
    ) -> Result<PcmDescriptor<'_>>;
}

/// A decoder fixture used by tests and examples that only need to exercise the framing layer,
/// not an actual MP3 decode. Produces silence sized to the frame payload.
#[derive(Default)]
pub struct NullMp3Decoder {
    samples: Vec<i16>,
}

impl DecoderAdapter for NullMp3Decoder {
    fn queried_buffer_sizes(&self) -> BufferSizes {
        BufferSizes { external_bytes: 0, memory_bytes: 0 }
    }

    fn reset(&mut self) {
        self.samples.clear();
    }

    fn init(&mut self, _external: &mut [u8], _memory: &mut [u8]) -> Result<()> {
        Ok(())
    }

    fn decode_frame(
        &mut self,
        frame: &[u8],
        _external: &mut [u8],
        _memory: &mut [u8],
    ) -> Result<PcmDescriptor<'_>> {
        self.samples.clear();
        self.samples.resize(frame.len(), 0);
        Ok(PcmDescriptor { samples: &self.samples, channels: 1, samplerate_hz: 44_100 })
    }
}

/// A decoder fixture for AAC framing tests, analogous to `NullMp3Decoder`.
#[derive(Default)]
pub struct NullAacDecoder {
    samples: Vec<i16>,
}

impl DecoderAdapter for NullAacDecoder {
    fn queried_buffer_sizes(&self) -> BufferSizes {
        BufferSizes { external_bytes: 0, memory_bytes: 0 }
    }

    fn reset(&mut self) {
        self.samples.clear();
    }

    fn init(&mut self, _external: &mut [u8], _memory: &mut [u8]) -> Result<()> {
        Ok(())
    }

    fn decode_frame(
        &mut self,
        frame: &[u8],
        _external: &mut [u8],
        _memory: &mut [u8],
    ) -> Result<PcmDescriptor<'_>> {
        self.samples.clear();
        self.samples.resize(frame.len(), 0);
        Ok(PcmDescriptor { samples: &self.samples, channels: 2, samplerate_hz: 48_000 })
    }
}
