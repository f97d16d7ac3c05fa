// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The public lifecycle API (§1 "Out of scope", §6.2): `init`, `push`, `run`, `finish`. A thin
//! state holder wired around the session dispatcher, the stream handle, the decoder adapter, and
//! the three user callbacks.

use framesync_core::callback::{ConfigCallback, InputCallback, OutputCallback};
use framesync_core::errors::Result;
use framesync_core::io::StreamHandle;
use framesync_core::types::{AudioType, SyncLimits};

use crate::decoder::DecoderAdapter;
use crate::session::Session;

/// Owns everything a playback session needs for its lifetime: the stream handle, the decoder
/// adapter, the session dispatcher, and the user's callbacks.
///
/// Resource ownership follows §5: the stream handle and the decoder's opaque buffers are owned
/// here, acquired in `init`, and released in `finish`.
pub struct Player<S, D, I, O> {
    stream: S,
    decoder: D,
    session: Option<Session>,
    limits: SyncLimits,
    input: I,
    output: O,
}

impl<S, D, I, O> Player<S, D, I, O>
where
    S: StreamHandle,
    D: DecoderAdapter,
    I: InputCallback,
    O: OutputCallback,
{
    /// Classify `stream`, lock in the session's framing state, and initialize `decoder` via the
    /// `config` callback. Fails if the stream cannot be classified or the decoder cannot init.
    ///
    /// `config` is only needed once, before the first frame (§4.6), so unlike `input` and
    /// `output` it is not retained past `init`.
    pub fn init(
        mut stream: S,
        mut decoder: D,
        limits: SyncLimits,
        config: impl ConfigCallback,
        input: I,
        output: O,
    ) -> Result<Self> {
        let session = Session::init(&mut stream, limits, &mut decoder, config)?;

        Ok(Player { stream, decoder, session: Some(session), limits, input, output })
    }

    /// Producer-side push of newly available bytes into the owned stream handle.
    pub fn push(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf)
    }

    /// Drive the session to completion: pump and decode frames, invoking `output` after each
    /// successful decode, pulling more input via the `input` callback whenever framing runs out
    /// of confirmed frames. Returns once `input` reports no further bytes (true end-of-stream).
    pub fn run(&mut self) -> Result<()> {
        loop {
            let session = self.session.as_mut().expect("run called after finish");

            let made_progress =
                session.get_frame(&mut self.stream, &mut self.decoder, &mut self.output)?;

            if made_progress {
                continue;
            }

            match (self.input)() {
                Some(bytes) if !bytes.is_empty() => {
                    self.stream.write(&bytes)?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Release the decoder's opaque buffers and the stream handle, ending the session. Safe to
    /// call even if `init` or `run` returned an error partway through.
    pub fn finish(mut self) -> D {
        self.session = None;
        self.decoder
    }

    pub fn audio_type(&self) -> Option<AudioType> {
        self.session.as_ref().map(Session::audio_type)
    }

    pub fn current_pos(&self) -> Option<i64> {
        self.session.as_ref().map(Session::current_pos)
    }

    pub fn frames_emitted(&self) -> u64 {
        self.session.as_ref().map_or(0, Session::frames_emitted)
    }

    pub fn limits(&self) -> &SyncLimits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesync_core::io::RingBufferStream;

    use crate::decoder::NullMp3Decoder;

    fn mp3_frame(header: [u8; 4], total_len: usize, fill: u8) -> Vec<u8> {
        let mut f = header.to_vec();
        f.resize(total_len, fill);
        f
    }

    #[test]
    fn plays_a_fully_buffered_mp3_stream_to_completion() {
        let frame = mp3_frame([0xFF, 0xFB, 0x90, 0x00], 417, 0xAA);
        let mut data = Vec::new();
        for _ in 0..3 {
            data.extend_from_slice(&frame);
        }

        let stream = RingBufferStream::from_bytes(&data);
        let decoder = NullMp3Decoder::default();
        let mut decoded_frames = 0usize;

        let mut player = Player::init(
            stream,
            decoder,
            SyncLimits::default(),
            |_audio_type, _external| {},
            || None::<Vec<u8>>,
            |_pcm| {
                decoded_frames += 1;
            },
        )
        .unwrap();

        assert_eq!(player.audio_type(), Some(AudioType::Mp3));

        player.run().unwrap();

        assert_eq!(decoded_frames, 3);
        assert_eq!(player.frames_emitted(), 3);
        assert_eq!(player.current_pos(), Some(data.len() as i64));
    }

    #[test]
    fn run_pulls_more_input_via_callback_until_exhausted() {
        // `init` needs three frames already buffered to confirm the first (the candidate plus
        // its two required successors); `run` then pulls two more frames one at a time through
        // the `input` callback to prove the pull-more-data path.
        let frame = mp3_frame([0xFF, 0xFB, 0x90, 0x00], 417, 0xAA);
        let mut initial = Vec::new();
        for _ in 0..3 {
            initial.extend_from_slice(&frame);
        }
        let mut pulled = vec![frame.clone(), frame];

        let stream = RingBufferStream::from_bytes(&initial);
        let decoder = NullMp3Decoder::default();
        let mut decoded_frames = 0usize;

        let mut player = Player::init(
            stream,
            decoder,
            SyncLimits::default(),
            |_audio_type, _external| {},
            move || pulled.pop(),
            |_pcm| {
                decoded_frames += 1;
            },
        )
        .unwrap();

        player.run().unwrap();

        assert_eq!(decoded_frames, 5);
    }
}
