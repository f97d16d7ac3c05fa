// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A streaming audio container parser and player-driver core.
//!
//! Consumes an unbounded byte stream of compressed audio (MP3 elementary streams and AAC in ADTS
//! framing), classifies the stream type, locates frame boundaries across leading metadata and
//! lost-sync garbage, and feeds exact frame payloads to a caller-supplied decoder adapter.
//!
//! The format-specific bit-field decoding and synchronization live in [`framesync_mp3`] and
//! [`framesync_aac`]; this crate ties them together behind a single [`Player`] lifecycle and a
//! [`Session`] dispatcher that picks the right framing component for a classified stream.

pub mod decoder;
pub mod player;
pub mod prober;
pub mod session;

pub use decoder::{BufferSizes, DecoderAdapter, NullAacDecoder, NullMp3Decoder};
pub use player::Player;
pub use prober::probe;
pub use session::Session;

pub use framesync_core::errors::{FrameError, Result};
pub use framesync_core::io::{RingBufferStream, ScopedRelease, SeekFrom, StreamHandle};
pub use framesync_core::types::{AudioType, PcmDescriptor, SyncLimits};
