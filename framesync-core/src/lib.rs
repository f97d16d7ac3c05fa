// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Shared errors, the stream I/O contract, and data types for the `framesync` audio frame
//! synchronizer. This crate has no knowledge of MP3 or AAC framing itself; see
//! `framesync-mp3` and `framesync-aac` for the format-specific synchronizers, and `framesync`
//! for the type prober and session dispatcher that tie everything together.

pub mod callback;
pub mod errors;
pub mod io;
pub mod types;

pub use callback::{ConfigCallback, InputCallback, OutputCallback};
pub use errors::{FrameError, Result};
pub use io::{RingBufferStream, ScanWindow, ScopedRelease, SeekFrom, StreamHandle};
pub use types::{AudioType, PcmDescriptor, SyncLimits};
