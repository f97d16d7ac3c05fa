// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! MP3 (MPEG 1/2/2.5, Layer 1/2/3) frame header decoding and stream synchronization.

mod header;
mod pump;
mod sync;

pub use header::{
    check_header, parse_frame_header, MpFrameHeader, MpegLayer, MpegVersion, FIXED_HEADER_MASK,
    MPEG_HEADER_LEN, SYNC_MASK, SYNC_VALUE,
};
pub use pump::get_frame_mp3;
pub use sync::resync_mp3;
