// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! AAC ADTS frame header validation and stream synchronization.

mod adts;
mod pump;
mod sync;

pub use adts::{is_sync_word, parse_adts_header, AdtsHeader, ADIF_MAGIC, ADTS_HEADER_LEN};
pub use pump::get_frame_aac;
pub use sync::resync_aac;
