// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback contracts consumed by the player lifecycle (spec.md §6.2). These are thin trait
//! aliases over `FnMut` so call sites can name a bound instead of spelling out the closure shape
//! every time, the same way decoder adapters are held as `Box<dyn DecoderAdapter>` rather than a
//! monomorphized type parameter.
//!
//! `InputCallback` is adapted from the spec's literal `input(user_ctx, player) -> bytes_pushed`
//! shape: a callback that both reads `player` and is stored inside it is self-referential and
//! cannot be expressed as a plain `FnMut` field. Instead the callback here returns the bytes to
//! push, and `Player::run` performs the push itself after calling it: the same producer-pulls-
//! more-input control flow, restructured to satisfy the borrow checker.

use crate::types::{AudioType, PcmDescriptor};

/// Called once per session, before the first frame, so the caller can configure decoder
/// parameters using the opaque decoder-external buffer.
pub trait ConfigCallback: FnMut(AudioType, &mut [u8]) {}
impl<F: FnMut(AudioType, &mut [u8])> ConfigCallback for F {}

/// Invoked whenever the session has run out of confirmed frames and more input is needed.
/// Returns `Some(bytes)` to push, or `None`/an empty vec to signal true end-of-stream.
pub trait InputCallback: FnMut() -> Option<Vec<u8>> {}
impl<F: FnMut() -> Option<Vec<u8>>> InputCallback for F {}

/// Invoked after each successful decode with the produced PCM.
pub trait OutputCallback: FnMut(&PcmDescriptor<'_>) {}
impl<F: FnMut(&PcmDescriptor<'_>)> OutputCallback for F {}
