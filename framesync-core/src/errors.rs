// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type shared by every framesync crate.

use std::error::Error as StdError;
use std::fmt;

/// `FrameError` enumerates every error that can escape the framing core.
///
/// Per the propagation policy: `InvalidHeader` and `ShortRead` are local recovery signals used
/// internally by the synchronizers and are not expected to surface past them in normal operation,
/// but are part of the public enum since a caller driving the low-level sync/pump functions
/// directly may still observe them.
#[derive(Debug)]
pub enum FrameError {
    /// A candidate header failed bit-field validation.
    InvalidHeader(&'static str),
    /// The stream returned fewer bytes than requested.
    ShortRead,
    /// The scan exhausted its byte budget without confirming a frame.
    ResyncExhausted,
    /// ADIF was detected, or the type prober could not classify the stream.
    UnsupportedFormat(&'static str),
    /// The decoder adapter failed to initialize.
    DecoderInitFailed(&'static str),
    /// The decoder adapter failed to decode a frame.
    DecodeFailed(&'static str),
    /// The decoder's buffer allocation failed.
    AllocFailure,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidHeader(why) => write!(f, "invalid frame header: {why}"),
            FrameError::ShortRead => write!(f, "short read from stream"),
            FrameError::ResyncExhausted => write!(f, "resync scan exhausted its byte budget"),
            FrameError::UnsupportedFormat(why) => write!(f, "unsupported format: {why}"),
            FrameError::DecoderInitFailed(why) => write!(f, "decoder init failed: {why}"),
            FrameError::DecodeFailed(why) => write!(f, "decode failed: {why}"),
            FrameError::AllocFailure => write!(f, "decoder buffer allocation failed"),
        }
    }
}

impl StdError for FrameError {}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Convenience function to create an invalid-header error.
pub fn invalid_header<T>(why: &'static str) -> Result<T> {
    Err(FrameError::InvalidHeader(why))
}

/// Convenience function to create a short-read error.
pub fn short_read<T>() -> Result<T> {
    Err(FrameError::ShortRead)
}

/// Convenience function to create a resync-exhausted error.
pub fn resync_exhausted<T>() -> Result<T> {
    Err(FrameError::ResyncExhausted)
}

/// Convenience function to create an unsupported-format error.
pub fn unsupported_format<T>(why: &'static str) -> Result<T> {
    Err(FrameError::UnsupportedFormat(why))
}

/// Convenience function to create a decoder-init-failed error.
pub fn decoder_init_failed<T>(why: &'static str) -> Result<T> {
    Err(FrameError::DecoderInitFailed(why))
}

/// Convenience function to create a decode-failed error.
pub fn decode_failed<T>(why: &'static str) -> Result<T> {
    Err(FrameError::DecodeFailed(why))
}

/// Convenience function to create an allocation-failure error.
pub fn alloc_failure<T>() -> Result<T> {
    Err(FrameError::AllocFailure)
}
