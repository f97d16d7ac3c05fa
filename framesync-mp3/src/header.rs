// framesync
// Copyright (c) 2024 The framesync Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bit-field decoding of a 32-bit MPEG audio frame header. Pure functions over the tables in
//! spec.md §4.1: no I/O, no state.

use framesync_core::errors::{invalid_header, Result};

/// The length in bytes of an MPEG audio frame header word.
pub const MPEG_HEADER_LEN: usize = 4;

/// Validator mask: the eleven sync bits that must all be set.
pub const SYNC_MASK: u32 = 0xFFE0_0000;
pub const SYNC_VALUE: u32 = 0xFFE0_0000;

/// Session-invariant mask: sync, version, layer, and sampling-rate index must not change across
/// the frames of one session.
pub const FIXED_HEADER_MASK: u32 = 0xFFFE_0C00;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg2p5,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegLayer {
    Layer1,
    Layer2,
    Layer3,
}

/// A fully parsed MP3 frame header (spec.md §3 "Parsed header").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MpFrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub bitrate_kbps: u32,
    pub sample_rate_hz: u32,
    pub padding: u8,
    pub frame_size_bytes: usize,
    pub channel_count: u8,
}

const BIT_RATES_V1L1: [u32; 15] = [
    0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
];
const BIT_RATES_V2L1: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256,
];
const BIT_RATES_V1L2: [u32; 15] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384,
];
const BIT_RATES_V1L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];
const BIT_RATES_V2L3: [u32; 15] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160,
];

const SAMPLE_RATES_V1: [u32; 3] = [44_100, 48_000, 32_000];
const SAMPLE_RATES_V2: [u32; 3] = [22_050, 24_000, 16_000];
const SAMPLE_RATES_V2P5: [u32; 3] = [11_025, 12_000, 8_000];

/// Quickly check if a header's sync/version/layer/bitrate/sample-rate bit-fields may be valid,
/// without fully parsing it. Used by the scanner to cheaply reject most false positives before
/// running the full (and slightly more expensive) `parse_frame_header`.
#[inline]
pub fn check_header(header: u32) -> bool {
    if header & SYNC_MASK != SYNC_VALUE {
        return false;
    }
    // Version (bits 19-20): 0x1 is reserved.
    if (header >> 19) & 0x3 == 0x1 {
        return false;
    }
    // Layer (bits 17-18): 0x0 is reserved.
    if (header >> 17) & 0x3 == 0x0 {
        return false;
    }
    // Bitrate index (bits 12-15): 0 is free, 0xf is bad.
    let bitrate_idx = (header >> 12) & 0xf;
    if bitrate_idx == 0x0 || bitrate_idx == 0xf {
        return false;
    }
    // Sampling-rate index (bits 10-11): 0x3 is reserved.
    if (header >> 10) & 0x3 == 0x3 {
        return false;
    }
    true
}

/// Parse a 32-bit big-endian MPEG audio frame header. Rejects per the five conditions in
/// spec.md §4.1; on acceptance, computes `frame_size_bytes` from the selected tables.
pub fn parse_frame_header(header: u32) -> Result<MpFrameHeader> {
    if header & SYNC_MASK != SYNC_VALUE {
        return invalid_header("sync bits not set");
    }

    let version = match (header >> 19) & 0x3 {
        0b11 => MpegVersion::Mpeg1,
        0b10 => MpegVersion::Mpeg2,
        0b00 => MpegVersion::Mpeg2p5,
        _ => return invalid_header("reserved MPEG version"),
    };

    let layer = match (header >> 17) & 0x3 {
        0b11 => MpegLayer::Layer1,
        0b10 => MpegLayer::Layer2,
        0b01 => MpegLayer::Layer3,
        _ => return invalid_header("reserved layer"),
    };

    let bitrate_idx = ((header >> 12) & 0xf) as usize;
    if bitrate_idx == 0 {
        return invalid_header("free bitrate is not supported");
    }
    if bitrate_idx == 0xf {
        return invalid_header("bad bitrate index");
    }

    let bitrate_kbps = match (layer, version) {
        (MpegLayer::Layer1, MpegVersion::Mpeg1) => BIT_RATES_V1L1[bitrate_idx],
        (MpegLayer::Layer1, _) => BIT_RATES_V2L1[bitrate_idx],
        (MpegLayer::Layer2, MpegVersion::Mpeg1) => BIT_RATES_V1L2[bitrate_idx],
        (MpegLayer::Layer3, MpegVersion::Mpeg1) => BIT_RATES_V1L3[bitrate_idx],
        (MpegLayer::Layer2, _) | (MpegLayer::Layer3, _) => BIT_RATES_V2L3[bitrate_idx],
    };

    let sr_idx = ((header >> 10) & 0x3) as usize;
    if sr_idx == 0x3 {
        return invalid_header("reserved sampling rate index");
    }

    let sample_rate_hz = match version {
        MpegVersion::Mpeg1 => SAMPLE_RATES_V1[sr_idx],
        MpegVersion::Mpeg2 => SAMPLE_RATES_V2[sr_idx],
        MpegVersion::Mpeg2p5 => SAMPLE_RATES_V2P5[sr_idx],
    };

    let padding = ((header >> 9) & 0x1) as u8;

    // Mode bits (6-7): 0b11 is mono, anything else carries (at least) two channels.
    let channel_count = if (header >> 6) & 0x3 == 0b11 { 1 } else { 2 };

    let frame_size_bytes = frame_size(layer, version, bitrate_kbps, sample_rate_hz, padding);

    Ok(MpFrameHeader {
        version,
        layer,
        bitrate_kbps,
        sample_rate_hz,
        padding,
        frame_size_bytes,
        channel_count,
    })
}

/// Compute the frame size in bytes per spec.md §4.1's three-case formula. Integer division
/// truncates, matching real-world encoder framing.
fn frame_size(
    layer: MpegLayer,
    version: MpegVersion,
    bitrate_kbps: u32,
    sample_rate_hz: u32,
    padding: u8,
) -> usize {
    let bitrate_bps = bitrate_kbps as u64 * 1000;
    let sr = sample_rate_hz as u64;
    let p = padding as u64;

    let size = match layer {
        MpegLayer::Layer1 => 384 * bitrate_bps / 8 / sr + 4 * p,
        MpegLayer::Layer2 => 1152 * bitrate_bps / 8 / sr + p,
        MpegLayer::Layer3 => match version {
            MpegVersion::Mpeg1 => 1152 * bitrate_bps / 8 / sr + p,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg2p5 => 576 * bitrate_bps / 8 / sr + p,
        },
    };

    size as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpeg1_layer3_44100_128kbps_unpadded() {
        // FF FB 90 00
        let header = 0xFFFB_9000u32;
        assert!(check_header(header));
        let parsed = parse_frame_header(header).unwrap();
        assert_eq!(parsed.version, MpegVersion::Mpeg1);
        assert_eq!(parsed.layer, MpegLayer::Layer3);
        assert_eq!(parsed.bitrate_kbps, 128);
        assert_eq!(parsed.sample_rate_hz, 44_100);
        assert_eq!(parsed.padding, 0);
        assert_eq!(parsed.frame_size_bytes, 417);
    }

    #[test]
    fn rejects_reserved_version() {
        // Sync bits ok, version bits = 01 (reserved).
        let header = 0xFFE8_0000u32;
        assert!(parse_frame_header(header).is_err());
    }

    #[test]
    fn rejects_reserved_layer() {
        let header = 0xFFE1_0000u32;
        assert!(parse_frame_header(header).is_err());
    }

    #[test]
    fn rejects_free_and_bad_bitrate() {
        let free = 0xFFFB_0000u32;
        assert!(parse_frame_header(free).is_err());
        let bad = 0xFFFB_F000u32;
        assert!(parse_frame_header(bad).is_err());
    }

    #[test]
    fn rejects_reserved_sample_rate() {
        let header = 0xFFFB_9C00u32;
        assert!(parse_frame_header(header).is_err());
    }

    #[test]
    fn rejects_missing_sync() {
        let header = 0x00FB_9000u32;
        assert!(!check_header(header));
        assert!(parse_frame_header(header).is_err());
    }

    #[test]
    fn padding_adds_one_slot_for_layer3() {
        // Same header as above but with padding bit set (bit 9).
        let header = 0xFFFB_9200u32;
        let parsed = parse_frame_header(header).unwrap();
        assert_eq!(parsed.padding, 1);
        assert_eq!(parsed.frame_size_bytes, 418);
    }

    #[test]
    fn mpeg2_layer3_uses_576_factor() {
        // MPEG-2 (version bits 10), layer 3 (01), bitrate idx 8 -> 64kbps (V2L3 table),
        // sample rate idx 0 -> 22050 Hz, no padding.
        let header = 0xFFF3_8000u32;
        let parsed = parse_frame_header(header).unwrap();
        assert_eq!(parsed.version, MpegVersion::Mpeg2);
        assert_eq!(parsed.layer, MpegLayer::Layer3);
        assert_eq!(parsed.bitrate_kbps, 64);
        assert_eq!(parsed.sample_rate_hz, 22_050);
        assert_eq!(parsed.frame_size_bytes, 576 * 64_000 / 8 / 22_050);
    }

    #[test]
    fn fixed_header_mask_is_invariant_across_bitrate_and_padding_changes() {
        let a = 0xFFFB_9000u32;
        let b = 0xFFFB_B200u32; // different bitrate index and padding bit
        assert_eq!(a & FIXED_HEADER_MASK, b & FIXED_HEADER_MASK);
    }
}
