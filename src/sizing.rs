// ttacore -- A reentrant, byte-exact codec for the TTA1 lossless format.
// Copyright (C) 2014-2026 ttacore contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The `sizing` module implements C9: safe buffer-size computations for
//! the bitstream and the private codec state. These are pure functions
//! with no state of their own.

use crate::sample::SampleBytes;
use crate::state::PRIV_STATE_ALIGN;

/// Per-channel safety margin contribution: the maximum bytes one more
/// worst-case Rice-coded value plus a final cache flush could add, for a
/// given sample width (§4.9).
fn per_channel_margin(samplebytes: SampleBytes) -> usize {
    match samplebytes {
        SampleBytes::One | SampleBytes::Two => 8207,
        SampleBytes::Three => 2_097_167,
    }
}

/// The destination (encode) or source (decode) buffer must be at least
/// this many bytes larger than the actual payload.
pub fn ttabuf_safety_margin(samplebytes: u8, nchan: usize) -> usize {
    let Ok(sb) = SampleBytes::from_u8(samplebytes) else { return 0 };
    if nchan == 0 {
        return 0;
    }
    nchan * per_channel_margin(sb)
}

/// TTA1's fixed frame duration is `256/245` seconds; this returns the
/// number of inter-channel samples per frame for a given sample rate, or
/// `0` on overflow or a zero input.
pub fn nsamples_perframe_tta1(samplerate: u32) -> usize {
    if samplerate == 0 {
        return 0;
    }
    match (samplerate as u64).checked_mul(256) {
        Some(product) => (product / 245) as usize,
        None => 0,
    }
}

/// Rounds `value` up to the next multiple of `align` (`align` must be a
/// power of two).
fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Size in bytes of the private codec state for `nchan` channels, aligned
/// to [`PRIV_STATE_ALIGN`] bytes. Returns `0` on overflow or `nchan == 0`.
pub fn codecstate_priv_size(nchan: usize) -> usize {
    if nchan == 0 {
        return 0;
    }
    let header = std::mem::size_of::<crate::bitcache::EncodeBitcache>();
    let per_channel = std::mem::size_of::<crate::state::ChannelState>();
    match per_channel.checked_mul(nchan).and_then(|p| p.checked_add(header)) {
        Some(total) => align_up(total, PRIV_STATE_ALIGN),
        None => 0,
    }
}
