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

//! The `state` module holds the per-frame codec state (§3) and its
//! initialization (C10). Unlike the original C source's raw pointer and
//! flexible array member, the private state here is a value type that
//! owns its inline per-channel array and carries `align(16)` as a
//! type-level attribute (the adaptive filter needs that alignment).

use crate::bitcache::{DecodeBitcache, EncodeBitcache};
use crate::crc::FrameCrc;
use crate::filter::FilterState;
use crate::rice::RiceState;

/// Required alignment of the private codec state (the filter's SIMD
/// extension point needs at least this much).
pub const PRIV_STATE_ALIGN: usize = 16;

/// Per-channel codec state: `{ filter, rice, prev }` (§3).
#[repr(align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelState {
    pub filter: FilterState,
    pub rice: RiceState,
    pub prev: i32,
}

impl ChannelState {
    pub const fn new() -> Self {
        ChannelState { filter: FilterState::new(), rice: RiceState::new(), prev: 0 }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Codec private state (§3): the bitcache plus one [`ChannelState`] per
/// channel. Reused across frames by re-initializing on the first call of
/// each frame (`ncalls_codec == 0`, C10).
#[repr(align(16))]
#[derive(Clone, Debug)]
pub struct PrivateState {
    channels: Vec<ChannelState>,
    pub(crate) encode_bitcache: EncodeBitcache,
    pub(crate) decode_bitcache: DecodeBitcache,
    pub(crate) crc: FrameCrc,
}

impl PrivateState {
    /// Allocates private state for `nchan` channels, zero-initialized
    /// (spec default: `sum = [0x4000, 0x4000]`, `k = [10, 10]`, `prev =
    /// 0`, filter entirely zero — i.e. [`ChannelState::new`]), with a
    /// fresh bitcache and running CRC for the frame about to start.
    ///
    /// Both bitcaches are always present; an encode call only ever drives
    /// `encode_bitcache` and a decode call only ever drives
    /// `decode_bitcache`, so the unused one simply sits idle rather than
    /// needing a generic parameter to pick one at construction time.
    pub fn new(nchan: usize) -> Self {
        PrivateState {
            channels: vec![ChannelState::new(); nchan],
            encode_bitcache: EncodeBitcache::new(),
            decode_bitcache: DecodeBitcache::new(),
            crc: FrameCrc::new(),
        }
    }

    pub fn nchan(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [ChannelState] {
        &mut self.channels
    }

    /// Borrows the channel array together with the encode bitcache and
    /// running CRC, split so the frame codec loop can drive all three at
    /// once without re-borrowing `self` on every sample (a plain
    /// `channels_mut()` plus separate field access would conflict, since
    /// any method taking `&mut self` borrows the whole struct).
    pub(crate) fn encode_parts(&mut self) -> (&mut [ChannelState], &mut EncodeBitcache, &mut FrameCrc) {
        (&mut self.channels, &mut self.encode_bitcache, &mut self.crc)
    }

    /// Decode-side counterpart of [`PrivateState::encode_parts`].
    pub(crate) fn decode_parts(&mut self) -> (&mut [ChannelState], &mut DecodeBitcache, &mut FrameCrc) {
        (&mut self.channels, &mut self.decode_bitcache, &mut self.crc)
    }

    /// Re-initializes everything to spec defaults in place, for reuse
    /// across frames without reallocating (C10): every channel, the
    /// bitcaches, and the running frame CRC.
    pub fn reset(&mut self) {
        for ch in self.channels.iter_mut() {
            *ch = ChannelState::new();
        }
        self.encode_bitcache = EncodeBitcache::new();
        self.decode_bitcache = DecodeBitcache::new();
        self.crc = FrameCrc::new();
    }
}

/// Codec user-state (§3), mutated by every codec call. Lifetime is one
/// frame; create zeroed before a frame starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserState {
    pub ncalls_codec: u32,
    pub crc: u32,
    pub ni32: usize,
    pub ni32_total: usize,
    pub nbytes_tta: usize,
    pub nbytes_tta_total: usize,
}

impl UserState {
    pub const fn new() -> Self {
        UserState { ncalls_codec: 0, crc: 0, ni32: 0, ni32_total: 0, nbytes_tta: 0, nbytes_tta_total: 0 }
    }
}
