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

//! One ring slot's per-frame scratch (§4.8). A slot is written by exactly
//! one side at a time: the I/O thread before posting `available`, then
//! exclusively the worker that takes it, then the I/O thread again once it
//! waits on the slot's own `processed` semaphore.
//!
//! The same `FrameSlot` shape serves both directions, the way
//! [`crate::state::PrivateState`] carries both bitcaches — an encode run
//! only ever touches `samples`/`tta` as source/dest and a decode run the
//! reverse, so only one field pairing is ever live per slot at a time.

use crate::state::UserState;

/// What a worker left behind in a slot once it posts `processed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Not yet claimed by a worker this round.
    Pending,
    Encoded,
    Decoded,
    /// Decode's sample and byte budgets did not run out together; `pcm`
    /// has been zero-padded for the unproduced tail.
    DecodeFailed,
}

pub struct FrameSlot {
    /// Encode: unused (the I/O thread converts its own read buffer
    /// straight into `samples`). Decode: the interleaved PCM bytes
    /// produced for output.
    pub pcm: Vec<u8>,
    /// Encode: the i32 samples converted from `pcm`, fed to the codec.
    /// Decode: the i32 samples produced by the codec, converted into `pcm`.
    pub samples: Vec<i32>,
    /// Encode: the TTA bytes produced by the codec. Decode: the TTA bytes
    /// read from input, fed to the codec.
    pub tta: Vec<u8>,
    pub user: UserState,
    /// Sentinel for encode: `0` means "no more frames", only ever seen on
    /// the final `workers` slots the I/O thread marks at end of input.
    pub ni32_perframe: usize,
    /// Sentinel for decode: `0` means "no more frames".
    pub nbytes_tta_perframe: usize,
    pub outcome: SlotOutcome,
}

impl FrameSlot {
    pub fn new() -> Self {
        FrameSlot {
            pcm: Vec::new(),
            samples: Vec::new(),
            tta: Vec::new(),
            user: UserState::new(),
            ni32_perframe: 0,
            nbytes_tta_perframe: 0,
            outcome: SlotOutcome::Pending,
        }
    }

    /// Re-arms this slot with one frame's PCM payload ahead of an encode
    /// dispatch. `ni32_perframe == 0` marks the end-of-input sentinel.
    pub fn reset_for_encode(&mut self, ni32_perframe: usize, tta_capacity: usize) {
        self.pcm.clear();
        self.samples.clear();
        self.samples.resize(ni32_perframe, 0);
        self.tta.clear();
        self.tta.reserve(tta_capacity);
        self.user = UserState::new();
        self.ni32_perframe = ni32_perframe;
        self.nbytes_tta_perframe = 0;
        self.outcome = SlotOutcome::Pending;
    }

    /// Re-arms this slot with one frame's TTA payload ahead of a decode
    /// dispatch. `nbytes_tta_perframe == 0` marks the end-of-input
    /// sentinel.
    pub fn reset_for_decode(&mut self, nbytes_tta_perframe: usize, ni32_perframe: usize, samplebytes: u8) {
        self.tta.clear();
        self.tta.reserve(nbytes_tta_perframe);
        self.samples.clear();
        self.samples.resize(ni32_perframe, 0);
        self.pcm.clear();
        self.pcm.resize(ni32_perframe * samplebytes as usize, 0);
        self.user = UserState::new();
        self.nbytes_tta_perframe = nbytes_tta_perframe;
        self.ni32_perframe = ni32_perframe;
        self.outcome = SlotOutcome::Pending;
    }

    pub fn is_encode_sentinel(&self) -> bool {
        self.ni32_perframe == 0
    }

    pub fn is_decode_sentinel(&self) -> bool {
        self.nbytes_tta_perframe == 0
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
