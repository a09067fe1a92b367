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

//! TTA's CRC-32 (C2): width 32, polynomial 0xEDB88320 (reflected), init
//! 0xFFFFFFFF, final XOR 0xFFFFFFFF — the same construction as
//! CRC-32/ISO-HDLC, so this module is a thin wrapper around
//! [`crc32fast`].

/// Computes the CRC-32 of a complete buffer in one shot. Used by external
/// collaborators for header/seektable checksums; the frame codec itself
/// uses [`FrameCrc`] to fold the CRC into its byte-at-a-time bitcache
/// drain instead of buffering a whole frame first.
pub fn crc32(buf: &[u8]) -> u32 {
    crc32fast::hash(buf)
}

/// A running CRC-32 accumulator for one frame. Every byte that passes
/// through the encode or decode bitcache is fed here; [`FrameCrc::finish`]
/// applies the final XOR-out and must be called exactly once per frame.
#[derive(Clone, Debug)]
pub struct FrameCrc {
    hasher: crc32fast::Hasher,
}

impl FrameCrc {
    pub fn new() -> Self {
        FrameCrc { hasher: crc32fast::Hasher::new() }
    }

    /// Folds one output/input byte into the running checksum.
    pub fn update_byte(&mut self, byte: u8) {
        self.hasher.update(std::slice::from_ref(&byte));
    }

    /// Folds a run of bytes into the running checksum.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Finalizes the checksum. `crc32fast::Hasher` already applies the
    /// init/xorout convention internally, so this is just a cast of the
    /// accumulated state.
    pub fn finish(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for FrameCrc {
    fn default() -> Self {
        Self::new()
    }
}
