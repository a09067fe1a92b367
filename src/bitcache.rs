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

//! The `bitcache` module implements C3: a single-buffered, variable-width
//! bit accumulator. Encode and decode use *different* layouts (64-bit vs
//! 32-bit), so they are kept as distinct value types rather than a union,
//! per design note §9. Neither type owns its byte source or destination;
//! callers pass those in explicitly, the same way claxon's `Bitstream`
//! borrows its reader for the duration of a read.

use crate::crc::FrameCrc;

/// Encode-side bitcache: a 64-bit accumulator. New bits are placed at bit
/// offset `count` (conceptually "shifted into the high end"); whole bytes
/// are drained from the low end as soon as they are complete.
///
/// Invariant: `count <= 63` between calls, and bits `[count..64)` are
/// always zero.
#[derive(Clone, Copy, Debug)]
pub struct EncodeBitcache {
    cache: u64,
    count: u8,
}

impl EncodeBitcache {
    pub fn new() -> Self {
        EncodeBitcache { cache: 0, count: 0 }
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> u8 {
        self.count
    }

    /// Writes the low `nbits` bits of `value` (0 <= nbits <= 32), draining
    /// whole bytes to `out` as they become available and folding each
    /// drained byte into `crc`.
    pub fn write_bits(&mut self, value: u32, nbits: u8, out: &mut Vec<u8>, crc: &mut FrameCrc) {
        debug_assert!(nbits <= 32);
        debug_assert!(self.count <= 7, "caller must drain before the next write");
        if nbits == 0 {
            return;
        }
        let mask: u64 = if nbits == 32 { u32::MAX as u64 } else { (1u64 << nbits) - 1 };
        self.cache |= (value as u64 & mask) << self.count;
        self.count += nbits;
        self.drain(out, crc);
    }

    /// Writes `u` one-bits followed by a zero terminator (unary coding).
    pub fn write_unary(&mut self, mut u: u32, out: &mut Vec<u8>, crc: &mut FrameCrc) {
        while u >= 32 {
            self.write_bits(0xFFFF_FFFF, 32, out, crc);
            u -= 32;
        }
        if u > 0 {
            self.write_bits((1u32 << u) - 1, u as u8, out, crc);
        }
        self.write_bits(0, 1, out, crc);
    }

    /// Flushes any partial byte at end-of-frame. Adds 7 spare bits to
    /// `count`, drains all whole bytes, then emits the final zero-padded
    /// partial byte (design note (d): this gives the terminator its final
    /// byte even when the stream was already byte-aligned).
    pub fn flush(&mut self, out: &mut Vec<u8>, crc: &mut FrameCrc) {
        self.count += 7;
        self.drain(out, crc);
        if self.count > 0 {
            let byte = (self.cache & 0xff) as u8;
            out.push(byte);
            crc.update_byte(byte);
            self.cache = 0;
            self.count = 0;
        }
    }

    fn drain(&mut self, out: &mut Vec<u8>, crc: &mut FrameCrc) {
        while self.count >= 8 {
            let byte = (self.cache & 0xff) as u8;
            out.push(byte);
            crc.update_byte(byte);
            self.cache >>= 8;
            self.count -= 8;
        }
    }
}

impl Default for EncodeBitcache {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode-side bitcache: a 32-bit accumulator. Incoming bytes are shifted
/// into position `count`; bits are consumed from the low end.
///
/// Invariant: `count <= 8` between byte-aligned refills (commonly `7`
/// right after a unary terminator has been consumed).
#[derive(Clone, Copy, Debug)]
pub struct DecodeBitcache {
    cache: u32,
    count: u8,
}

impl DecodeBitcache {
    pub fn new() -> Self {
        DecodeBitcache { cache: 0, count: 0 }
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> u8 {
        self.count
    }

    /// Pushes one source byte into the cache. `count` must be `<= 24`
    /// beforehand, or the cache would overflow 32 bits.
    fn push_byte(&mut self, byte: u8) {
        debug_assert!(self.count <= 24);
        self.cache |= (byte as u32) << self.count;
        self.count += 8;
    }

    /// Pulls one byte from `src[*pos]`, advances `*pos`, folds it into
    /// `crc`, and pushes it into the cache. Returns `false` if `src` is
    /// exhausted.
    fn refill(&mut self, src: &[u8], pos: &mut usize, crc: &mut FrameCrc) -> bool {
        match src.get(*pos) {
            Some(&byte) => {
                *pos += 1;
                crc.update_byte(byte);
                self.push_byte(byte);
                true
            }
            None => false,
        }
    }

    /// Reads `nbits` bits (0 <= nbits <= 32) from the cache, refilling
    /// from `src` as needed. Returns `None` if `src` runs out before
    /// enough bits are available.
    pub fn read_bits(
        &mut self,
        nbits: u8,
        src: &[u8],
        pos: &mut usize,
        crc: &mut FrameCrc,
    ) -> Option<u32> {
        debug_assert!(nbits <= 32);
        while self.count < nbits {
            if !self.refill(src, pos, crc) {
                return None;
            }
        }
        let mask: u32 = if nbits == 32 { u32::MAX } else { (1u32 << nbits) - 1 };
        let result = self.cache & mask;
        if nbits == 32 {
            self.cache = 0;
        } else {
            self.cache >>= nbits;
        }
        self.count -= nbits;
        Some(result)
    }

    /// Reads a single bit, refilling from `src` as needed.
    pub fn read_bit(&mut self, src: &[u8], pos: &mut usize, crc: &mut FrameCrc) -> Option<u32> {
        self.read_bits(1, src, pos, crc)
    }
}

impl Default for DecodeBitcache {
    fn default() -> Self {
        Self::new()
    }
}
