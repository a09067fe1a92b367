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

//! The sample-byte-mode enum that several components key their constants
//! on (predictor shift, filter rounding, Rice safety limit).

use crate::error::CodecError;

/// PCM sample width in bytes. No other value reaches the codec (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleBytes {
    One = 1,
    Two = 2,
    Three = 3,
}

impl SampleBytes {
    pub fn from_u8(n: u8) -> Result<Self, CodecError> {
        match n {
            1 => Ok(SampleBytes::One),
            2 => Ok(SampleBytes::Two),
            3 => Ok(SampleBytes::Three),
            _ => Err(CodecError::range()),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
