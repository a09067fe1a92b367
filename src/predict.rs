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

//! The `predict` module implements C5: fixed-order-1 prediction with a
//! sample-byte-dependent shift.

use crate::sample::SampleBytes;

/// Shift used by [`predict1`] for a given sample width: 4 for 8-bit PCM,
/// 5 for 16- and 24-bit.
pub fn predict_shift(samplebytes: SampleBytes) -> u32 {
    match samplebytes {
        SampleBytes::One => 4,
        SampleBytes::Two | SampleBytes::Three => 5,
    }
}

/// `((prev << k) - prev) >> k`, computed with a 64-bit intermediate so the
/// shift cannot overflow `i32` arithmetic.
pub fn predict1(prev: i32, k: u32) -> i32 {
    let prev = prev as i64;
    (((prev << k) - prev) >> k) as i32
}

/// Encode direction: subtracts the prediction from `sample`, returning the
/// residual. `prev` should be updated by the caller to the *pre-filter*
/// value afterwards (spec §4.5).
pub fn predict_encode(sample: i32, prev: i32, k: u32) -> i32 {
    sample.wrapping_sub(predict1(prev, k))
}

/// Decode direction: adds the prediction back onto `residual`, returning
/// the reconstructed sample. `prev` should be updated by the caller to
/// this returned value afterwards.
pub fn predict_decode(residual: i32, prev: i32, k: u32) -> i32 {
    residual.wrapping_add(predict1(prev, k))
}
