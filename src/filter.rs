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

//! The `filter` module implements C6: the 8-tap sign-LMS-like adaptive
//! FIR filter that runs on the prediction residual.
//!
//! [`FilterStep`] is the one-method trait design note §9 asks for, so a
//! SIMD backend could implement it alongside [`FilterState`]'s scalar
//! implementation; no such backend exists in this core (left as the
//! documented extension point).

use crate::sample::SampleBytes;

/// Per-channel filter state (§3): 8 coefficients, 8 update magnitudes, 8
/// history samples, and the previous step's full signed residual. All
/// zero initially.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterState {
    pub qm: [i32; 8],
    pub dx: [i32; 8],
    pub dl: [i32; 8],
    pub error: i32,
}

impl FilterState {
    pub const fn new() -> Self {
        FilterState { qm: [0; 8], dx: [0; 8], dl: [0; 8], error: 0 }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounding constant and shift for a given sample width (§4.6).
pub fn filter_params(samplebytes: SampleBytes) -> (i32, u32) {
    match samplebytes {
        SampleBytes::One => (0x200, 10),
        SampleBytes::Two => (0x100, 9),
        SampleBytes::Three => (0x200, 10),
    }
}

/// One adaptive-filter step, in either direction.
pub trait FilterStep {
    /// Runs the filter forward (encode: subtract the prediction) or
    /// backward (decode: add the prediction), returning the transformed
    /// value and updating the filter state in place.
    fn step(&mut self, value: i32, round: i32, k: u32, direction: Direction) -> i32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

impl FilterStep for FilterState {
    fn step(&mut self, value: i32, round_init: i32, k: u32, direction: Direction) -> i32 {
        // Each coefficient is adapted by the sign of the previous residual
        // and immediately folded into the sum for this same sample (§4.6);
        // the sum never sees a stale, one-step-lagged coefficient. All of
        // this is 32-bit wrapping arithmetic, matching the reference's
        // plain `i32` accumulation.
        let sign_e = self.error.signum();
        let mut round: i32 = round_init;
        for i in 0..8 {
            self.qm[i] = self.qm[i].wrapping_add(self.dx[i].wrapping_mul(sign_e));
            round = round.wrapping_add(self.qm[i].wrapping_mul(self.dl[i]));
        }

        let shifted = round >> k;
        let out = match direction {
            Direction::Encode => value.wrapping_sub(shifted),
            Direction::Decode => value.wrapping_add(shifted),
        };
        self.error = match direction {
            Direction::Encode => out,
            Direction::Decode => value,
        };

        // History refresh: a 9-wide scratch window (the persisted 8 slots
        // plus the freshly-observed sample) forward-differences the last
        // three history entries, then the whole window shifts left by one.
        let new_sample = match direction {
            Direction::Encode => value,
            Direction::Decode => out,
        };

        let mut dl = [0i32; 9];
        dl[..8].copy_from_slice(&self.dl);
        dl[8] = new_sample;

        let mut dx = [0i32; 9];
        dx[..8].copy_from_slice(&self.dx);
        dx[8] = ((dl[7] >> 30) | 1) << 2;
        dx[7] = ((dl[6] >> 30) | 1) << 1;
        dx[6] = ((dl[5] >> 30) | 1) << 1;
        dx[5] = (dl[4] >> 30) | 1;

        dl[7] = dl[8] - dl[7];
        dl[6] = dl[7] - dl[6];
        dl[5] = dl[6] - dl[5];

        self.dx.copy_from_slice(&dx[1..9]);
        self.dl.copy_from_slice(&dl[1..9]);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let (round, k) = filter_params(SampleBytes::Two);
        let mut enc = FilterState::new();
        let mut dec = FilterState::new();
        let residuals = [0, 10, -10, 1234, -1234, 50, -50, 0, 7, -7];
        for &r in &residuals {
            let out = enc.step(r, round, k, Direction::Encode);
            let back = dec.step(out, round, k, Direction::Decode);
            assert_eq!(back, r);
        }
        assert_eq!(enc.qm, dec.qm);
        assert_eq!(enc.dl, dec.dl);
        assert_eq!(enc.dx, dec.dx);
    }

    #[test]
    fn zero_input_stays_zero() {
        let (round, k) = filter_params(SampleBytes::One);
        let mut f = FilterState::new();
        for _ in 0..16 {
            let out = f.step(0, round, k, Direction::Encode);
            assert_eq!(out, 0);
        }
    }
}
