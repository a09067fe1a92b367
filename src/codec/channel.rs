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

//! Per-channel pipeline: predictor (C5) + filter (C6) + sign-fold, run on
//! one channel's already-decorrelated residual for one sample.
//!
//! `state.prev` is the decorrelated residual itself (the predictor's
//! *input*), kept identical on the encode and decode side by
//! construction: encode sets `prev` to its input sample, decode's
//! reconstructed output *is* that same sample, so setting `prev` to the
//! decoder's output keeps both sides in lock-step without the encoder and
//! decoder needing to agree on which of "predictor in" vs "predictor out"
//! counts as `prev` from two different descriptions of the same value.

use crate::filter::{Direction, FilterStep};
use crate::predict::{predict1, predict_shift};
use crate::sample::SampleBytes;
use crate::state::ChannelState;

/// Sign-fold (interleave) a decorrelated, filtered residual into an
/// unsigned value for Rice coding: `0,1,-1,2,-2,... -> 0,1,2,3,4,...`.
pub fn fold(x: i32) -> u32 {
    let x64 = x as i64;
    (if x > 0 { 2 * x64 - 1 } else { -2 * x64 }) as u32
}

/// Inverse of [`fold`].
pub fn unfold(u: u32) -> i32 {
    if u & 1 == 1 {
        (((u as u64) + 1) >> 1) as i32
    } else {
        -(((u as u64) >> 1) as i32)
    }
}

/// Runs predict+filter+fold on one already-decorrelated residual,
/// returning the unsigned value to feed to the Rice coder.
pub fn encode_sample(state: &mut ChannelState, x: i32, samplebytes: SampleBytes) -> u32 {
    let k = predict_shift(samplebytes);
    let predicted = predict1(state.prev, k);
    let p = x.wrapping_sub(predicted);

    let (round, fk) = crate::filter::filter_params(samplebytes);
    let filtered = state.filter.step(p, round, fk, Direction::Encode);

    state.prev = x;
    fold(filtered)
}

/// Inverse of [`encode_sample`]: given a Rice-decoded unsigned value,
/// reconstructs the decorrelated residual.
pub fn decode_sample(state: &mut ChannelState, folded: u32, samplebytes: SampleBytes) -> i32 {
    let unfolded = unfold(folded);

    let (round, fk) = crate::filter::filter_params(samplebytes);
    let p = state.filter.step(unfolded, round, fk, Direction::Decode);

    let k = predict_shift(samplebytes);
    let predicted = predict1(state.prev, k);
    let x = p.wrapping_add(predicted);

    state.prev = x;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_unfold_is_an_involution() {
        for x in -5000..5000 {
            assert_eq!(unfold(fold(x)), x);
        }
    }

    #[test]
    fn fold_matches_glossary_mapping() {
        assert_eq!(fold(0), 0);
        assert_eq!(fold(1), 1);
        assert_eq!(fold(-1), 2);
        assert_eq!(fold(2), 3);
        assert_eq!(fold(-2), 4);
    }

    #[test]
    fn channel_pipeline_roundtrips() {
        let mut enc = ChannelState::new();
        let mut dec = ChannelState::new();
        let residuals = [0, 5, -5, 1000, -1000, 17, -17, 0, 1, -1];
        for &x in &residuals {
            let folded = encode_sample(&mut enc, x, SampleBytes::Two);
            let back = decode_sample(&mut dec, folded, SampleBytes::Two);
            assert_eq!(back, x);
        }
        assert_eq!(enc, dec);
    }
}
