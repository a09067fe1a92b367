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

//! The `rice` module implements C4: adaptive two-stage Rice (Golomb-Rice)
//! coding. Each channel owns one [`RiceState`], updated on every symbol.
//!
//! Both the value used to choose a binary width and the value an update is
//! applied with are always captured *before* that update runs, so the
//! encoder and decoder stay in lock-step: a shift width is read once per
//! symbol and never changes mid-symbol.

use crate::bitcache::{DecodeBitcache, EncodeBitcache};
use crate::crc::FrameCrc;
use crate::sample::SampleBytes;

/// Two independent Rice states per channel, as described in spec §4.4.
/// Initial `sum = [0x4000, 0x4000]`, `k = [10, 10]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiceState {
    pub sum: [u32; 2],
    pub k: [u8; 2],
}

impl RiceState {
    pub const fn new() -> Self {
        RiceState { sum: [0x4000, 0x4000], k: [10, 10] }
    }
}

impl Default for RiceState {
    fn default() -> Self {
        Self::new()
    }
}

/// `1u32 << (x + 4)`, except `x == 0` maps to `0` and `x >= 25` maps to
/// `0xFFFFFFFF`; these two endpoints are what keep `k` clamped to
/// `[0, 24]` in [`update_state`] without an explicit branch on `k` itself.
fn binexp32p4(x: u8) -> u32 {
    match x {
        0 => 0,
        25.. => 0xFFFF_FFFF,
        n => 1u32 << (n as u32 + 4),
    }
}

fn update_state(sum: &mut u32, k: &mut u8, v: u32) {
    let old_sum = *sum;
    *sum = old_sum.wrapping_add(v).wrapping_sub(old_sum >> 4);
    if *sum < binexp32p4(*k) {
        *k -= 1;
    } else if *sum > binexp32p4(*k + 1) {
        *k += 1;
    }
    debug_assert!(*k <= 24);
}

/// Encodes one magnitude-folded residual `v` through `state`, emitting
/// bits via `bitcache` into `out` and folding output bytes into `crc`.
pub fn encode_value(
    state: &mut RiceState,
    v: u32,
    bitcache: &mut EncodeBitcache,
    out: &mut Vec<u8>,
    crc: &mut FrameCrc,
) {
    let bin_k0 = state.k[0];
    let bound0 = 1u32 << bin_k0;

    if v >= bound0 {
        let v1 = v - bound0;
        let bin_k1 = state.k[1];
        let mask1 = if bin_k1 == 32 { u32::MAX } else { (1u32 << bin_k1) - 1 };
        let u = (v1 >> bin_k1) + 1;
        let bin = v1 & mask1;
        bitcache.write_unary(u, out, crc);
        bitcache.write_bits(bin, bin_k1, out, crc);
        update_state(&mut state.sum[1], &mut state.k[1], v1);
        update_state(&mut state.sum[0], &mut state.k[0], v);
    } else {
        bitcache.write_unary(0, out, crc);
        bitcache.write_bits(v, bin_k0, out, crc);
        update_state(&mut state.sum[0], &mut state.k[0], v);
    }
}

/// Outcome of reading one unary prefix off the bitstream.
pub enum UnaryRead {
    /// The unary run terminated normally with this many leading 1-bits.
    Value(u32),
    /// `src` ran out before the terminator was found.
    NeedMoreData,
    /// The unary run exceeded the sample-bytes-dependent safety limit;
    /// the frame is malformed.
    Malformed,
}

/// Lax unary-run limits from spec §4.4, guarding against an adversarial
/// run of `0xFF` bytes.
fn unary_limit(samplebytes: SampleBytes) -> u32 {
    match samplebytes {
        SampleBytes::One | SampleBytes::Two => 8 * 8194 - 1,
        SampleBytes::Three => 8 * 2_097_154 - 1,
    }
}

fn read_unary(
    bitcache: &mut DecodeBitcache,
    src: &[u8],
    pos: &mut usize,
    crc: &mut FrameCrc,
    limit: u32,
) -> UnaryRead {
    let mut u = 0u32;
    loop {
        match bitcache.read_bit(src, pos, crc) {
            None => return UnaryRead::NeedMoreData,
            Some(0) => return UnaryRead::Value(u),
            Some(_) => {
                u += 1;
                if u > limit {
                    return UnaryRead::Malformed;
                }
            }
        }
    }
}

/// Outcome of decoding one Rice-coded residual.
pub enum ValueRead {
    Value(u32),
    NeedMoreData,
    Malformed,
}

/// Decodes one magnitude-folded residual from `src`, mirroring
/// [`encode_value`].
pub fn decode_value(
    state: &mut RiceState,
    bitcache: &mut DecodeBitcache,
    src: &[u8],
    pos: &mut usize,
    crc: &mut FrameCrc,
    samplebytes: SampleBytes,
) -> ValueRead {
    let bin_k0 = state.k[0];
    let bound0 = 1u32 << bin_k0;

    match read_unary(bitcache, src, pos, crc, unary_limit(samplebytes)) {
        UnaryRead::NeedMoreData => ValueRead::NeedMoreData,
        UnaryRead::Malformed => ValueRead::Malformed,
        UnaryRead::Value(0) => match bitcache.read_bits(bin_k0, src, pos, crc) {
            None => ValueRead::NeedMoreData,
            Some(v) => {
                update_state(&mut state.sum[0], &mut state.k[0], v);
                ValueRead::Value(v)
            }
        },
        UnaryRead::Value(u) => {
            let bin_k1 = state.k[1];
            match bitcache.read_bits(bin_k1, src, pos, crc) {
                None => ValueRead::NeedMoreData,
                Some(binary) => {
                    let v1 = ((u - 1) << bin_k1) + binary;
                    update_state(&mut state.sum[1], &mut state.k[1], v1);
                    let v = v1 + bound0;
                    update_state(&mut state.sum[0], &mut state.k[0], v);
                    ValueRead::Value(v)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: &[u32]) {
        let mut enc_state = RiceState::new();
        let mut enc_bc = EncodeBitcache::new();
        let mut out = Vec::new();
        let mut crc = FrameCrc::new();
        for &v in values {
            encode_value(&mut enc_state, v, &mut enc_bc, &mut out, &mut crc);
        }
        enc_bc.flush(&mut out, &mut crc);

        let mut dec_state = RiceState::new();
        let mut dec_bc = DecodeBitcache::new();
        let mut pos = 0usize;
        let mut crc_dec = FrameCrc::new();
        for &expected in values {
            match decode_value(
                &mut dec_state,
                &mut dec_bc,
                &out,
                &mut pos,
                &mut crc_dec,
                SampleBytes::Two,
            ) {
                ValueRead::Value(v) => assert_eq!(v, expected),
                _ => panic!("unexpected decode failure"),
            }
        }
        assert_eq!(enc_state, dec_state);
    }

    #[test]
    fn roundtrips_small_values() {
        roundtrip(&[0, 0, 0, 1, 2, 3, 4, 5, 1, 0, 0]);
    }

    #[test]
    fn roundtrips_large_values_crossing_the_bound() {
        roundtrip(&[0, 50_000, 100_000, 1, 2_000_000, 0, 999]);
    }

    #[test]
    fn k_stays_within_bounds_under_extreme_input() {
        let mut state = RiceState::new();
        let mut bc = EncodeBitcache::new();
        let mut out = Vec::new();
        let mut crc = FrameCrc::new();
        for i in 0..5000u32 {
            let v = if i % 7 == 0 { 10_000_000 } else { 0 };
            encode_value(&mut state, v, &mut bc, &mut out, &mut crc);
            assert!(state.k[0] <= 24);
            assert!(state.k[1] <= 24);
        }
    }

    #[test]
    fn malformed_unary_run_is_reported() {
        let mut state = RiceState::new();
        let mut bc = DecodeBitcache::new();
        let src = vec![0xFFu8; 9000];
        let mut pos = 0usize;
        let mut crc = FrameCrc::new();
        match decode_value(&mut state, &mut bc, &src, &mut pos, &mut crc, SampleBytes::Two) {
            ValueRead::Malformed => {}
            _ => panic!("expected malformed unary run to be detected"),
        }
    }
}
