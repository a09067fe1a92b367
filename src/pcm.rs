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

//! The `pcm` module converts between packed little-endian PCM bytes and
//! signed 32-bit samples (C1). This is a pure byte shuffle; it holds no
//! state and cannot fail except by reporting zero samples converted for an
//! unsupported sample width.

/// Reads `n_samples` packed PCM samples from `src` into `dst` as signed
/// 32-bit integers, returning the number of samples actually converted.
///
/// Returns `0` if `samplebytes` is not one of `{1, 2, 3}`, or if `src` is
/// too short to hold `n_samples` of that width.
pub fn pcm_read(dst: &mut [i32], src: &[u8], n_samples: usize, samplebytes: u8) -> usize {
    let width = samplebytes as usize;
    if !(1..=3).contains(&width) {
        return 0;
    }
    if src.len() < n_samples * width || dst.len() < n_samples {
        return 0;
    }

    for i in 0..n_samples {
        let b = &src[i * width..i * width + width];
        dst[i] = match samplebytes {
            1 => (b[0] as i32) - 0x80,
            2 => (i16::from_le_bytes([b[0], b[1]])) as i32,
            3 => {
                let u = (b[0] as u32) | ((b[1] as u32) << 8) | ((b[2] as u32) << 16);
                sign_extend_24(u)
            }
            _ => unreachable!(),
        };
    }
    n_samples
}

/// Writes `n_samples` signed 32-bit samples from `src` into `dst` as
/// packed little-endian PCM bytes, returning the number of samples
/// actually converted. Mirrors [`pcm_read`].
pub fn pcm_write(dst: &mut [u8], src: &[i32], n_samples: usize, samplebytes: u8) -> usize {
    let width = samplebytes as usize;
    if !(1..=3).contains(&width) {
        return 0;
    }
    if dst.len() < n_samples * width || src.len() < n_samples {
        return 0;
    }

    for i in 0..n_samples {
        let out = &mut dst[i * width..i * width + width];
        match samplebytes {
            1 => out[0] = ((src[i] + 0x80) & 0xff) as u8,
            2 => {
                let bytes = (src[i] as i16).to_le_bytes();
                out.copy_from_slice(&bytes);
            }
            3 => {
                let u = src[i] as u32;
                out[0] = (u & 0xff) as u8;
                out[1] = ((u >> 8) & 0xff) as u8;
                out[2] = ((u >> 16) & 0xff) as u8;
            }
            _ => unreachable!(),
        }
    }
    n_samples
}

/// Sign-extends a 24-bit two's-complement value (top byte's MSB is the
/// sign bit) to a full-width `i32`.
fn sign_extend_24(u: u32) -> i32 {
    ((u << 8) as i32) >> 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_bit_bias_roundtrips() {
        let pcm = [0x00u8, 0x80, 0xff];
        let mut i32s = [0i32; 3];
        assert_eq!(pcm_read(&mut i32s, &pcm, 3, 1), 3);
        assert_eq!(i32s, [-0x80, 0, 0x7f]);

        let mut out = [0u8; 3];
        assert_eq!(pcm_write(&mut out, &i32s, 3, 1), 3);
        assert_eq!(out, pcm);
    }

    #[test]
    fn sixteen_bit_is_signed_le() {
        let pcm = [0x01, 0x00, 0xff, 0xff, 0x00, 0x80];
        let mut i32s = [0i32; 3];
        assert_eq!(pcm_read(&mut i32s, &pcm, 3, 2), 3);
        assert_eq!(i32s, [1, -1, -32768]);

        let mut out = [0u8; 6];
        assert_eq!(pcm_write(&mut out, &i32s, 3, 2), 3);
        assert_eq!(out, pcm);
    }

    #[test]
    fn twenty_four_bit_sign_extends() {
        let pcm = [0xff, 0xff, 0xff, 0x00, 0x00, 0x80];
        let mut i32s = [0i32; 2];
        assert_eq!(pcm_read(&mut i32s, &pcm, 2, 3), 2);
        assert_eq!(i32s, [-1, -0x0080_0000]);

        let mut out = [0u8; 6];
        assert_eq!(pcm_write(&mut out, &i32s, 2, 3), 2);
        assert_eq!(out, pcm);
    }

    #[test]
    fn invalid_samplebytes_reports_zero() {
        let mut i32s = [0i32; 2];
        assert_eq!(pcm_read(&mut i32s, &[0, 0, 0, 0], 2, 0), 0);
        assert_eq!(pcm_read(&mut i32s, &[0, 0, 0, 0], 2, 4), 0);
    }

    #[test]
    fn short_source_reports_zero() {
        let mut i32s = [0i32; 2];
        assert_eq!(pcm_read(&mut i32s, &[0, 0, 0], 2, 2), 0);
    }
}
