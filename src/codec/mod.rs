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

//! The `codec` module implements C7 (frame codec) and C11 (channel-count
//! dispatch): the per-frame streaming `encode`/`decode` entry points, the
//! inter-channel decorrelation pass, and the `again`/`done`/`decode_fail`
//! state machine that lets a caller slice one frame across several calls.
//!
//! Channel decorrelation for the trailing channel runs against
//! `prev_last`, which the spec describes only as "the last channel's
//! pre-decorrelation residual from this same sample step". That residual
//! is exactly the value the forward differencing loop already computes
//! for the second-to-last channel (`s[last] - s[second_last]`) on its
//! final iteration, so no state needs to persist across sample steps:
//! `prev_last` is just whatever the loop left behind this time around.

pub mod channel;

use crate::crc::FrameCrc;
use crate::error::{CodecError, CodecResult, DecodeOutcome, EncodeOutcome};
use crate::rice::{self, ValueRead};
use crate::sample::SampleBytes;
use crate::sizing::ttabuf_safety_margin;
use crate::state::{PrivateState, UserState};

/// Which channel-count specializations this build supports (C11). A build
/// may disable any non-empty subset; requesting a disabled case returns
/// [`CodecError::Misconfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSupport {
    pub mono: bool,
    pub stereo: bool,
    pub general: bool,
}

impl ChannelSupport {
    /// The default build: every channel count is supported.
    pub const ALL: ChannelSupport = ChannelSupport { mono: true, stereo: true, general: true };

    /// Returns `n` if this build supports `n` channels, `0` otherwise.
    pub fn test_nchan(&self, n: usize) -> usize {
        let supported = match n {
            0 => false,
            1 => self.mono,
            2 => self.stereo,
            _ => self.general,
        };
        if supported {
            n
        } else {
            0
        }
    }
}

impl Default for ChannelSupport {
    fn default() -> Self {
        ChannelSupport::ALL
    }
}

/// Per-call encode parameters (§3 "codec config").
#[derive(Clone, Copy, Debug)]
pub struct EncodeConfig {
    /// Total bytes available in the destination buffer for this whole
    /// frame (not just this call).
    pub dest_capacity: usize,
    /// Number of i32 samples available in `src_i32` for this call.
    pub src_length: usize,
    /// Number of i32 samples this call should attempt to consume. Must be
    /// a multiple of `nchan`.
    pub ni32_target: usize,
    /// Total i32 samples (all channels) in the frame.
    pub ni32_perframe: usize,
    pub samplebytes: u8,
    pub nchan: usize,
}

/// Per-call decode parameters (§3 "codec config").
#[derive(Clone, Copy, Debug)]
pub struct DecodeConfig {
    /// Number of i32 samples the destination buffer can hold this call.
    pub dest_capacity: usize,
    /// Number of TTA bytes available in `src` for this call.
    pub src_length: usize,
    pub ni32_target: usize,
    pub ni32_perframe: usize,
    /// TTA bytes this call should attempt to consume.
    pub nbytes_tta_target: usize,
    /// Total TTA bytes (frame body only, CRC excluded) for the frame.
    pub nbytes_tta_perframe: usize,
    pub samplebytes: u8,
    pub nchan: usize,
}

fn validate_common(
    nchan: usize,
    samplebytes: u8,
    ni32_perframe: usize,
    ni32_target: usize,
    ni32_total_so_far: usize,
) -> CodecResult<SampleBytes> {
    if nchan == 0 || ni32_perframe == 0 {
        return Err(CodecError::range());
    }
    let sb = SampleBytes::from_u8(samplebytes)?;
    if ni32_target % nchan != 0 {
        return Err(CodecError::trunc());
    }
    if ni32_target > ni32_perframe.saturating_sub(ni32_total_so_far) {
        return Err(CodecError::bounds());
    }
    Ok(sb)
}

/// Encodes up to `cfg.ni32_target` interleaved i32 samples from the start
/// of `src_i32` (a per-call buffer; frame-wide progress lives in `user`),
/// appending compressed TTA bytes to `dest`. On the call that completes
/// the frame (`user.ni32_total` reaches `cfg.ni32_perframe`), the
/// bitcache is flushed and the CRC finalized into `user.crc`.
pub fn encode(
    dest: &mut Vec<u8>,
    src_i32: &[i32],
    cfg: &EncodeConfig,
    support: ChannelSupport,
    priv_state: &mut PrivateState,
    user: &mut UserState,
) -> CodecResult<EncodeOutcome> {
    let sb = validate_common(cfg.nchan, cfg.samplebytes, cfg.ni32_perframe, cfg.ni32_target, user.ni32_total)?;
    if cfg.src_length < cfg.ni32_target {
        return Err(CodecError::bounds());
    }
    let natural_upper_bound = cfg.ni32_perframe.saturating_mul(sb.as_u8() as usize);
    let margin = ttabuf_safety_margin(cfg.samplebytes, cfg.nchan);
    if cfg.dest_capacity < natural_upper_bound.saturating_add(margin) {
        return Err(CodecError::bounds());
    }
    if support.test_nchan(cfg.nchan) == 0 {
        return Err(CodecError::Misconfig { nchan: cfg.nchan });
    }
    if priv_state.nchan() != cfg.nchan {
        return Err(CodecError::range());
    }

    if user.ncalls_codec == 0 {
        priv_state.reset();
        *user = UserState::new();
    }

    let nchan = cfg.nchan;
    let mut nsamples_done = 0usize;
    let bytes_at_call_start = dest.len();

    while nsamples_done < cfg.ni32_target {
        if dest.len() + margin >= cfg.dest_capacity {
            log::warn!("ttacore: encode hit the soft write limit mid-frame, returning again");
            break;
        }
        let sample_step = &src_i32[nsamples_done..nsamples_done + nchan];
        let residuals = decorrelate_encode(sample_step, nchan);

        let (channels, bitcache, crc) = priv_state.encode_parts();
        for (ch, &residual) in channels.iter_mut().zip(residuals.iter()) {
            let folded = channel::encode_sample(ch, residual, sb);
            rice::encode_value(&mut ch.rice, folded, bitcache, dest, crc);
        }
        nsamples_done += nchan;
    }

    user.ni32 = nsamples_done;
    user.ni32_total += nsamples_done;
    user.nbytes_tta = dest.len() - bytes_at_call_start;
    user.nbytes_tta_total += user.nbytes_tta;
    user.ncalls_codec += 1;

    if user.ni32_total == cfg.ni32_perframe {
        priv_state.encode_bitcache.flush(dest, &mut priv_state.crc);
        user.nbytes_tta = dest.len() - bytes_at_call_start;
        user.nbytes_tta_total = dest.len();
        user.crc = std::mem::replace(&mut priv_state.crc, FrameCrc::new()).finish();
        Ok(EncodeOutcome::Done)
    } else {
        Ok(EncodeOutcome::Again)
    }
}

/// Decodes up to `cfg.nbytes_tta_target` TTA bytes from the start of
/// `src` (a per-call buffer; frame-wide progress lives in `user`) into
/// the start of `dest_i32`.
///
/// A call whose `nbytes_tta_target` covers the rest of the frame's byte
/// budget is treated as the frame's last call (there is nowhere else for
/// more bytes to come from), so its contribution to `nbytes_tta_total` is
/// the frame's full remaining size regardless of how far the bit reader
/// actually got — a frame's trailing flush padding is never read by the
/// bitcache, so tying "done" to the bit reader's literal cursor position
/// would leave `nbytes_tta_total` permanently short of
/// `nbytes_tta_perframe` even for a well-formed frame. Returns
/// [`DecodeOutcome::DecodeFail`], with this call's unfilled samples
/// zeroed, if that final call's byte and sample budgets don't run out
/// together.
pub fn decode(
    dest_i32: &mut [i32],
    src: &[u8],
    cfg: &DecodeConfig,
    support: ChannelSupport,
    priv_state: &mut PrivateState,
    user: &mut UserState,
) -> CodecResult<DecodeOutcome> {
    let sb = validate_common(cfg.nchan, cfg.samplebytes, cfg.ni32_perframe, cfg.ni32_target, user.ni32_total)?;
    if cfg.nbytes_tta_perframe == 0 {
        return Err(CodecError::range());
    }
    if cfg.nbytes_tta_target > cfg.nbytes_tta_perframe.saturating_sub(user.nbytes_tta_total) {
        return Err(CodecError::bounds());
    }
    // Unlike encode's `src_i32`, a decode `src` slice shorter than
    // `nbytes_tta_target` is not a config error: that is exactly what a
    // truncated file looks like, and the loop below reports it as
    // `DecodeFail` rather than a programmer error.
    if cfg.dest_capacity < cfg.ni32_target {
        return Err(CodecError::bounds());
    }
    if support.test_nchan(cfg.nchan) == 0 {
        return Err(CodecError::Misconfig { nchan: cfg.nchan });
    }
    if priv_state.nchan() != cfg.nchan {
        return Err(CodecError::range());
    }

    if user.ncalls_codec == 0 {
        priv_state.reset();
        *user = UserState::new();
    }

    let nchan = cfg.nchan;
    let remaining_frame_bytes = cfg.nbytes_tta_perframe - user.nbytes_tta_total;
    let is_final_call = cfg.nbytes_tta_target >= remaining_frame_bytes;
    let mut pos = 0usize;
    let read_limit = cfg.nbytes_tta_target.min(src.len());
    let mut nsamples_done = 0usize;

    let mut curr = vec![0i32; nchan];
    'outer: while nsamples_done < cfg.ni32_target && pos < read_limit {
        let (channels, bitcache, crc) = priv_state.decode_parts();
        for (ch, slot) in channels.iter_mut().zip(curr.iter_mut()) {
            match rice::decode_value(&mut ch.rice, bitcache, src, &mut pos, crc, sb) {
                ValueRead::Value(v) => *slot = channel::decode_sample(ch, v, sb),
                ValueRead::NeedMoreData => break 'outer,
                ValueRead::Malformed => {
                    log::warn!("ttacore: malformed unary run while decoding frame, treating as decode_fail");
                    break 'outer;
                }
            }
        }
        let samples = decorrelate_decode(&curr, nchan);
        dest_i32[nsamples_done..nsamples_done + nchan].copy_from_slice(&samples);
        nsamples_done += nchan;
    }

    user.ni32 = nsamples_done;
    user.ni32_total += nsamples_done;
    user.ncalls_codec += 1;

    // A call that claims to cover the rest of the frame's byte budget is
    // the last one the caller will ever make for this frame (mirrors how
    // the reference pipeline hands over a file's final, possibly-short
    // chunk): its byte total is forced to the frame's full size even if
    // the bit reader itself stalled partway through, since there is no
    // more data coming to finish the job.
    let bytes_accepted_this_call = if is_final_call { remaining_frame_bytes } else { cfg.nbytes_tta_target };
    user.nbytes_tta = bytes_accepted_this_call;
    user.nbytes_tta_total += bytes_accepted_this_call;

    let samples_done = user.ni32_total == cfg.ni32_perframe;
    let bytes_done = user.nbytes_tta_total == cfg.nbytes_tta_perframe;

    if samples_done || bytes_done {
        user.crc = std::mem::replace(&mut priv_state.crc, FrameCrc::new()).finish();
        if samples_done && bytes_done {
            Ok(DecodeOutcome::Done)
        } else {
            let clear_end = cfg.ni32_target.min(dest_i32.len());
            for sample in dest_i32[nsamples_done..clear_end].iter_mut() {
                *sample = 0;
            }
            log::warn!("ttacore: frame ended with sample/byte budgets out of sync");
            Ok(DecodeOutcome::DecodeFail)
        }
    } else {
        Ok(DecodeOutcome::Again)
    }
}

/// Forward pairwise differencing (§4.7 encode). `prev_last` is the
/// second-to-last channel's residual against the last channel, computed
/// fresh for each sample step rather than carried across steps.
fn decorrelate_encode(samples: &[i32], nchan: usize) -> Vec<i32> {
    let mut residuals = vec![0i32; nchan];
    let mut prev_last = 0i32;
    for j in 0..nchan.saturating_sub(1) {
        let r = samples[j + 1] - samples[j];
        residuals[j] = r;
        prev_last = r;
    }
    residuals[nchan - 1] = samples[nchan - 1] - (prev_last / 2);
    residuals
}

/// Inverse of [`decorrelate_encode`]: `curr[j]` holds the per-channel
/// decoder's reconstructed residual (still in decorrelated domain); this
/// recovers the original interleaved samples.
fn decorrelate_decode(curr: &[i32], nchan: usize) -> Vec<i32> {
    let mut out = vec![0i32; nchan];
    if nchan == 1 {
        out[0] = curr[0];
        return out;
    }
    let mut running = curr[nchan - 1] + curr[nchan - 2] / 2;
    out[nchan - 1] = running;
    for j in (0..nchan - 1).rev() {
        running -= curr[j];
        out[j] = running;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_roundtrip(samplebytes: u8, nchan: usize, samples: &[i32]) {
        let ni32_perframe = samples.len();
        let mut dest = Vec::new();
        let mut enc_priv = PrivateState::new(nchan);
        let mut enc_user = UserState::new();
        let encode_cfg = EncodeConfig {
            dest_capacity: ni32_perframe * samplebytes as usize + ttabuf_safety_margin(samplebytes, nchan),
            src_length: samples.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            samplebytes,
            nchan,
        };
        let outcome = encode(&mut dest, samples, &encode_cfg, ChannelSupport::ALL, &mut enc_priv, &mut enc_user).unwrap();
        assert_eq!(outcome, EncodeOutcome::Done);

        let mut got = vec![0i32; ni32_perframe];
        let mut dec_priv = PrivateState::new(nchan);
        let mut dec_user = UserState::new();
        let decode_cfg = DecodeConfig {
            dest_capacity: ni32_perframe,
            src_length: dest.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            nbytes_tta_target: dest.len(),
            nbytes_tta_perframe: dest.len(),
            samplebytes,
            nchan,
        };
        let outcome = decode(&mut got, &dest, &decode_cfg, ChannelSupport::ALL, &mut dec_priv, &mut dec_user).unwrap();
        assert_eq!(outcome, DecodeOutcome::Done);
        assert_eq!(got, samples);
        assert_eq!(dec_user.crc, enc_user.crc);
    }

    #[test]
    fn mono_eight_bit_roundtrips() {
        run_roundtrip(1, 1, &[0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn stereo_sixteen_bit_roundtrips() {
        let samples: Vec<i32> = (0..200).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect();
        run_roundtrip(2, 2, &samples);
    }

    #[test]
    fn triad_twenty_four_bit_roundtrips() {
        let mut samples = Vec::new();
        for i in 0..100i32 {
            samples.extend_from_slice(&[i, -i, i * 2]);
        }
        run_roundtrip(3, 3, &samples);
    }

    #[test]
    fn split_calls_match_single_call() {
        let samples: Vec<i32> = (0..400).map(|i| (i % 31) - 15).collect();
        let nchan = 2;
        let samplebytes = 2u8;
        let ni32_perframe = samples.len();
        let margin = ttabuf_safety_margin(samplebytes, nchan);

        let mut single_dest = Vec::new();
        let mut single_priv = PrivateState::new(nchan);
        let mut single_user = UserState::new();
        let cfg = EncodeConfig {
            dest_capacity: ni32_perframe * samplebytes as usize + margin,
            src_length: samples.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            samplebytes,
            nchan,
        };
        encode(&mut single_dest, &samples, &cfg, ChannelSupport::ALL, &mut single_priv, &mut single_user).unwrap();

        let mut split_dest = Vec::new();
        let mut split_priv = PrivateState::new(nchan);
        let mut split_user = UserState::new();
        let half = ni32_perframe / 2;
        let cfg1 = EncodeConfig { ni32_target: half, ..cfg };
        let outcome1 =
            encode(&mut split_dest, &samples[..half], &cfg1, ChannelSupport::ALL, &mut split_priv, &mut split_user).unwrap();
        assert_eq!(outcome1, EncodeOutcome::Again);
        let cfg2 = EncodeConfig { ni32_target: ni32_perframe - half, ..cfg };
        let outcome2 =
            encode(&mut split_dest, &samples[half..], &cfg2, ChannelSupport::ALL, &mut split_priv, &mut split_user).unwrap();
        assert_eq!(outcome2, EncodeOutcome::Done);

        assert_eq!(single_dest, split_dest);
    }

    #[test]
    fn truncated_source_reports_decode_fail() {
        let samples: Vec<i32> = (0..300).map(|i| (i % 97) - 48).collect();
        let nchan = 1;
        let samplebytes = 1u8;
        let ni32_perframe = samples.len();
        let mut dest = Vec::new();
        let mut enc_priv = PrivateState::new(nchan);
        let mut enc_user = UserState::new();
        let cfg = EncodeConfig {
            dest_capacity: ni32_perframe * samplebytes as usize + ttabuf_safety_margin(samplebytes, nchan),
            src_length: samples.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            samplebytes,
            nchan,
        };
        encode(&mut dest, &samples, &cfg, ChannelSupport::ALL, &mut enc_priv, &mut enc_user).unwrap();

        // A genuinely truncated file: the caller only has half the frame
        // body on disk, but (not knowing that) still declares its target
        // and the frame's full size as if the whole frame were present.
        let full_len = dest.len();
        let truncated = &dest[..full_len / 2];
        let mut got = vec![-1i32; ni32_perframe];
        let mut dec_priv = PrivateState::new(nchan);
        let mut dec_user = UserState::new();
        let decode_cfg = DecodeConfig {
            dest_capacity: ni32_perframe,
            src_length: truncated.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            nbytes_tta_target: full_len,
            nbytes_tta_perframe: full_len,
            samplebytes,
            nchan,
        };
        let outcome = decode(&mut got, truncated, &decode_cfg, ChannelSupport::ALL, &mut dec_priv, &mut dec_user).unwrap();
        assert_eq!(outcome, DecodeOutcome::DecodeFail);
    }

    #[test]
    fn rejects_ni32_target_not_a_multiple_of_nchan() {
        let mut dest = Vec::new();
        let mut priv_state = PrivateState::new(2);
        let mut user = UserState::new();
        let cfg = EncodeConfig {
            dest_capacity: 1_000_000,
            src_length: 10,
            ni32_target: 3,
            ni32_perframe: 10,
            samplebytes: 2,
            nchan: 2,
        };
        let err = encode(&mut dest, &[0; 10], &cfg, ChannelSupport::ALL, &mut priv_state, &mut user).unwrap_err();
        assert_eq!(err, CodecError::trunc());
    }

    #[test]
    fn rejects_unsupported_channel_count() {
        let mut dest = Vec::new();
        let mut priv_state = PrivateState::new(6);
        let mut user = UserState::new();
        let cfg = EncodeConfig {
            dest_capacity: 1_000_000,
            src_length: 6,
            ni32_target: 6,
            ni32_perframe: 6,
            samplebytes: 2,
            nchan: 6,
        };
        let support = ChannelSupport { mono: true, stereo: true, general: false };
        let err = encode(&mut dest, &[0; 6], &cfg, support, &mut priv_state, &mut user).unwrap_err();
        assert_eq!(err, CodecError::Misconfig { nchan: 6 });
    }

    #[test]
    fn safety_margin_boundary_rejects_one_byte_short() {
        let samples = vec![0i32; 64];
        let nchan = 1;
        let samplebytes = 1u8;
        let margin = ttabuf_safety_margin(samplebytes, nchan);
        let natural = samples.len() * samplebytes as usize;

        let mut priv_state = PrivateState::new(nchan);
        let mut user = UserState::new();
        let mut dest = Vec::new();
        let ok_cfg = EncodeConfig {
            dest_capacity: natural + margin,
            src_length: samples.len(),
            ni32_target: samples.len(),
            ni32_perframe: samples.len(),
            samplebytes,
            nchan,
        };
        assert!(encode(&mut dest, &samples, &ok_cfg, ChannelSupport::ALL, &mut priv_state, &mut user).is_ok());

        let mut priv_state = PrivateState::new(nchan);
        let mut user = UserState::new();
        let mut dest = Vec::new();
        let short_cfg = EncodeConfig { dest_capacity: natural + margin - 1, ..ok_cfg };
        let err = encode(&mut dest, &samples, &short_cfg, ChannelSupport::ALL, &mut priv_state, &mut user).unwrap_err();
        assert_eq!(err, CodecError::bounds());
    }
}
