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

//! The `pipeline` module implements C8: one I/O thread overlapping file
//! I/O with `W` worker threads, each running one [`crate::codec`] instance
//! per frame against a ring of [`FrameSlot`]s.
//!
//! The calling thread plays the role of the I/O thread described in §4.8 —
//! it spawns the workers, then itself drives the read/dispatch/write loop,
//! rather than a separate thread being spun up purely for I/O. This keeps
//! the borrow of the caller's reader/writer scoped (via
//! `std::thread::scope`) without requiring `'static` bounds or an `Arc`
//! wrapper around either.

pub mod slot;
pub mod sync;

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;

use crate::codec::{self, ChannelSupport, DecodeConfig, EncodeConfig};
use crate::crc::crc32;
use crate::error::{CodecError, DecodeOutcome, EncodeOutcome};
use crate::pcm::{pcm_read, pcm_write};
use crate::sizing::{nsamples_perframe_tta1, ttabuf_safety_margin};
use crate::state::PrivateState;

use slot::{FrameSlot, SlotOutcome};
use sync::{RingCursor, Semaphore};

/// Stream-wide parameters shared by every frame (not part of the per-call
/// codec config, which is derived from this plus each slot's own sizes).
#[derive(Clone, Copy, Debug)]
pub struct StreamConfig {
    pub samplerate: u32,
    pub samplebytes: u8,
    pub nchan: usize,
}

impl StreamConfig {
    /// Total interleaved i32 samples per frame (`nsamples_perframe_tta1`
    /// per channel, times `nchan`). `0` if the sample rate is invalid.
    pub fn ni32_perframe(&self) -> usize {
        nsamples_perframe_tta1(self.samplerate).saturating_mul(self.nchan)
    }
}

/// Worker count and ring length for the frame pipeline. Deadlock freedom
/// requires `ring_len > workers` (§5); the default `ring_len = 2 * workers`
/// satisfies this with headroom for a full pipeline.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    pub workers: usize,
    pub ring_len: usize,
}

impl PipelineConfig {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        PipelineConfig { workers, ring_len: 2 * workers }
    }
}

impl Default for PipelineConfig {
    /// One worker per online CPU, per §4.8 "typically one per online CPU".
    fn default() -> Self {
        PipelineConfig::new(num_cpus::get())
    }
}

/// Fatal pipeline errors (§7: "all `invalid_*` and `misconfig` are
/// considered programmer errors and abort the pipeline"). Per-frame
/// problems (`decode_fail`, a CRC mismatch, a malformed length entry) are
/// not represented here; they are logged and folded into the returned
/// report instead.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("i/o error driving the frame pipeline: {0}")]
    Io(#[from] io::Error),
    #[error("codec core rejected pipeline parameters: {0}")]
    Codec(#[from] CodecError),
    #[error("ring length {ring_len} must exceed worker count {workers} to avoid deadlock")]
    RingTooSmall { ring_len: usize, workers: usize },
    #[error("stream config yields zero samples per frame (samplerate={samplerate})")]
    EmptyFrame { samplerate: u32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeReport {
    pub frames_encoded: usize,
    pub total_tta_bytes: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub frames_decoded: usize,
    pub frames_failed: usize,
    pub crc_mismatches: usize,
}

struct RingSlot {
    data: std::sync::Mutex<FrameSlot>,
    processed: Semaphore,
}

impl RingSlot {
    fn new() -> Self {
        RingSlot { data: std::sync::Mutex::new(FrameSlot::new()), processed: Semaphore::new(0) }
    }
}

fn build_ring(ring_len: usize) -> Vec<RingSlot> {
    (0..ring_len).map(|_| RingSlot::new()).collect()
}

fn encode_worker(ring: &[RingSlot], available: &Semaphore, cursor: &RingCursor, support: ChannelSupport, nchan: usize, samplebytes: u8) -> Result<(), CodecError> {
    let mut priv_state = PrivateState::new(nchan);
    loop {
        available.wait();
        let idx = cursor.take_next();
        let ring_slot = &ring[idx];
        let mut slot = ring_slot.data.lock().unwrap();
        if slot.is_encode_sentinel() {
            drop(slot);
            ring_slot.processed.post();
            return Ok(());
        }

        let ni32_perframe = slot.ni32_perframe;
        let margin = ttabuf_safety_margin(samplebytes, nchan);
        let cfg = EncodeConfig {
            dest_capacity: ni32_perframe.saturating_mul(samplebytes as usize).saturating_add(margin),
            src_length: slot.samples.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            samplebytes,
            nchan,
        };

        let mut samples = std::mem::take(&mut slot.samples);
        let mut tta = std::mem::take(&mut slot.tta);
        let mut user = slot.user;
        let outcome = codec::encode(&mut tta, &samples, &cfg, support, &mut priv_state, &mut user)?;
        debug_assert_eq!(outcome, EncodeOutcome::Done, "pipeline always dispatches a whole frame in one call");

        slot.tta = tta;
        slot.samples = samples;
        slot.user = user;
        slot.outcome = SlotOutcome::Encoded;
        drop(slot);
        ring_slot.processed.post();
    }
}

fn decode_worker(ring: &[RingSlot], available: &Semaphore, cursor: &RingCursor, support: ChannelSupport, nchan: usize, samplebytes: u8) -> Result<(), CodecError> {
    let mut priv_state = PrivateState::new(nchan);
    loop {
        available.wait();
        let idx = cursor.take_next();
        let ring_slot = &ring[idx];
        let mut slot = ring_slot.data.lock().unwrap();
        if slot.is_decode_sentinel() {
            drop(slot);
            ring_slot.processed.post();
            return Ok(());
        }

        let nbytes_tta_perframe = slot.nbytes_tta_perframe;
        let ni32_perframe = slot.ni32_perframe;
        let cfg = DecodeConfig {
            dest_capacity: slot.samples.len(),
            src_length: slot.tta.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            nbytes_tta_target: nbytes_tta_perframe,
            nbytes_tta_perframe,
            samplebytes,
            nchan,
        };

        let tta = std::mem::take(&mut slot.tta);
        let mut samples = std::mem::take(&mut slot.samples);
        let mut user = slot.user;
        let outcome = codec::decode(&mut samples, &tta, &cfg, support, &mut priv_state, &mut user)?;

        pcm_write(&mut slot.pcm, &samples, ni32_perframe, samplebytes);
        slot.samples = samples;
        slot.tta = tta;
        slot.user = user;
        slot.outcome = match outcome {
            DecodeOutcome::Done => SlotOutcome::Decoded,
            DecodeOutcome::Again => SlotOutcome::Decoded,
            DecodeOutcome::DecodeFail => {
                log::warn!("ttacore: frame failed to decode cleanly, zero-padded tail emitted");
                SlotOutcome::DecodeFailed
            }
        };
        drop(slot);
        ring_slot.processed.post();
    }
}

/// Reads into `buf` until it is full or the reader reaches EOF, returning
/// the number of bytes actually read (less than `buf.len()` only at EOF).
fn read_as_much_as_possible<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn spawn_workers<'scope, 'env>(
    scope: &'scope thread::Scope<'scope, 'env>,
    workers: usize,
    ring: &'scope [RingSlot],
    available: &'scope Semaphore,
    cursor: &'scope RingCursor,
    support: ChannelSupport,
    nchan: usize,
    samplebytes: u8,
    is_encode: bool,
) -> Vec<thread::ScopedJoinHandle<'scope, Result<(), CodecError>>> {
    (0..workers)
        .map(|_| {
            scope.spawn(move || {
                if is_encode {
                    encode_worker(ring, available, cursor, support, nchan, samplebytes)
                } else {
                    decode_worker(ring, available, cursor, support, nchan, samplebytes)
                }
            })
        })
        .collect()
}

fn join_workers(handles: Vec<thread::ScopedJoinHandle<'_, Result<(), CodecError>>>) -> Result<(), PipelineError> {
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PipelineError::Codec(e)),
            Err(_) => panic!("ttacore: a frame pipeline worker thread panicked"),
        }
    }
    Ok(())
}

/// Runs the encode pipeline (§4.8 "Encode schedule") end to end: reads PCM
/// from `reader` a frame at a time, fans each frame out to `pipeline.workers`
/// worker threads, and writes each frame's TTA body followed by its 4-byte
/// little-endian CRC to `writer`, in input order.
pub fn encode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    stream: &StreamConfig,
    pipeline: PipelineConfig,
    support: ChannelSupport,
) -> Result<EncodeReport, PipelineError> {
    if pipeline.ring_len <= pipeline.workers {
        return Err(PipelineError::RingTooSmall { ring_len: pipeline.ring_len, workers: pipeline.workers });
    }
    let ni32_perframe = stream.ni32_perframe();
    if ni32_perframe == 0 {
        return Err(PipelineError::EmptyFrame { samplerate: stream.samplerate });
    }

    let ring = build_ring(pipeline.ring_len);
    let available = Semaphore::new(0);
    let cursor = RingCursor::new(pipeline.ring_len);
    let margin = ttabuf_safety_margin(stream.samplebytes, stream.nchan);
    let pcm_frame_bytes = ni32_perframe * stream.samplebytes as usize;
    let tta_capacity = pcm_frame_bytes + margin;

    thread::scope(|scope| -> Result<EncodeReport, PipelineError> {
        let handles = spawn_workers(scope, pipeline.workers, &ring, &available, &cursor, support, stream.nchan, stream.samplebytes, true);

        let mut report = EncodeReport::default();
        let mut pcm_buf = vec![0u8; pcm_frame_bytes];
        let mut pending: VecDeque<usize> = VecDeque::new();
        let mut next_idx = 0usize;

        loop {
            let nread = read_as_much_as_possible(reader, &mut pcm_buf)?;
            if nread == 0 {
                break;
            }
            if nread < pcm_buf.len() {
                log::warn!("ttacore: input truncated mid-frame, zero-padding the final frame");
                pcm_buf[nread..].fill(0);
            }

            if pending.len() == pipeline.ring_len {
                let oldest = pending.pop_front().unwrap();
                write_encoded_frame(writer, &ring[oldest], &mut report)?;
            }

            let idx = next_idx % pipeline.ring_len;
            {
                let mut slot = ring[idx].data.lock().unwrap();
                slot.reset_for_encode(ni32_perframe, tta_capacity);
                pcm_read(&mut slot.samples, &pcm_buf, ni32_perframe, stream.samplebytes);
            }
            available.post();
            pending.push_back(idx);
            next_idx += 1;

            if nread < pcm_buf.len() {
                break;
            }
        }

        while let Some(idx) = pending.pop_front() {
            write_encoded_frame(writer, &ring[idx], &mut report)?;
        }

        for _ in 0..pipeline.workers {
            let idx = next_idx % pipeline.ring_len;
            ring[idx].data.lock().unwrap().reset_for_encode(0, 0);
            available.post();
            next_idx += 1;
        }

        join_workers(handles)?;
        Ok(report)
    })
}

fn write_encoded_frame<W: Write>(writer: &mut W, ring_slot: &RingSlot, report: &mut EncodeReport) -> Result<(), PipelineError> {
    ring_slot.processed.wait();
    let slot = ring_slot.data.lock().unwrap();
    writer.write_all(&slot.tta)?;
    writer.write_all(&slot.user.crc.to_le_bytes())?;
    report.frames_encoded += 1;
    report.total_tta_bytes += slot.tta.len() + 4;
    Ok(())
}

/// Runs the decode pipeline (§4.8 "Decode schedule"). `frame_tta_lengths`
/// is the pre-stripped `nbytes_tta_perframe` for each frame (the seektable
/// entry minus the trailing CRC's 4 bytes), supplied by the caller since
/// parsing the on-disk seektable format is out of scope for this core. A
/// `0` entry is treated the way a malformed or missing seektable entry is
/// (§4.8): decoding stops at that point without error.
pub fn decode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    frame_tta_lengths: &[usize],
    stream: &StreamConfig,
    pipeline: PipelineConfig,
    support: ChannelSupport,
) -> Result<DecodeReport, PipelineError> {
    if pipeline.ring_len <= pipeline.workers {
        return Err(PipelineError::RingTooSmall { ring_len: pipeline.ring_len, workers: pipeline.workers });
    }
    let ni32_perframe = stream.ni32_perframe();
    if ni32_perframe == 0 {
        return Err(PipelineError::EmptyFrame { samplerate: stream.samplerate });
    }

    let ring = build_ring(pipeline.ring_len);
    let available = Semaphore::new(0);
    let cursor = RingCursor::new(pipeline.ring_len);

    thread::scope(|scope| -> Result<DecodeReport, PipelineError> {
        let handles = spawn_workers(scope, pipeline.workers, &ring, &available, &cursor, support, stream.nchan, stream.samplebytes, false);

        let mut report = DecodeReport::default();
        let mut pending: VecDeque<usize> = VecDeque::new();
        let mut next_idx = 0usize;
        let mut crc_trailer = [0u8; 4];

        for &nbytes_tta_perframe in frame_tta_lengths {
            if nbytes_tta_perframe == 0 {
                log::warn!("ttacore: malformed or zero-length seektable entry, stopping decode early");
                break;
            }

            if pending.len() == pipeline.ring_len {
                let oldest = pending.pop_front().unwrap();
                write_decoded_frame(writer, &ring[oldest], &mut report)?;
            }

            let idx = next_idx % pipeline.ring_len;
            {
                let mut slot = ring[idx].data.lock().unwrap();
                slot.reset_for_decode(nbytes_tta_perframe, ni32_perframe, stream.samplebytes);
                slot.tta.resize(nbytes_tta_perframe, 0);
                let got = read_as_much_as_possible(reader, &mut slot.tta)?;
                if got < nbytes_tta_perframe {
                    slot.tta.truncate(got);
                    log::warn!("ttacore: input truncated before this frame's declared length");
                } else {
                    let got_crc = read_as_much_as_possible(reader, &mut crc_trailer)?;
                    if got_crc == 4 {
                        let expected = u32::from_le_bytes(crc_trailer);
                        if crc32(&slot.tta) != expected {
                            log::warn!("ttacore: frame CRC mismatch");
                            report.crc_mismatches += 1;
                        }
                    }
                }
            }
            available.post();
            pending.push_back(idx);
            next_idx += 1;
        }

        while let Some(idx) = pending.pop_front() {
            write_decoded_frame(writer, &ring[idx], &mut report)?;
        }

        for _ in 0..pipeline.workers {
            let idx = next_idx % pipeline.ring_len;
            ring[idx].data.lock().unwrap().reset_for_decode(0, 0, stream.samplebytes);
            available.post();
            next_idx += 1;
        }

        join_workers(handles)?;
        Ok(report)
    })
}

fn write_decoded_frame<W: Write>(writer: &mut W, ring_slot: &RingSlot, report: &mut DecodeReport) -> Result<(), PipelineError> {
    ring_slot.processed.wait();
    let slot = ring_slot.data.lock().unwrap();
    writer.write_all(&slot.pcm)?;
    match slot.outcome {
        SlotOutcome::DecodeFailed => report.frames_failed += 1,
        _ => report.frames_decoded += 1,
    }
    Ok(())
}
