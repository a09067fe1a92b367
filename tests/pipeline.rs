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

//! Pipeline-level integration tests (P1, P2, P3): these drive
//! [`ttacore::encode_stream`]/[`ttacore::decode_stream`] directly rather
//! than the codec core, the way claxon's `tests/testsamples.rs` exercises
//! `FlacStream` rather than individual subframe decoders.

use std::io::Cursor;

use ttacore::codec::{self, ChannelSupport, EncodeConfig};
use ttacore::state::{PrivateState, UserState};
use ttacore::{PipelineConfig, StreamConfig, decode_stream, encode_stream};

/// Encodes a whole file's worth of PCM with a single codec call per frame,
/// single-threaded, as the reference against which pipeline output is
/// compared for P1 (ordering is independent of worker count).
fn encode_reference(pcm: &[u8], stream: &StreamConfig) -> (Vec<u8>, Vec<usize>) {
    let ni32_perframe = stream.ni32_perframe();
    let frame_bytes = ni32_perframe * stream.samplebytes as usize;
    let mut out = Vec::new();
    let mut frame_lengths = Vec::new();

    for chunk in pcm.chunks_exact(frame_bytes) {
        let mut samples = vec![0i32; ni32_perframe];
        ttacore::pcm::pcm_read(&mut samples, chunk, ni32_perframe, stream.samplebytes);

        let mut dest = Vec::new();
        let mut priv_state = PrivateState::new(stream.nchan);
        let mut user = UserState::new();
        let cfg = EncodeConfig {
            dest_capacity: frame_bytes + ttacore::sizing::ttabuf_safety_margin(stream.samplebytes, stream.nchan),
            src_length: samples.len(),
            ni32_target: ni32_perframe,
            ni32_perframe,
            samplebytes: stream.samplebytes,
            nchan: stream.nchan,
        };
        codec::encode(&mut dest, &samples, &cfg, ChannelSupport::ALL, &mut priv_state, &mut user).unwrap();
        frame_lengths.push(dest.len());
        out.extend_from_slice(&dest);
        out.extend_from_slice(&user.crc.to_le_bytes());
    }

    (out, frame_lengths)
}

fn make_pcm(stream: &StreamConfig, frame_count: usize) -> Vec<u8> {
    let ni32_perframe = stream.ni32_perframe();
    let mut pcm = Vec::new();
    for frame in 0..frame_count {
        for i in 0..ni32_perframe {
            let sample = ((frame as i32 * 11 + i as i32) % 61 - 30) as i16;
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
    }
    pcm
}

#[test]
fn p1_encode_output_is_independent_of_worker_count() {
    let stream = StreamConfig { samplerate: 8000, samplebytes: 2, nchan: 1 };
    let pcm = make_pcm(&stream, 6);
    let (reference, _lengths) = encode_reference(&pcm, &stream);

    for workers in [1usize, 2, 4, 8] {
        let pipeline = PipelineConfig::new(workers);
        let mut reader = Cursor::new(pcm.clone());
        let mut out = Vec::new();
        let report = encode_stream(&mut reader, &mut out, &stream, pipeline, ChannelSupport::ALL).unwrap();
        assert_eq!(report.frames_encoded, 6);
        assert_eq!(out, reference, "encoded bytes must match the single-threaded reference for workers={workers}");
    }
}

#[test]
fn p1_decode_output_is_independent_of_worker_count() {
    let stream = StreamConfig { samplerate: 8000, samplebytes: 2, nchan: 2 };
    let pcm = make_pcm(&stream, 5);
    let (tta, frame_lengths) = encode_reference(&pcm, &stream);

    for workers in [1usize, 2, 4, 8] {
        let pipeline = PipelineConfig::new(workers);
        let mut reader = Cursor::new(tta.clone());
        let mut out = Vec::new();
        let report =
            decode_stream(&mut reader, &mut out, &frame_lengths, &stream, pipeline, ChannelSupport::ALL).unwrap();
        assert_eq!(report.frames_decoded, 5);
        assert_eq!(report.frames_failed, 0);
        assert_eq!(report.crc_mismatches, 0);
        assert_eq!(out, pcm, "decoded PCM must match the original input for workers={workers}");
    }
}

#[test]
fn p2_tiny_input_smaller_than_the_ring_round_trips() {
    let stream = StreamConfig { samplerate: 8000, samplebytes: 1, nchan: 1 };
    let pipeline = PipelineConfig::new(4);
    assert!(pipeline.ring_len > 1, "ring must hold more than one slot for this to be a meaningful tiny-input case");

    let pcm = make_pcm(&stream, 1);
    let (tta, frame_lengths) = encode_reference(&pcm, &stream);

    let mut reader = Cursor::new(tta);
    let mut out = Vec::new();
    let report =
        decode_stream(&mut reader, &mut out, &frame_lengths, &stream, pipeline, ChannelSupport::ALL).unwrap();
    assert_eq!(report.frames_decoded, 1);
    assert_eq!(out, pcm);
}

#[test]
fn p3_ring_length_equal_to_worker_count_is_rejected_rather_than_risking_deadlock() {
    let stream = StreamConfig { samplerate: 8000, samplebytes: 2, nchan: 1 };
    let bad = ttacore::PipelineConfig { workers: 3, ring_len: 3 };
    let mut reader = Cursor::new(Vec::<u8>::new());
    let mut out = Vec::new();
    let err = encode_stream(&mut reader, &mut out, &stream, bad, ChannelSupport::ALL).unwrap_err();
    assert!(matches!(err, ttacore::PipelineError::RingTooSmall { ring_len: 3, workers: 3 }));
}

#[test]
fn malformed_seektable_entry_stops_decoding_without_erroring_the_pipeline() {
    let stream = StreamConfig { samplerate: 8000, samplebytes: 2, nchan: 1 };
    let pcm = make_pcm(&stream, 3);
    let (tta, mut frame_lengths) = encode_reference(&pcm, &stream);
    frame_lengths[1] = 0;

    let pipeline = PipelineConfig::new(2);
    let mut reader = Cursor::new(tta);
    let mut out = Vec::new();
    let report =
        decode_stream(&mut reader, &mut out, &frame_lengths, &stream, pipeline, ChannelSupport::ALL).unwrap();
    assert_eq!(report.frames_decoded, 1, "only the frame before the malformed entry should decode");
}
