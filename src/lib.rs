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

//! `ttacore` is a reentrant, byte-exact implementation of the TTA1 lossless
//! audio codec: a fixed-order-1 linear predictor feeding an 8-tap adaptive
//! sign-LMS filter, encoded with an adaptive two-stage Rice code and guarded
//! by a per-frame CRC-32.
//!
//! The codec core (the [`codec`] module) is a pure, synchronous state
//! machine: one call processes as much of one frame as the caller's buffers
//! allow and returns, so it never owns a thread, a file handle, or an
//! allocator strategy of its own. The [`pipeline`] module builds a
//! multi-threaded frame pipeline on top of it for callers that want to
//! overlap codec work with I/O across several CPUs; single-threaded callers
//! can drive [`codec::encode`]/[`codec::decode`] directly instead.

pub mod bitcache;
pub mod codec;
pub mod crc;
pub mod error;
pub mod filter;
pub mod pcm;
pub mod pipeline;
pub mod predict;
pub mod rice;
pub mod sample;
pub mod sizing;
pub mod state;

pub use codec::{ChannelSupport, DecodeConfig, EncodeConfig};
pub use error::{CodecError, CodecResult, DecodeOutcome, EncodeOutcome};
pub use pipeline::{
    DecodeReport, EncodeReport, PipelineConfig, PipelineError, StreamConfig, decode_stream, encode_stream,
};
pub use sample::SampleBytes;
pub use state::{PrivateState, UserState};

/// Plain compile-time version/metadata record for the library, independent
/// of whatever `CARGO_PKG_VERSION` the crate is currently published under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

/// The TTA1 format revision this codec implements, plus a copyright and
/// license line suitable for a CLI's `--version` output.
pub const VERSION: Version = Version { major: 1, minor: 0, revision: 0 };
pub const BUILD_DATE: &str = "2026-08-01";
pub const COPYRIGHT: &str = "Copyright (C) 2014-2026 ttacore contributors";
pub const LICENSE: &str = "GPL-3.0-or-later";

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}
