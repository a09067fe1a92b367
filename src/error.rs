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

//! The `error` module defines the programmer-error type returned by the
//! codec core, and the per-call outcome enums that are not errors at all.

use std::fmt;

/// Which of the three historically-distinct "invalid" codes triggered a
/// [`CodecError::InvalidParameters`]. Not part of the public ABI (which
/// exposes a single collapsed variant, per design note (a)), but recorded
/// for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InvalidReason {
    /// A required size was zero, or `samplebytes` was outside `{1, 2, 3}`.
    Range,
    /// `ni32_target` was not divisible by `nchan`.
    Trunc,
    /// A buffer was too small for its advertised target, or a target
    /// exceeded the remaining frame budget, or `dest_capacity` was smaller
    /// than the safety margin.
    Bounds,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            InvalidReason::Range => "a size or sample width was out of range",
            InvalidReason::Trunc => "ni32_target was not a multiple of nchan",
            InvalidReason::Bounds => "a buffer was too small for its target",
        };
        f.write_str(msg)
    }
}

/// Programmer-error returned by the codec core. These are never produced by
/// ordinary, well-formed codec usage; the frame pipeline treats every
/// variant as fatal to the pipeline (§7).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// One of the parameter invariants in the codec config was violated.
    #[error("invalid codec parameters: {reason}")]
    InvalidParameters {
        #[doc(hidden)]
        reason: InvalidReason,
    },
    /// The build does not support the requested channel count (C11).
    #[error("channel count {nchan} is not supported by this build")]
    Misconfig { nchan: usize },
}

impl CodecError {
    pub(crate) fn range() -> Self {
        CodecError::InvalidParameters { reason: InvalidReason::Range }
    }

    pub(crate) fn trunc() -> Self {
        CodecError::InvalidParameters { reason: InvalidReason::Trunc }
    }

    pub(crate) fn bounds() -> Self {
        CodecError::InvalidParameters { reason: InvalidReason::Bounds }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Outcome of a single `encode` call (§4.7 state machine).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// More samples are expected in this frame; the caller may slice the
    /// frame across further calls.
    Again,
    /// The frame is complete; the bitcache has been flushed and the CRC
    /// finalized.
    Done,
}

/// Outcome of a single `decode` call (§4.7 state machine).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// More bytes are expected in this frame.
    Again,
    /// The frame is complete and the CRC has been finalized successfully.
    Done,
    /// The byte budget was exhausted before the sample budget was met, or
    /// vice versa. Not fatal: the frame pipeline treats this as a per-frame
    /// warning (§7) and zero-pads the remainder.
    DecodeFail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameters_display_is_stable() {
        let err = CodecError::range();
        assert_eq!(
            err.to_string(),
            "invalid codec parameters: a size or sample width was out of range"
        );
    }

    #[test]
    fn misconfig_reports_channel_count() {
        let err = CodecError::Misconfig { nchan: 9 };
        assert_eq!(err.to_string(), "channel count 9 is not supported by this build");
    }
}
