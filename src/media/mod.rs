// SPDX-License-Identifier: MPL-2.0
//! Media domain types shared by the backends, the decoders and the renderers.

pub mod frame;

pub use frame::{AudioFrame, DecodedFrame, FramePayload, PixelFormat, Plane, VideoFrame};

use std::fmt;

/// Kind of elementary stream a decoder instance consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Rational scale factor converting stream ticks to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub numerator: i32,
    pub denominator: i32,
}

impl TimeBase {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Converts a tick count to whole milliseconds (truncating).
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn ticks_to_millis(self, ticks: i64) -> i64 {
        if self.denominator == 0 {
            return 0;
        }
        (ticks as f64 * f64::from(self.numerator) * 1000.0 / f64::from(self.denominator)) as i64
    }
}

/// Properties of the stream a decoder instance has opened.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub kind: MediaKind,
    /// Index of the stream inside its container.
    pub index: usize,
    pub time_base: TimeBase,
    /// Container duration in milliseconds, computed once at open.
    pub duration_ms: i64,
    /// Video width in pixels (0 for audio).
    pub width: u32,
    /// Video height in pixels (0 for audio).
    pub height: u32,
    /// Display rotation in degrees.
    pub rotation: i32,
    /// Bit rate in bits per second, 0 when unknown.
    pub bit_rate: i64,
    /// Output sample rate in Hz (0 for video).
    pub sample_rate: u32,
    /// Output channel count (0 for video).
    pub channels: u16,
}

/// Container-level metadata gathered without starting a decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub duration_ms: i64,
    pub width: u32,
    pub height: u32,
    pub rotation: i32,
    pub bit_rate: i64,
    pub has_audio: bool,
    pub has_video: bool,
}

impl MediaInfo {
    /// Returns true if the container carries a stream of `kind`.
    pub fn has(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.has_audio,
            MediaKind::Video => self.has_video,
        }
    }
}
