// SPDX-License-Identifier: MPL-2.0
//! Decoded frames as handed from a backend session to the renderers.

/// Pixel layout of a decoded video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single packed plane, 4 bytes per pixel.
    Rgba,
}

/// One image plane with its row stride in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub stride: usize,
}

/// A decoded picture.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub planes: Vec<Plane>,
}

impl VideoFrame {
    /// Returns the total size of all planes in bytes.
    pub fn size_bytes(&self) -> usize {
        self.planes.iter().map(|plane| plane.data.len()).sum()
    }
}

/// Interleaved signed 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFrame {
    /// Returns the number of samples per channel.
    pub fn sample_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / (2 * self.channels as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Video(VideoFrame),
    Audio(AudioFrame),
}

/// A frame leaving the decoder, with its raw stream timestamps.
///
/// `timestamp_ms` is filled in by the playback clock before the frame is
/// delivered to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Decode timestamp of the packet that produced the frame, in stream ticks.
    pub pkt_dts: Option<i64>,
    /// Presentation timestamp, in stream ticks.
    pub pts: Option<i64>,
    /// Presentation time in milliseconds, as seen by the clock.
    pub timestamp_ms: i64,
    pub payload: FramePayload,
}

impl DecodedFrame {
    pub fn new(pkt_dts: Option<i64>, pts: Option<i64>, payload: FramePayload) -> Self {
        Self {
            pkt_dts,
            pts,
            timestamp_ms: 0,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_frame_sums_plane_sizes() {
        let frame = VideoFrame {
            width: 4,
            height: 2,
            format: PixelFormat::Rgba,
            planes: vec![Plane {
                data: vec![0; 4 * 2 * 4],
                stride: 16,
            }],
        };
        assert_eq!(frame.size_bytes(), 32);
    }

    #[test]
    fn audio_frame_counts_samples_per_channel() {
        let frame = AudioFrame {
            data: vec![0; 4 * 1024],
            sample_rate: 44_100,
            channels: 2,
        };
        assert_eq!(frame.sample_count(), 1024);
    }

    #[test]
    fn audio_frame_without_channels_has_no_samples() {
        let frame = AudioFrame {
            data: vec![0; 16],
            sample_rate: 44_100,
            channels: 0,
        };
        assert_eq!(frame.sample_count(), 0);
    }
}
