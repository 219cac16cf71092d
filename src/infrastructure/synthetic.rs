// SPDX-License-Identifier: MPL-2.0
//! Deterministic test-pattern backend.
//!
//! [`SyntheticBackend`] serves generated media from an in-memory catalogue of
//! named sources. Packets of all tracks are interleaved in timestamp order,
//! video frames are flat grey RGBA pictures whose level follows the frame
//! number, and audio frames carry 20 ms of S16 PCM. It needs no codec
//! library, which makes the whole decode path testable without media files.
//!
//! # Examples
//!
//! ```
//! use ffmedia_player::application::port::MediaBackend;
//! use ffmedia_player::infrastructure::synthetic::{SyntheticBackend, SyntheticMedia};
//!
//! let backend = SyntheticBackend::new().with_source(
//!     "pattern",
//!     SyntheticMedia::new(10_000).with_video(320, 240, 25).with_audio(44_100, 2),
//! );
//! let info = backend.probe("pattern").unwrap();
//! assert_eq!(info.duration_ms, 10_000);
//! assert!(info.has_audio && info.has_video);
//! ```

use crate::application::port::{MediaBackend, MediaSession, StreamPacket};
use crate::config::DecoderOptions;
use crate::error::DecoderError;
use crate::media::{
    AudioFrame, DecodedFrame, FramePayload, MediaInfo, MediaKind, PixelFormat, Plane, StreamInfo,
    TimeBase, VideoFrame,
};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Video clock rate used by the generated video track.
const VIDEO_CLOCK_HZ: i32 = 90_000;

/// Duration of one generated audio frame.
const AUDIO_FRAME_MS: i64 = 20;

const DEFAULT_KEYFRAME_INTERVAL_MS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
struct VideoTrack {
    width: u32,
    height: u32,
    frame_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AudioTrack {
    sample_rate: u32,
    channels: u16,
}

/// Description of one generated source.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticMedia {
    duration_ms: i64,
    video: Option<VideoTrack>,
    audio: Option<AudioTrack>,
    rotation: i32,
    bit_rate: i64,
    frame_delay: usize,
    keyframe_interval_ms: i64,
    fail_seek: bool,
    broken_codec: Option<MediaKind>,
    /// `(from_ms, jump_ms)`: stamps at or after `from_ms` are pushed `jump_ms` ahead.
    timestamp_jump: Option<(i64, i64)>,
}

impl SyntheticMedia {
    /// A source of `duration_ms` with no tracks yet.
    pub fn new(duration_ms: i64) -> Self {
        Self {
            duration_ms: duration_ms.max(0),
            video: None,
            audio: None,
            rotation: 0,
            bit_rate: 0,
            frame_delay: 0,
            keyframe_interval_ms: DEFAULT_KEYFRAME_INTERVAL_MS,
            fail_seek: false,
            broken_codec: None,
            timestamp_jump: None,
        }
    }

    #[must_use]
    pub fn with_video(mut self, width: u32, height: u32, frame_rate: u32) -> Self {
        self.video = Some(VideoTrack {
            width,
            height,
            frame_rate: frame_rate.max(1),
        });
        self
    }

    #[must_use]
    pub fn with_audio(mut self, sample_rate: u32, channels: u16) -> Self {
        self.audio = Some(AudioTrack {
            sample_rate: sample_rate.max(50),
            channels: channels.max(1),
        });
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees;
        self
    }

    #[must_use]
    pub fn with_bit_rate(mut self, bits_per_second: i64) -> Self {
        self.bit_rate = bits_per_second;
        self
    }

    /// Holds back `frames` decoded pictures inside the codec, the way a
    /// stream with B-frames does: the first packets produce no output.
    #[must_use]
    pub fn with_frame_delay(mut self, frames: usize) -> Self {
        self.frame_delay = frames;
        self
    }

    /// Spacing of the positions a seek can land on when the source has video.
    #[must_use]
    pub fn with_keyframe_interval(mut self, interval_ms: i64) -> Self {
        self.keyframe_interval_ms = interval_ms.max(1);
        self
    }

    /// Makes every seek fail.
    #[must_use]
    pub fn with_failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    /// Makes opening a decoder for `kind` fail.
    #[must_use]
    pub fn with_broken_codec(mut self, kind: MediaKind) -> Self {
        self.broken_codec = Some(kind);
        self
    }

    /// Shifts every timestamp from `from_ms` on by `jump_ms`, the way a
    /// broken mux or a stream splice does. Packet order is unchanged.
    #[must_use]
    pub fn with_timestamp_jump(mut self, from_ms: i64, jump_ms: i64) -> Self {
        self.timestamp_jump = Some((from_ms, jump_ms));
        self
    }

    fn jump_at(&self, ts_ms: i64) -> i64 {
        match self.timestamp_jump {
            Some((from_ms, jump_ms)) if ts_ms >= from_ms => jump_ms,
            _ => 0,
        }
    }

    fn has(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio.is_some(),
            MediaKind::Video => self.video.is_some(),
        }
    }

    fn stream_index(&self, kind: MediaKind) -> Option<usize> {
        match kind {
            MediaKind::Video => self.video.map(|_| 0),
            MediaKind::Audio => self.audio.map(|_| usize::from(self.video.is_some())),
        }
    }

    fn stream_info(&self, kind: MediaKind) -> Option<StreamInfo> {
        let index = self.stream_index(kind)?;
        let mut info = StreamInfo {
            kind,
            index,
            time_base: TimeBase::new(1, VIDEO_CLOCK_HZ),
            duration_ms: self.duration_ms,
            width: 0,
            height: 0,
            rotation: 0,
            bit_rate: self.bit_rate,
            sample_rate: 0,
            channels: 0,
        };
        match kind {
            MediaKind::Video => {
                let video = self.video?;
                info.width = video.width;
                info.height = video.height;
                info.rotation = self.rotation;
            }
            MediaKind::Audio => {
                let audio = self.audio?;
                info.time_base = TimeBase::new(1, i32::try_from(audio.sample_rate).ok()?);
                info.sample_rate = audio.sample_rate;
                info.channels = audio.channels;
            }
        }
        Some(info)
    }

    /// Builds the interleaved packet list of the container.
    fn packets(&self) -> Vec<SyntheticPacket> {
        let mut packets = Vec::new();

        if let (Some(video), Some(index)) = (self.video, self.stream_index(MediaKind::Video)) {
            let interval_ms = (1000 / i64::from(video.frame_rate)).max(1);
            let mut ts_ms = 0;
            while ts_ms < self.duration_ms {
                packets.push(SyntheticPacket {
                    stream_index: index,
                    kind: MediaKind::Video,
                    ts_ms,
                    ticks: (ts_ms + self.jump_at(ts_ms)) * i64::from(VIDEO_CLOCK_HZ) / 1000,
                    sequence: packets.len(),
                });
                ts_ms += interval_ms;
            }
        }

        if let (Some(audio), Some(index)) = (self.audio, self.stream_index(MediaKind::Audio)) {
            let samples_per_frame = i64::from(audio.sample_rate) * AUDIO_FRAME_MS / 1000;
            let mut frame = 0;
            while frame * AUDIO_FRAME_MS < self.duration_ms {
                let ts_ms = frame * AUDIO_FRAME_MS;
                packets.push(SyntheticPacket {
                    stream_index: index,
                    kind: MediaKind::Audio,
                    ts_ms,
                    ticks: frame * samples_per_frame
                        + self.jump_at(ts_ms) * i64::from(audio.sample_rate) / 1000,
                    sequence: packets.len(),
                });
                frame += 1;
            }
        }

        packets.sort_by_key(|packet| (packet.ts_ms, packet.stream_index));
        packets
    }

    fn media_info(&self) -> MediaInfo {
        let (width, height) = self
            .video
            .map_or((0, 0), |video| (video.width, video.height));
        MediaInfo {
            duration_ms: self.duration_ms,
            width,
            height,
            rotation: self.rotation,
            bit_rate: self.bit_rate,
            has_audio: self.audio.is_some(),
            has_video: self.video.is_some(),
        }
    }
}

/// Catalogue of generated sources, addressed by locator.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    sources: Arc<HashMap<String, SyntheticMedia>>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `media` under `locator`, replacing any previous entry.
    #[must_use]
    pub fn with_source(mut self, locator: impl Into<String>, media: SyntheticMedia) -> Self {
        Arc::make_mut(&mut self.sources).insert(locator.into(), media);
        self
    }

    fn lookup(&self, locator: &str) -> Result<&SyntheticMedia, DecoderError> {
        self.sources
            .get(locator)
            .ok_or_else(|| DecoderError::OpenInput(format!("no such source: {}", locator)))
    }
}

impl MediaBackend for SyntheticBackend {
    type Session = SyntheticSession;

    fn probe(&self, locator: &str) -> Result<MediaInfo, DecoderError> {
        self.lookup(locator).map(SyntheticMedia::media_info)
    }

    fn open(
        &self,
        locator: &str,
        kind: MediaKind,
        options: &DecoderOptions,
    ) -> Result<SyntheticSession, DecoderError> {
        let media = self.lookup(locator)?;
        if !media.has(kind) {
            return Err(DecoderError::NoStream(kind));
        }
        if media.broken_codec == Some(kind) {
            return Err(DecoderError::CodecOpen(format!("{} codec refused to open", kind)));
        }
        let stream = media
            .stream_info(kind)
            .ok_or(DecoderError::NoStream(kind))?;

        debug!(
            "synthetic {} session on {} ({} options)",
            kind,
            locator,
            options.to_pairs().len()
        );
        Ok(SyntheticSession {
            packets: media.packets(),
            media: media.clone(),
            stream,
            cursor: 0,
            held: VecDeque::new(),
            ready: VecDeque::new(),
        })
    }
}

/// A generated compressed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticPacket {
    stream_index: usize,
    kind: MediaKind,
    ts_ms: i64,
    ticks: i64,
    sequence: usize,
}

impl StreamPacket for SyntheticPacket {
    fn stream_index(&self) -> usize {
        self.stream_index
    }
}

/// Session over one generated track.
#[derive(Debug)]
pub struct SyntheticSession {
    media: SyntheticMedia,
    stream: StreamInfo,
    packets: Vec<SyntheticPacket>,
    cursor: usize,
    /// Pictures buffered inside the "codec".
    held: VecDeque<DecodedFrame>,
    ready: VecDeque<DecodedFrame>,
}

impl SyntheticSession {
    fn decode(&self, packet: &SyntheticPacket) -> DecodedFrame {
        match packet.kind {
            MediaKind::Video => {
                let width = self.stream.width;
                let height = self.stream.height;
                #[allow(clippy::cast_possible_truncation)]
                let level = (packet.sequence % 256) as u8;
                let picture = VideoFrame {
                    width,
                    height,
                    format: PixelFormat::Rgba,
                    planes: vec![Plane {
                        data: vec![level; width as usize * height as usize * 4],
                        stride: width as usize * 4,
                    }],
                };
                DecodedFrame::new(
                    Some(packet.ticks),
                    Some(packet.ticks),
                    FramePayload::Video(picture),
                )
            }
            MediaKind::Audio => {
                let sample_rate = self.stream.sample_rate;
                let channels = self.stream.channels;
                let samples = sample_rate as usize * AUDIO_FRAME_MS as usize / 1000;
                let pcm = AudioFrame {
                    data: vec![0; samples * channels as usize * 2],
                    sample_rate,
                    channels,
                };
                DecodedFrame::new(None, Some(packet.ticks), FramePayload::Audio(pcm))
            }
        }
    }
}

impl MediaSession for SyntheticSession {
    type Packet = SyntheticPacket;

    fn stream_info(&self) -> &StreamInfo {
        &self.stream
    }

    fn read_packet(&mut self) -> Result<SyntheticPacket, DecoderError> {
        let packet = self
            .packets
            .get(self.cursor)
            .cloned()
            .ok_or(DecoderError::EndOfStream)?;
        self.cursor += 1;
        Ok(packet)
    }

    fn send_packet(&mut self, packet: &SyntheticPacket) -> Result<(), DecoderError> {
        if packet.stream_index != self.stream.index {
            return Err(DecoderError::Decode(format!(
                "packet of stream #{} sent to stream #{}",
                packet.stream_index, self.stream.index
            )));
        }
        let frame = self.decode(packet);
        self.held.push_back(frame);
        while self.held.len() > self.media.frame_delay {
            if let Some(frame) = self.held.pop_front() {
                self.ready.push_back(frame);
            }
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> Option<DecodedFrame> {
        self.ready.pop_front()
    }

    fn seek(&mut self, target_us: i64) -> Result<(), DecoderError> {
        let target_ms = target_us / 1000;
        if self.media.fail_seek {
            return Err(DecoderError::Seek("source is not seekable".to_string()));
        }
        if target_ms < 0 || target_ms > self.media.duration_ms {
            return Err(DecoderError::Seek(format!(
                "target {}ms outside 0..={}ms",
                target_ms, self.media.duration_ms
            )));
        }

        let landing_ms = if self.media.video.is_some() {
            target_ms - target_ms % self.media.keyframe_interval_ms
        } else {
            target_ms
        };
        self.cursor = self
            .packets
            .iter()
            .position(|packet| packet.ts_ms >= landing_ms)
            .unwrap_or(self.packets.len());
        Ok(())
    }

    fn flush(&mut self) {
        self.held.clear();
        self.ready.clear();
    }
}
