// SPDX-License-Identifier: MPL-2.0
//! `FFmpeg` adapter implementing the [`MediaBackend`] port.
//!
//! Each [`FfmpegSession`] owns a format context and one opened codec for the
//! first stream of the requested kind. Video frames are converted to RGBA,
//! audio is resampled to packed S16 stereo at 44.1 kHz.
//!
//! # Design Notes
//!
//! - Sessions are created and dropped on the decode thread; nothing here is
//!   shared between threads, so the non-`Send` `FFmpeg` wrappers are fine.
//! - The demuxer/codec robustness options travel as an `FFmpeg` dictionary.
//! - Field order of the session encodes the release order: frames and
//!   converters, then the codec context, then the format context.

use crate::application::port::{MediaBackend, MediaSession, StreamPacket};
use crate::config::DecoderOptions;
use crate::decoder::time_units::micros_to_millis;
use crate::error::DecoderError;
use crate::media::{
    AudioFrame, DecodedFrame, FramePayload, MediaInfo, MediaKind, PixelFormat, Plane, StreamInfo,
    TimeBase, VideoFrame,
};
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::{self, Pixel, Sample};
use ffmpeg_next::software::{resampling, scaling};
use ffmpeg_next::{codec, decoder, frame, media, ChannelLayout, Dictionary, Packet};
use log::{debug, warn};
use std::sync::Once;

/// Output sample rate of the audio path.
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;

/// Output channel count of the audio path.
pub const OUTPUT_CHANNELS: u16 = 2;

/// Bytes per S16 sample.
const BYTES_PER_SAMPLE: usize = 2;

static FFMPEG_INIT: Once = Once::new();

/// Initializes `FFmpeg` once per process and silences its own logging below
/// error level.
fn init_ffmpeg() -> Result<(), DecoderError> {
    let mut init_result = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(DecoderError::OpenInput(format!(
                "FFmpeg initialization failed: {e}"
            )));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

fn media_type(kind: MediaKind) -> media::Type {
    match kind {
        MediaKind::Audio => media::Type::Audio,
        MediaKind::Video => media::Type::Video,
    }
}

fn dictionary(options: &DecoderOptions) -> Dictionary<'static> {
    let mut dictionary = Dictionary::new();
    for (key, value) in options.to_pairs() {
        dictionary.set(key, &value);
    }
    dictionary
}

fn open_input(locator: &str, options: &DecoderOptions) -> Result<Input, DecoderError> {
    init_ffmpeg()?;
    format::input_with_dictionary(locator, dictionary(options))
        .map_err(|e| DecoderError::OpenInput(format!("{locator}: {e}")))
}

fn container_duration_ms(input: &Input) -> i64 {
    let duration = input.duration();
    if duration > 0 {
        micros_to_millis(duration)
    } else {
        0
    }
}

/// Display rotation from the legacy `rotate` stream tag.
fn rotation_of(stream: &format::stream::Stream<'_>) -> i32 {
    stream
        .metadata()
        .get("rotate")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Decode timestamp of the packet a frame came from.
fn packet_dts(frame: &frame::Frame) -> Option<i64> {
    // SAFETY: the frame is alive for the duration of the borrow and pkt_dts
    // is a plain integer field.
    let dts = unsafe { (*frame.as_ptr()).pkt_dts };
    (dts != ffmpeg_next::ffi::AV_NOPTS_VALUE).then_some(dts)
}

/// [`MediaBackend`] over the system `FFmpeg` libraries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    probe_options: DecoderOptions,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `options` when probing, so probing a network source honours the
    /// same timeouts as playback.
    #[must_use]
    pub fn with_options(options: DecoderOptions) -> Self {
        Self {
            probe_options: options,
        }
    }
}

impl MediaBackend for FfmpegBackend {
    type Session = FfmpegSession;

    fn probe(&self, locator: &str) -> Result<MediaInfo, DecoderError> {
        let input = open_input(locator, &self.probe_options)?;
        let mut info = MediaInfo {
            duration_ms: container_duration_ms(&input),
            bit_rate: input.bit_rate(),
            ..MediaInfo::default()
        };

        for stream in input.streams() {
            match stream.parameters().medium() {
                media::Type::Audio => info.has_audio = true,
                media::Type::Video if !info.has_video => {
                    info.has_video = true;
                    info.rotation = rotation_of(&stream);
                    if let Ok(video) = codec::context::Context::from_parameters(stream.parameters())
                        .and_then(|context| context.decoder().video())
                    {
                        info.width = video.width();
                        info.height = video.height();
                    }
                }
                _ => {}
            }
        }
        Ok(info)
    }

    fn open(
        &self,
        locator: &str,
        kind: MediaKind,
        options: &DecoderOptions,
    ) -> Result<FfmpegSession, DecoderError> {
        let input = open_input(locator, options)?;
        let duration_ms = container_duration_ms(&input);
        let bit_rate = input.bit_rate();

        let (index, time_base, rotation, opened) = {
            let stream = input
                .streams()
                .find(|stream| stream.parameters().medium() == media_type(kind))
                .ok_or(DecoderError::NoStream(kind))?;

            let codec_id = stream.parameters().id();
            let codec = decoder::find(codec_id)
                .ok_or_else(|| DecoderError::CodecNotFound(format!("{codec_id:?}")))?;
            let context = codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| DecoderError::StreamInfo(e.to_string()))?;
            let opened = context
                .decoder()
                .open_as_with(codec, dictionary(options))
                .map_err(|e| DecoderError::CodecOpen(e.to_string()))?;

            let tb = stream.time_base();
            (
                stream.index(),
                TimeBase::new(tb.numerator(), tb.denominator()),
                rotation_of(&stream),
                opened,
            )
        };

        let mut info = StreamInfo {
            kind,
            index,
            time_base,
            duration_ms,
            width: 0,
            height: 0,
            rotation: 0,
            bit_rate,
            sample_rate: 0,
            channels: 0,
        };

        let codec = match kind {
            MediaKind::Video => {
                let decoder = opened
                    .video()
                    .map_err(|e| DecoderError::CodecOpen(e.to_string()))?;
                info.width = decoder.width();
                info.height = decoder.height();
                info.rotation = rotation;
                Codec::Video(VideoCodec {
                    frame: frame::Video::empty(),
                    scaler: None,
                    decoder,
                })
            }
            MediaKind::Audio => {
                let decoder = opened
                    .audio()
                    .map_err(|e| DecoderError::CodecOpen(e.to_string()))?;
                let resampler = resampling::Context::get(
                    decoder.format(),
                    decoder.channel_layout(),
                    decoder.rate(),
                    Sample::I16(format::sample::Type::Packed),
                    ChannelLayout::STEREO,
                    OUTPUT_SAMPLE_RATE,
                )
                .map_err(|e| DecoderError::CodecOpen(format!("resampler: {e}")))?;
                info.sample_rate = OUTPUT_SAMPLE_RATE;
                info.channels = OUTPUT_CHANNELS;
                Codec::Audio(AudioCodec {
                    frame: frame::Audio::empty(),
                    resampler,
                    decoder,
                })
            }
        };

        debug!("opened {} stream #{} of {}", kind, index, locator);
        Ok(FfmpegSession {
            codec,
            input,
            stream: info,
        })
    }
}

/// A demuxed packet.
pub struct FfmpegPacket(Packet);

impl StreamPacket for FfmpegPacket {
    fn stream_index(&self) -> usize {
        self.0.stream()
    }
}

struct VideoCodec {
    frame: frame::Video,
    scaler: Option<scaling::Context>,
    decoder: decoder::Video,
}

impl VideoCodec {
    /// Converts the current frame to a tightly packed RGBA picture.
    fn to_rgba(&mut self) -> Result<VideoFrame, ffmpeg_next::Error> {
        let (format, width, height) = (self.frame.format(), self.frame.width(), self.frame.height());
        let stale = self.scaler.as_ref().map_or(true, |scaler| {
            let input = scaler.input();
            input.format != format || input.width != width || input.height != height
        });
        if stale {
            self.scaler = Some(scaling::Context::get(
                format,
                width,
                height,
                Pixel::RGBA,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?);
        }
        let Some(scaler) = self.scaler.as_mut() else {
            return Err(ffmpeg_next::Error::Bug);
        };

        let mut rgba = frame::Video::empty();
        scaler.run(&self.frame, &mut rgba)?;
        let row_bytes = width as usize * 4;
        Ok(VideoFrame {
            width,
            height,
            format: PixelFormat::Rgba,
            planes: vec![Plane {
                data: extract_rows(&rgba, row_bytes),
                stride: row_bytes,
            }],
        })
    }
}

/// Copies the visible part of each row of plane 0, dropping stride padding.
fn extract_rows(frame: &frame::Video, row_bytes: usize) -> Vec<u8> {
    let data = frame.data(0);
    let stride = frame.stride(0);
    let height = frame.height() as usize;

    let mut bytes = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let row_start = y * stride;
        bytes.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    bytes
}

struct AudioCodec {
    frame: frame::Audio,
    resampler: resampling::Context,
    decoder: decoder::Audio,
}

impl AudioCodec {
    fn to_s16(&mut self) -> Result<AudioFrame, ffmpeg_next::Error> {
        let mut output = frame::Audio::empty();
        self.resampler.run(&self.frame, &mut output)?;

        let data = output.data(0);
        let len = (output.samples() * usize::from(OUTPUT_CHANNELS) * BYTES_PER_SAMPLE).min(data.len());
        Ok(AudioFrame {
            data: data[..len].to_vec(),
            sample_rate: OUTPUT_SAMPLE_RATE,
            channels: OUTPUT_CHANNELS,
        })
    }
}

enum Codec {
    Video(VideoCodec),
    Audio(AudioCodec),
}

/// Open `FFmpeg` demux/decode session for one stream.
pub struct FfmpegSession {
    codec: Codec,
    input: Input,
    stream: StreamInfo,
}

fn map_codec_error(e: ffmpeg_next::Error) -> DecoderError {
    match e {
        ffmpeg_next::Error::Eof => DecoderError::EndOfStream,
        other => DecoderError::Decode(other.to_string()),
    }
}

impl MediaSession for FfmpegSession {
    type Packet = FfmpegPacket;

    fn stream_info(&self) -> &StreamInfo {
        &self.stream
    }

    fn read_packet(&mut self) -> Result<FfmpegPacket, DecoderError> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(FfmpegPacket(packet)),
            Err(ffmpeg_next::Error::Eof) => Err(DecoderError::EndOfStream),
            Err(e) => Err(DecoderError::Read(e.to_string())),
        }
    }

    fn send_packet(&mut self, packet: &FfmpegPacket) -> Result<(), DecoderError> {
        match &mut self.codec {
            Codec::Video(codec) => codec.decoder.send_packet(&packet.0),
            Codec::Audio(codec) => codec.decoder.send_packet(&packet.0),
        }
        .map_err(map_codec_error)
    }

    fn receive_frame(&mut self) -> Option<DecodedFrame> {
        loop {
            match &mut self.codec {
                Codec::Video(codec) => {
                    codec.decoder.receive_frame(&mut codec.frame).ok()?;
                    let (pkt_dts, pts) = (packet_dts(&codec.frame), codec.frame.pts());
                    match codec.to_rgba() {
                        Ok(picture) => {
                            return Some(DecodedFrame::new(
                                pkt_dts,
                                pts,
                                FramePayload::Video(picture),
                            ))
                        }
                        Err(e) => warn!("dropping video frame, conversion failed: {e}"),
                    }
                }
                Codec::Audio(codec) => {
                    codec.decoder.receive_frame(&mut codec.frame).ok()?;
                    let (pkt_dts, pts) = (packet_dts(&codec.frame), codec.frame.pts());
                    match codec.to_s16() {
                        Ok(pcm) => {
                            return Some(DecodedFrame::new(pkt_dts, pts, FramePayload::Audio(pcm)))
                        }
                        Err(e) => warn!("dropping audio frame, resampling failed: {e}"),
                    }
                }
            }
        }
    }

    fn seek(&mut self, target_us: i64) -> Result<(), DecoderError> {
        self.input
            .seek(target_us, ..)
            .map_err(|e| DecoderError::Seek(e.to_string()))
    }

    fn flush(&mut self) {
        match &mut self.codec {
            Codec::Video(codec) => codec.decoder.flush(),
            Codec::Audio(codec) => codec.decoder.flush(),
        }
    }
}
