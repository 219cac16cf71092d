// SPDX-License-Identifier: MPL-2.0
//! Player facade: one optional audio and one optional video decoder fed from
//! the same source, driven together.
//!
//! The container is probed once at construction, so duration and picture
//! size can be queried before playback starts. Tracks the probe reports as
//! absent get no decoder. If the probe itself fails both decoders are still
//! created; each then reports its own init error when started.

use crate::application::port::{AudioRender, MediaBackend, VideoRender};
use crate::config::PlayerConfig;
use crate::decoder::{
    AudioDecoder, AudioFrameHandler, DecoderEngine, DecoderState, MessageSink, VideoDecoder,
    VideoFrameHandler,
};
use crate::media::{MediaInfo, MediaKind};
use log::{info, warn};
use std::sync::Arc;

/// Video output path requested by the host. Every mode receives the same
/// frames through the injected [`VideoRender`]; the mode is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    OpenGl,
    ANativeWindow,
    Vr3d,
}

impl RenderMode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::OpenGl),
            1 => Some(Self::ANativeWindow),
            2 => Some(Self::Vr3d),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::OpenGl => 0,
            Self::ANativeWindow => 1,
            Self::Vr3d => 2,
        }
    }
}

/// Parameters readable through [`MediaPlayer::get_media_params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaParam {
    VideoWidth,
    VideoHeight,
    /// Milliseconds.
    Duration,
    /// Degrees.
    Rotation,
    /// Bits per second.
    BitRate,
    /// Milliseconds.
    Position,
}

impl MediaParam {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::VideoWidth),
            2 => Some(Self::VideoHeight),
            3 => Some(Self::Duration),
            4 => Some(Self::Rotation),
            5 => Some(Self::BitRate),
            6 => Some(Self::Position),
            _ => None,
        }
    }
}

/// Frame consumers handed to the decoders.
#[derive(Clone)]
pub struct Renderers {
    pub video: Arc<dyn VideoRender>,
    pub audio: Arc<dyn AudioRender>,
}

impl Renderers {
    pub fn new(video: Arc<dyn VideoRender>, audio: Arc<dyn AudioRender>) -> Self {
        Self { video, audio }
    }
}

/// Transport surface of a player, independent of its backend type.
pub trait PlayerControl: Send {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek_to_position(&mut self, position_secs: f32);
    fn get_media_params(&self, param: MediaParam) -> i64;
    /// Stops both decoders and waits for their threads to finish.
    fn teardown(&mut self);
}

pub struct MediaPlayer<B: MediaBackend> {
    locator: String,
    render_mode: RenderMode,
    info: Option<MediaInfo>,
    video: Option<VideoDecoder<B>>,
    audio: Option<AudioDecoder<B>>,
    renderers: Renderers,
}

impl<B: MediaBackend> MediaPlayer<B> {
    pub fn new(
        backend: B,
        locator: impl Into<String>,
        render_mode: RenderMode,
        renderers: Renderers,
        config: &PlayerConfig,
        messages: MessageSink,
    ) -> Self {
        let locator = locator.into();
        let info = match backend.probe(&locator) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("probing {} failed: {}", locator, e);
                None
            }
        };
        let wants = |kind| info.as_ref().map_or(true, |info| info.has(kind));

        let video = wants(MediaKind::Video).then(|| {
            DecoderEngine::new(
                backend.clone(),
                locator.clone(),
                MediaKind::Video,
                VideoFrameHandler::new(Arc::clone(&renderers.video)),
                config,
                messages.clone(),
            )
        });
        let audio = wants(MediaKind::Audio).then(|| {
            DecoderEngine::new(
                backend.clone(),
                locator.clone(),
                MediaKind::Audio,
                AudioFrameHandler::new(Arc::clone(&renderers.audio)),
                config,
                messages.clone(),
            )
        });

        info!(
            "player created for {} (video: {}, audio: {}, render mode {:?})",
            locator,
            video.is_some(),
            audio.is_some(),
            render_mode
        );
        Self {
            locator,
            render_mode,
            info,
            video,
            audio,
            renderers,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Container metadata, if the probe succeeded.
    pub fn media_info(&self) -> Option<&MediaInfo> {
        self.info.as_ref()
    }

    pub fn renderers(&self) -> &Renderers {
        &self.renderers
    }

    pub fn has_track(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio.is_some(),
            MediaKind::Video => self.video.is_some(),
        }
    }

    pub fn decoder_state(&self, kind: MediaKind) -> Option<DecoderState> {
        match kind {
            MediaKind::Audio => self.audio.as_ref().map(DecoderEngine::state),
            MediaKind::Video => self.video.as_ref().map(DecoderEngine::state),
        }
    }

    /// Position of the audio track when there is one, else of the video.
    pub fn current_position_ms(&self) -> i64 {
        match (&self.audio, &self.video) {
            (Some(audio), _) => audio.current_position_ms(),
            (None, Some(video)) => video.current_position_ms(),
            (None, None) => 0,
        }
    }

    /// Duration in milliseconds: the opened video stream's, else the audio
    /// stream's, else the probed container's.
    pub fn duration_ms(&self) -> i64 {
        let opened = [
            self.video.as_ref().map(DecoderEngine::duration_ms),
            self.audio.as_ref().map(DecoderEngine::duration_ms),
        ];
        opened
            .into_iter()
            .flatten()
            .find(|&duration| duration > 0)
            .or_else(|| self.info.as_ref().map(|info| info.duration_ms))
            .unwrap_or(0)
    }

    fn video_dimension(&self, pick: fn(u32, u32) -> u32) -> i64 {
        let opened = self
            .video
            .as_ref()
            .and_then(DecoderEngine::stream_info)
            .map(|stream| pick(stream.width, stream.height));
        let probed = self.info.as_ref().map(|info| pick(info.width, info.height));
        i64::from(opened.or(probed).unwrap_or(0))
    }
}

impl<B: MediaBackend> PlayerControl for MediaPlayer<B> {
    fn play(&mut self) {
        if let Some(video) = self.video.as_mut() {
            video.start();
        }
        if let Some(audio) = self.audio.as_mut() {
            audio.start();
        }
    }

    fn pause(&mut self) {
        if let Some(video) = &self.video {
            video.pause();
        }
        if let Some(audio) = &self.audio {
            audio.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(video) = &self.video {
            video.stop();
        }
        if let Some(audio) = &self.audio {
            audio.stop();
        }
    }

    fn seek_to_position(&mut self, position_secs: f32) {
        if let Some(video) = &self.video {
            video.seek_to_position(position_secs);
        }
        if let Some(audio) = &self.audio {
            audio.seek_to_position(position_secs);
        }
    }

    fn get_media_params(&self, param: MediaParam) -> i64 {
        match param {
            MediaParam::VideoWidth => self.video_dimension(|width, _| width),
            MediaParam::VideoHeight => self.video_dimension(|_, height| height),
            MediaParam::Duration => self.duration_ms(),
            MediaParam::Rotation => self
                .video
                .as_ref()
                .and_then(DecoderEngine::stream_info)
                .map(|stream| stream.rotation)
                .or_else(|| self.info.as_ref().map(|info| info.rotation))
                .map_or(0, i64::from),
            MediaParam::BitRate => self.info.as_ref().map_or(0, |info| info.bit_rate),
            MediaParam::Position => self.current_position_ms(),
        }
    }

    fn teardown(&mut self) {
        if let Some(video) = self.video.as_mut() {
            video.teardown();
        }
        if let Some(audio) = self.audio.as_mut() {
            audio.teardown();
        }
        info!("player for {} torn down", self.locator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::synthetic::{SyntheticBackend, SyntheticMedia};
    use crate::render::{Overflow, QueuedAudioRender, SurfaceVideoRender};

    fn renderers() -> Renderers {
        Renderers::new(
            Arc::new(SurfaceVideoRender::new()),
            Arc::new(QueuedAudioRender::new(3, Overflow::DropOldest)),
        )
    }

    fn player(media: SyntheticMedia) -> MediaPlayer<SyntheticBackend> {
        MediaPlayer::new(
            SyntheticBackend::new().with_source("clip", media),
            "clip",
            RenderMode::OpenGl,
            renderers(),
            &PlayerConfig::default(),
            MessageSink::none(),
        )
    }

    #[test]
    fn render_mode_codes_round_trip() {
        for mode in [RenderMode::OpenGl, RenderMode::ANativeWindow, RenderMode::Vr3d] {
            assert_eq!(RenderMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(RenderMode::from_code(7), None);
    }

    #[test]
    fn media_param_codes() {
        assert_eq!(MediaParam::from_code(1), Some(MediaParam::VideoWidth));
        assert_eq!(MediaParam::from_code(3), Some(MediaParam::Duration));
        assert_eq!(MediaParam::from_code(6), Some(MediaParam::Position));
        assert_eq!(MediaParam::from_code(0), None);
        assert_eq!(MediaParam::from_code(99), None);
    }

    #[test]
    fn params_are_available_before_play() {
        let player = player(
            SyntheticMedia::new(10_000)
                .with_video(1280, 720, 25)
                .with_rotation(90)
                .with_bit_rate(1_500_000),
        );
        assert_eq!(player.get_media_params(MediaParam::VideoWidth), 1280);
        assert_eq!(player.get_media_params(MediaParam::VideoHeight), 720);
        assert_eq!(player.get_media_params(MediaParam::Duration), 10_000);
        assert_eq!(player.get_media_params(MediaParam::Rotation), 90);
        assert_eq!(player.get_media_params(MediaParam::BitRate), 1_500_000);
        assert_eq!(player.get_media_params(MediaParam::Position), 0);
    }

    #[test]
    fn absent_tracks_get_no_decoder() {
        let player = player(SyntheticMedia::new(1000).with_audio(44_100, 2));
        assert!(player.has_track(MediaKind::Audio));
        assert!(!player.has_track(MediaKind::Video));
        assert_eq!(player.decoder_state(MediaKind::Video), None);
        assert_eq!(player.get_media_params(MediaParam::VideoWidth), 0);
    }

    #[test]
    fn failed_probe_keeps_both_decoders() {
        let player = MediaPlayer::new(
            SyntheticBackend::new(),
            "missing",
            RenderMode::Vr3d,
            renderers(),
            &PlayerConfig::default(),
            MessageSink::none(),
        );
        assert!(player.media_info().is_none());
        assert!(player.has_track(MediaKind::Audio));
        assert!(player.has_track(MediaKind::Video));
        assert_eq!(player.get_media_params(MediaParam::Duration), 0);
        assert_eq!(player.render_mode(), RenderMode::Vr3d);
    }

    #[test]
    fn teardown_without_play_stops_both() {
        let mut player = player(
            SyntheticMedia::new(1000)
                .with_video(16, 16, 25)
                .with_audio(44_100, 2),
        );
        player.teardown();
        assert_eq!(
            player.decoder_state(MediaKind::Video),
            Some(DecoderState::Stopped)
        );
        assert_eq!(
            player.decoder_state(MediaKind::Audio),
            Some(DecoderState::Stopped)
        );
    }
}
