// SPDX-License-Identifier: MPL-2.0
//! Renderer ports.
//!
//! The decoders never draw or play anything themselves. They hand frames to
//! these traits, which the hosting platform implements (OpenGL ES for video,
//! OpenSL ES for audio on Android). Implementations are shared between the
//! player facade and the decode thread, so every method takes `&self`.

use crate::media::VideoFrame;

/// Consumer of decoded pictures.
pub trait VideoRender: Send + Sync {
    /// Called once the video stream is open, with the decoded picture size.
    fn init(&self, width: u32, height: u32);

    /// Called on the decode thread for every decoded picture.
    ///
    /// Must return promptly; blocking here stalls playback pacing.
    fn on_frame_available(&self, frame: &VideoFrame);

    /// Called when the video decoder has finished.
    fn uninit(&self);
}

/// Consumer of decoded PCM.
pub trait AudioRender: Send + Sync {
    fn init(&self);

    /// Called on the decode thread with interleaved S16 PCM bytes.
    fn render_audio_frame(&self, data: &[u8]);

    /// Drops queued audio, used after a seek.
    fn clear_audio_cache(&self);

    fn uninit(&self);
}
