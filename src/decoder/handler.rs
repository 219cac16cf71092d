// SPDX-License-Identifier: MPL-2.0
//! Per-track capabilities plugged into the generic decoder engine.
//!
//! The engine owns the thread, the state machine and the clock; what differs
//! between audio and video is only what happens when the stream becomes ready,
//! when a frame arrives and when decoding ends.

use super::message::{DecoderMessage, MessageSink};
use crate::application::port::{AudioRender, VideoRender};
use crate::media::{DecodedFrame, FramePayload, StreamInfo};
use log::{debug, warn};
use std::sync::Arc;

/// Track-specific behaviour of a decoder instance.
///
/// All methods run on the decode thread.
pub trait FrameHandler: Send + 'static {
    /// The stream is open; `stream` describes it.
    fn on_ready(&mut self, stream: &StreamInfo, messages: &MessageSink);

    /// A frame has been paced and is due now.
    fn on_frame_available(&mut self, frame: &DecodedFrame, messages: &MessageSink);

    /// The decode loop has exited and the session is closed.
    fn on_done(&mut self, messages: &MessageSink);

    /// Drops instance-local caches after a successful seek.
    fn clear_cache(&mut self) {}
}

/// Delivers pictures to a [`VideoRender`] and asks the host to redraw.
pub struct VideoFrameHandler {
    render: Arc<dyn VideoRender>,
}

impl VideoFrameHandler {
    pub fn new(render: Arc<dyn VideoRender>) -> Self {
        Self { render }
    }
}

impl FrameHandler for VideoFrameHandler {
    fn on_ready(&mut self, stream: &StreamInfo, messages: &MessageSink) {
        debug!(
            "video stream ready: {}x{} rotation={}",
            stream.width, stream.height, stream.rotation
        );
        self.render.init(stream.width, stream.height);
        messages.send(DecoderMessage::RenderRequest);
    }

    fn on_frame_available(&mut self, frame: &DecodedFrame, messages: &MessageSink) {
        match &frame.payload {
            FramePayload::Video(picture) => {
                self.render.on_frame_available(picture);
                messages.send(DecoderMessage::RenderRequest);
            }
            FramePayload::Audio(_) => warn!("video decoder produced an audio frame, dropped"),
        }
    }

    fn on_done(&mut self, _messages: &MessageSink) {
        self.render.uninit();
    }
}

/// Delivers PCM to an [`AudioRender`].
pub struct AudioFrameHandler {
    render: Arc<dyn AudioRender>,
}

impl AudioFrameHandler {
    pub fn new(render: Arc<dyn AudioRender>) -> Self {
        Self { render }
    }
}

impl FrameHandler for AudioFrameHandler {
    fn on_ready(&mut self, stream: &StreamInfo, _messages: &MessageSink) {
        debug!(
            "audio stream ready: {} Hz, {} channels",
            stream.sample_rate, stream.channels
        );
        self.render.init();
    }

    fn on_frame_available(&mut self, frame: &DecodedFrame, _messages: &MessageSink) {
        match &frame.payload {
            FramePayload::Audio(pcm) => self.render.render_audio_frame(&pcm.data),
            FramePayload::Video(_) => warn!("audio decoder produced a video frame, dropped"),
        }
    }

    fn on_done(&mut self, _messages: &MessageSink) {
        self.render.uninit();
    }

    fn clear_cache(&mut self) {
        self.render.clear_audio_cache();
    }
}
