// SPDX-License-Identifier: MPL-2.0
//! Decoder events reported toward the bridge layer.
//!
//! Messages are for observability only; nothing in the core waits on them.

use std::fmt;
use std::sync::Arc;

/// Events emitted by a decoder instance.
///
/// The numeric codes match the `MSG_*` constants of the Java player class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecoderMessage {
    /// Opening the stream or codec failed; the instance is finished.
    InitError,
    /// The stream is open and decoding can start.
    Ready,
    /// The decode loop exited and its resources were released.
    Done,
    /// A new picture is available; the render thread should draw.
    RenderRequest,
    /// Current audio playback time in seconds.
    DecodingTime(f32),
}

impl DecoderMessage {
    pub fn code(self) -> i32 {
        match self {
            DecoderMessage::InitError => 0,
            DecoderMessage::Ready => 1,
            DecoderMessage::Done => 2,
            DecoderMessage::RenderRequest => 3,
            DecoderMessage::DecodingTime(_) => 4,
        }
    }

    /// Float payload carried alongside the code.
    pub fn value(self) -> f32 {
        match self {
            DecoderMessage::DecodingTime(secs) => secs,
            _ => 0.0,
        }
    }
}

type Callback = dyn Fn(DecoderMessage) + Send + Sync;

/// Typed message callback shared by the decoders of one player.
#[derive(Clone, Default)]
pub struct MessageSink {
    callback: Option<Arc<Callback>>,
}

impl MessageSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(DecoderMessage) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    /// A sink that discards every message.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn send(&self, message: DecoderMessage) {
        if let Some(callback) = &self.callback {
            callback(message);
        }
    }
}

impl fmt::Debug for MessageSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSink")
            .field("connected", &self.callback.is_some())
            .finish()
    }
}
