// SPDX-License-Identifier: MPL-2.0
//! Threaded decode core.
//!
//! A [`DecoderEngine`] runs one elementary stream (audio or video) on its own
//! thread: it reads packets, decodes them, paces the resulting frames against
//! the wall clock and hands them to a [`FrameHandler`]. Audio and video
//! differ only in their handler.

mod engine;
pub mod handler;
pub mod message;
mod pump;
mod seek;
pub mod state;
pub mod sync;
pub mod time_units;

pub use engine::DecoderEngine;
pub use handler::{AudioFrameHandler, FrameHandler, VideoFrameHandler};
pub use message::{DecoderMessage, MessageSink};
pub use state::DecoderState;

/// Decoder instance driving a video renderer.
pub type VideoDecoder<B> = DecoderEngine<B, VideoFrameHandler>;

/// Decoder instance driving an audio renderer.
pub type AudioDecoder<B> = DecoderEngine<B, AudioFrameHandler>;
