// SPDX-License-Identifier: MPL-2.0
//! `ffmedia_player` is the native playback core of an Android FFmpeg player.
//!
//! A player owns one decoder per elementary stream (audio, video). Each
//! decoder runs its own thread that demuxes, decodes, paces frames against
//! the wall clock and hands them to a renderer. Hosts drive players through
//! the integer-handle API in [`handle`], or through the JNI exports when the
//! `jni` feature is enabled.
//!
//! # Features
//!
//! - `ffmpeg`: real demuxing/decoding through the system `FFmpeg` libraries
//! - `jni`: `com.codefun.media.FFMediaPlayer` native methods (implies `ffmpeg`)

#![doc(html_root_url = "https://docs.rs/ffmedia_player/0.1.0")]

pub mod application;
pub mod config;
pub mod decoder;
pub mod error;
pub mod handle;
pub mod infrastructure;
#[cfg(feature = "jni")]
pub mod jni_bridge;
pub mod logging;
pub mod media;
pub mod player;
pub mod render;

pub use decoder::{DecoderMessage, DecoderState, MessageSink};
pub use error::{DecoderError, Error, Result};
pub use player::{MediaParam, MediaPlayer, PlayerControl, RenderMode, Renderers};
