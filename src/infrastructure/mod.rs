// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the [`MediaBackend`] port defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`ffmpeg`]: demux/decode through the system `FFmpeg` libraries
//!   (cargo feature `ffmpeg`)
//! - [`synthetic`]: generated test-pattern media, no external libraries
//!
//! [`MediaBackend`]: crate::application::port::MediaBackend

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod synthetic;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegBackend;
pub use synthetic::{SyntheticBackend, SyntheticMedia};
