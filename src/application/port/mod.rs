// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! The decoding core only talks to the outside world through these traits.
//!
//! # Available Ports
//!
//! - [`backend`]: demux/decode sessions ("packet in, frame out")
//! - [`render`]: audio and video frame consumers
//!
//! # Design Notes
//!
//! - Traits use domain types only (no `FFmpeg`, OpenGL or OpenSL types)
//! - Methods are synchronous; each decoder runs on its own thread

pub mod backend;
pub mod render;

pub use backend::{MediaBackend, MediaSession, StreamPacket};
pub use render::{AudioRender, VideoRender};
